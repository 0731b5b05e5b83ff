//! HTTP client for the authorization service.

use async_trait::async_trait;
use reqwest::Url;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use service_core::observability::TracedClientExt;
use tracing::instrument;

use super::stage::{ensure_success, HttpError, StageError};
use crate::models::{Client, Token};

/// Query parameter carrying the shared secret on every call.
pub const SHARED_SECRET_PARAM: &str = "sharedFetchSecret";

#[async_trait]
pub trait ClientRegistrar: Send + Sync {
    /// Register an OAuth client from an addon's package metadata.
    async fn create_client(&self, metadata: &Value) -> Result<Client, StageError>;
}

#[async_trait]
pub trait TokenMinter: Send + Sync {
    /// Mint a token for `client`, issued to `user_email`.
    async fn create_token(&self, client: &Client, user_email: &str) -> Result<Token, StageError>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    user_email: &'a str,
}

#[derive(Clone)]
pub struct AuthServiceClient {
    client: reqwest::Client,
    base_url: Url,
    shared_secret: Secret<String>,
}

impl AuthServiceClient {
    pub fn new(client: reqwest::Client, base_url: Url, shared_secret: Secret<String>) -> Self {
        Self {
            client,
            base_url,
            shared_secret,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, HttpError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HttpError::invalid_url(self.base_url.as_str(), "cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized + Sync,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .traced_post(url)
            .query(&[(SHARED_SECRET_PARAM, self.shared_secret.expose_secret().as_str())])
            .json(body)
            .send()
            .await
            .map_err(HttpError::Transport)?;

        ensure_success(response)?
            .json::<T>()
            .await
            .map_err(HttpError::Decode)
    }
}

#[async_trait]
impl ClientRegistrar for AuthServiceClient {
    #[instrument(skip(self, metadata))]
    async fn create_client(&self, metadata: &Value) -> Result<Client, StageError> {
        let url = self.endpoint(&["client"]).map_err(StageError::Registration)?;

        let client: Client = self
            .post_json(url, metadata)
            .await
            .map_err(StageError::Registration)?;

        tracing::info!(client_id = %client.client_id, "Client registered");
        Ok(client)
    }
}

#[async_trait]
impl TokenMinter for AuthServiceClient {
    #[instrument(skip(self, client), fields(client_id = %client.client_id))]
    async fn create_token(&self, client: &Client, user_email: &str) -> Result<Token, StageError> {
        let url = self
            .endpoint(&["client", &client.client_id, "token"])
            .map_err(StageError::Mint)?;

        let token: Token = self
            .post_json(url, &TokenRequest { user_email })
            .await
            .map_err(StageError::Mint)?;

        tracing::info!("Token minted");
        Ok(token)
    }
}
