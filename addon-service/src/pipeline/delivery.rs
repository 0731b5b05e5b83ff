//! Token hand-off to the addon's callback URL.

use async_trait::async_trait;
use reqwest::Url;
use service_core::observability::TracedClientExt;
use tracing::instrument;

use super::stage::{ensure_success, HttpError, StageError};
use crate::models::{Client, Token};

#[async_trait]
pub trait TokenDeliverer: Send + Sync {
    /// Hand a freshly minted token to the addon through its callback URL.
    async fn deliver(&self, client: &Client, token: &Token) -> Result<(), StageError>;
}

/// Posts the transferable token fields to `client.callback` as JSON.
///
/// The client should not follow redirects (see [`post_client`]); any
/// status below 400 counts as delivered.
///
/// [`post_client`]: crate::pipeline::post_client
#[derive(Clone)]
pub struct HttpTokenDeliverer {
    client: reqwest::Client,
}

impl HttpTokenDeliverer {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenDeliverer for HttpTokenDeliverer {
    #[instrument(skip_all, fields(client_id = %client.client_id))]
    async fn deliver(&self, client: &Client, token: &Token) -> Result<(), StageError> {
        let callback = client
            .callback
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(StageError::MissingCallback)?;

        let url = Url::parse(callback)
            .map_err(|e| StageError::Delivery(HttpError::invalid_url(callback, e)))?;

        let response = self
            .client
            .traced_post(url)
            .json(&token.payload())
            .send()
            .await
            .map_err(|e| StageError::Delivery(HttpError::Transport(e)))?;

        ensure_success(response).map_err(StageError::Delivery)?;

        tracing::info!("Token delivered");
        Ok(())
    }
}
