use std::sync::Arc;
use validator::Validate;

use super::store::{EntityStore, Filter};
use super::{soft_delete, ServiceError, StoreError};
use crate::models::{Client, ClientDraft, Token, TokenLifetimes};

/// Client registration, token issuance and revocation on top of an
/// [`EntityStore`].
#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn EntityStore>,
    lifetimes: TokenLifetimes,
}

impl ClientService {
    pub fn new(store: Arc<dyn EntityStore>, lifetimes: TokenLifetimes) -> Self {
        Self { store, lifetimes }
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    pub async fn register(&self, draft: ClientDraft) -> Result<Client, ServiceError> {
        draft.validate()?;

        let client = self.store.insert_client(Client::new(draft)).await?;

        tracing::info!(
            client_id = %client.client_id,
            name = client.name.as_deref().unwrap_or("-"),
            "New client registered"
        );

        Ok(client)
    }

    /// Issue a token for an active client.
    pub async fn issue_token(
        &self,
        client_id: &str,
        user_email: Option<String>,
    ) -> Result<Token, ServiceError> {
        let client = self
            .store
            .find_client(&Filter::client_id(client_id).active())
            .await?
            .ok_or_else(|| ServiceError::ClientNotFound(client_id.to_string()))?;

        let token = self
            .store
            .insert_token(Token::issue(&client.client_id, user_email, self.lifetimes))
            .await
            .map_err(|e| match e {
                // Deleted between lookup and insert
                StoreError::UnknownClient(id) => ServiceError::ClientNotFound(id),
                other => ServiceError::Store(other),
            })?;

        tracing::info!(client_id = %client.client_id, "Token issued");

        Ok(token)
    }

    pub async fn revoke(&self, client_id: &str) -> Result<Client, ServiceError> {
        Ok(soft_delete(self.store.as_ref(), client_id).await?)
    }
}
