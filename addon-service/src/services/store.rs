//! Persistence seam for clients and tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::StoreError;
use crate::models::{Client, Token};

/// Record selector shared by client and token queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub client_id: Option<String>,
    /// Only match records whose `deleted` is unset.
    pub active_only: bool,
}

impl Filter {
    pub fn client_id(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            active_only: false,
        }
    }

    pub fn active(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Whether a record with the given key and deletion stamp is selected.
    pub fn matches(&self, client_id: &str, deleted: Option<DateTime<Utc>>) -> bool {
        let key_matches = self
            .client_id
            .as_deref()
            .map_or(true, |wanted| wanted == client_id);
        key_matches && !(self.active_only && deleted.is_some())
    }
}

/// Bulk update applied to every record a [`Filter`] selects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Update {
    /// Stamp `deleted` on records that are still active. Records already
    /// deleted keep their first stamp.
    MarkDeleted(DateTime<Utc>),
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Persist a new client, assigning its numeric id.
    async fn insert_client(&self, client: Client) -> Result<Client, StoreError>;

    /// Persist a new token. The owning client must exist and be active.
    async fn insert_token(&self, token: Token) -> Result<Token, StoreError>;

    async fn find_client(&self, filter: &Filter) -> Result<Option<Client>, StoreError>;

    async fn find_tokens(&self, filter: &Filter) -> Result<Vec<Token>, StoreError>;

    /// Returns the number of records modified.
    async fn update_clients(&self, filter: &Filter, update: Update) -> Result<u64, StoreError>;

    /// Returns the number of records modified.
    async fn update_tokens(&self, filter: &Filter, update: Update) -> Result<u64, StoreError>;
}
