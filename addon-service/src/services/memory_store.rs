use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{EntityStore, Filter, Update};
use super::StoreError;
use crate::models::{Client, Token};

/// Process-local store used by tests and by `serve` when no database is
/// configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    clients: Vec<Client>,
    tokens: Vec<Token>,
    last_client_id: i64,
    last_token_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn apply(deleted: &mut Option<chrono::DateTime<chrono::Utc>>, update: Update) -> bool {
    match update {
        Update::MarkDeleted(at) => {
            if deleted.is_some() {
                return false;
            }
            *deleted = Some(at);
            true
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn insert_client(&self, mut client: Client) -> Result<Client, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.clients.iter().any(|c| c.client_id == client.client_id) {
            return Err(StoreError::Duplicate { field: "client_id" });
        }
        if tables
            .clients
            .iter()
            .any(|c| c.client_secret == client.client_secret)
        {
            return Err(StoreError::Duplicate {
                field: "client_secret",
            });
        }

        tables.last_client_id += 1;
        client.id = Some(tables.last_client_id);
        tables.clients.push(client.clone());
        Ok(client)
    }

    async fn insert_token(&self, mut token: Token) -> Result<Token, StoreError> {
        let mut tables = self.tables.write().await;

        let owner = Filter::client_id(token.client_id.as_str()).active();
        if !tables
            .clients
            .iter()
            .any(|c| owner.matches(&c.client_id, c.deleted))
        {
            return Err(StoreError::UnknownClient(token.client_id));
        }

        tables.last_token_id += 1;
        token.id = Some(tables.last_token_id);
        tables.tokens.push(token.clone());
        Ok(token)
    }

    async fn find_client(&self, filter: &Filter) -> Result<Option<Client>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .clients
            .iter()
            .find(|c| filter.matches(&c.client_id, c.deleted))
            .cloned())
    }

    async fn find_tokens(&self, filter: &Filter) -> Result<Vec<Token>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .iter()
            .filter(|t| filter.matches(&t.client_id, t.deleted))
            .cloned()
            .collect())
    }

    async fn update_clients(&self, filter: &Filter, update: Update) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let modified = tables
            .clients
            .iter_mut()
            .filter(|c| filter.matches(&c.client_id, c.deleted))
            .map(|c| apply(&mut c.deleted, update))
            .filter(|changed| *changed)
            .count();
        Ok(modified as u64)
    }

    async fn update_tokens(&self, filter: &Filter, update: Update) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        let modified = tables
            .tokens
            .iter_mut()
            .filter(|t| filter.matches(&t.client_id, t.deleted))
            .map(|t| apply(&mut t.deleted, update))
            .filter(|changed| *changed)
            .count();
        Ok(modified as u64)
    }
}
