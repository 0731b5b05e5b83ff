//! MongoDB-backed entity store.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};

use super::store::{EntityStore, Filter, Update};
use super::StoreError;
use crate::models::{Client, Token};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            StoreError::Database(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { db })
    }

    pub fn clients(&self) -> Collection<Client> {
        self.db.collection("clients")
    }

    pub fn tokens(&self) -> Collection<Token> {
        self.db.collection("tokens")
    }

    fn counters(&self) -> Collection<Document> {
        self.db.collection("counters")
    }

    pub async fn initialize_indexes(&self) -> Result<(), StoreError> {
        tracing::info!("Creating MongoDB indexes for addon-service");

        let client_id_index = IndexModel::builder()
            .keys(doc! { "client_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("client_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let client_secret_index = IndexModel::builder()
            .keys(doc! { "client_secret": 1 })
            .options(
                IndexOptions::builder()
                    .name("client_secret_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.clients()
            .create_indexes([client_id_index, client_secret_index], None)
            .await?;

        // Soft-delete cascades filter tokens by owner
        let token_owner_index = IndexModel::builder()
            .keys(doc! { "client_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("token_client_id_idx".to_string())
                    .build(),
            )
            .build();

        self.tokens().create_index(token_owner_index, None).await?;

        tracing::info!("MongoDB indexes created");
        Ok(())
    }

    /// Next value of a named sequence, used for numeric surrogate ids.
    async fn next_id(&self, sequence: &str) -> Result<i64, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .counters()
            .find_one_and_update(
                doc! { "_id": sequence },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await?;

        counter
            .and_then(|d| d.get_i64("seq").ok())
            .ok_or_else(|| StoreError::Serialization(format!("counter {} has no seq", sequence)))
    }
}

fn filter_document(filter: &Filter) -> Document {
    let mut document = Document::new();
    if let Some(client_id) = &filter.client_id {
        document.insert("client_id", client_id.as_str());
    }
    if filter.active_only {
        document.insert("deleted", Bson::Null);
    }
    document
}

fn update_parts(filter: &Filter, update: Update) -> Result<(Document, Document), StoreError> {
    match update {
        Update::MarkDeleted(at) => {
            // Already-deleted records keep their first stamp
            let selector = filter_document(&filter.clone().active());
            let modification = doc! { "$set": { "deleted": mongodb::bson::to_bson(&at)? } };
            Ok((selector, modification))
        }
    }
}

fn duplicate_field(err: &mongodb::error::Error) -> Option<&'static str> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY => {
            if write.message.contains("client_secret") {
                Some("client_secret")
            } else {
                Some("client_id")
            }
        }
        _ => None,
    }
}

#[async_trait]
impl EntityStore for MongoStore {
    async fn insert_client(&self, mut client: Client) -> Result<Client, StoreError> {
        client.id = Some(self.next_id("clients").await?);
        self.clients()
            .insert_one(&client, None)
            .await
            .map_err(|e| match duplicate_field(&e) {
                Some(field) => StoreError::Duplicate { field },
                None => StoreError::Database(e),
            })?;
        Ok(client)
    }

    async fn insert_token(&self, mut token: Token) -> Result<Token, StoreError> {
        let owner = Filter::client_id(token.client_id.as_str()).active();
        if self.find_client(&owner).await?.is_none() {
            return Err(StoreError::UnknownClient(token.client_id));
        }

        token.id = Some(self.next_id("tokens").await?);
        self.tokens().insert_one(&token, None).await?;
        Ok(token)
    }

    async fn find_client(&self, filter: &Filter) -> Result<Option<Client>, StoreError> {
        Ok(self
            .clients()
            .find_one(filter_document(filter), None)
            .await?)
    }

    async fn find_tokens(&self, filter: &Filter) -> Result<Vec<Token>, StoreError> {
        let cursor = self.tokens().find(filter_document(filter), None).await?;
        let tokens: Vec<Token> = cursor.try_collect().await?;
        Ok(tokens)
    }

    async fn update_clients(&self, filter: &Filter, update: Update) -> Result<u64, StoreError> {
        let (selector, modification) = update_parts(filter, update)?;
        let result = self
            .clients()
            .update_many(selector, modification, None)
            .await?;
        Ok(result.modified_count)
    }

    async fn update_tokens(&self, filter: &Filter, update: Update) -> Result<u64, StoreError> {
        let (selector, modification) = update_parts(filter, update)?;
        let result = self
            .tokens()
            .update_many(selector, modification, None)
            .await?;
        Ok(result.modified_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_filter_document_for_active_client() {
        let document = filter_document(&Filter::client_id("abc").active());
        assert_eq!(document.get_str("client_id").unwrap(), "abc");
        assert_eq!(document.get("deleted"), Some(&Bson::Null));
    }

    #[test]
    fn test_mark_deleted_only_selects_active_records() {
        let (selector, modification) =
            update_parts(&Filter::client_id("abc"), Update::MarkDeleted(Utc::now())).unwrap();
        assert_eq!(selector.get("deleted"), Some(&Bson::Null));
        assert!(modification.get_document("$set").unwrap().contains_key("deleted"));
    }

    #[tokio::test]
    #[ignore] // Requires running MongoDB
    async fn test_connect_and_index() {
        let store = MongoStore::connect("mongodb://localhost:27017", "addon_service_test")
            .await
            .unwrap();
        store.initialize_indexes().await.unwrap();
    }
}
