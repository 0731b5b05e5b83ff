//! Cascading soft delete for a client and the tokens issued under it.

use chrono::Utc;

use super::store::{EntityStore, Filter, Update};
use super::StoreError;
use crate::models::Client;

/// Soft-delete every token owned by `client_id`, then the client itself, and
/// return the refreshed client record.
///
/// Tokens are stamped strictly before the client, so a deleted client never
/// has active tokens. The two updates are not atomic: if the second one fails
/// the tokens stay deleted while the client remains active.
pub async fn soft_delete(store: &dyn EntityStore, client_id: &str) -> Result<Client, StoreError> {
    let filter = Filter::client_id(client_id);
    // One stamp for both updates keeps token stamps no later than the client's
    let now = Utc::now();

    let tokens = store
        .update_tokens(&filter, Update::MarkDeleted(now))
        .await?;

    let clients = store
        .update_clients(&filter, Update::MarkDeleted(now))
        .await?;

    tracing::info!(
        client_id = %client_id,
        tokens_deleted = tokens,
        clients_deleted = clients,
        "Client soft-deleted"
    );

    store
        .find_client(&filter)
        .await?
        .ok_or_else(|| StoreError::ClientNotFound(client_id.to_string()))
}
