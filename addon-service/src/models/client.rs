use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// OAuth client registered for an addon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    /// Store-assigned surrogate key. `None` until the record is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub client_id: String,
    /// Only ever returned by the creation endpoint; empty when redacted.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub deleted: Option<DateTime<Utc>>,
}

/// Client fields as submitted for registration, usually an addon's package
/// manifest. Unknown manifest keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ClientDraft {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[validate(contains(pattern = "@", message = "email must contain '@'"))]
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub callback: Option<String>,
    #[serde(default)]
    pub webhook: Option<String>,
    #[serde(rename = "type", default)]
    pub client_type: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl Client {
    /// Build a new, unsaved client from a draft.
    ///
    /// `client_id` and `client_secret` default to fresh v4 UUIDs and `created`
    /// to the current time when the draft leaves them out. Empty strings count
    /// as missing.
    pub fn new(draft: ClientDraft) -> Self {
        Self {
            id: None,
            client_id: non_empty(draft.client_id).unwrap_or_else(generate_identifier),
            client_secret: non_empty(draft.client_secret).unwrap_or_else(generate_identifier),
            name: draft.name,
            email: draft.email,
            homepage: draft.homepage,
            description: draft.description,
            callback: draft.callback,
            webhook: draft.webhook,
            client_type: draft.client_type,
            created: draft.created.unwrap_or_else(Utc::now),
            deleted: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    /// Copy of this client with the secret stripped, for every response other
    /// than creation.
    pub fn redacted(mut self) -> Self {
        self.client_secret.clear();
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn generate_identifier() -> String {
    Uuid::new_v4().to_string()
}
