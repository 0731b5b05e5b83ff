use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Access/refresh credential pair issued to a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Owning client's opaque `client_id`, not its numeric id.
    pub client_id: String,
    /// Identity the token was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires: DateTime<Utc>,
    pub refresh_expires: DateTime<Utc>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub deleted: Option<DateTime<Utc>>,
}

/// Lifetimes applied when a token is issued.
#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::hours(1),
            refresh: Duration::days(30),
        }
    }
}

/// The transferable subset of a token, as posted to an addon's callback.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TokenPayload<'a> {
    pub refresh_token: &'a str,
    pub access_token: &'a str,
    pub refresh_expires: DateTime<Utc>,
    pub access_expires: DateTime<Utc>,
}

impl Token {
    /// Issue a fresh token pair for `client_id`.
    pub fn issue(client_id: &str, user_email: Option<String>, lifetimes: TokenLifetimes) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            client_id: client_id.to_string(),
            user_email,
            access_token: generate_opaque_token(),
            refresh_token: generate_opaque_token(),
            access_expires: now + lifetimes.access,
            refresh_expires: now + lifetimes.refresh,
            created: now,
            deleted: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    pub fn payload(&self) -> TokenPayload<'_> {
        TokenPayload {
            refresh_token: &self.refresh_token,
            access_token: &self.access_token,
            refresh_expires: self.refresh_expires,
            access_expires: self.access_expires,
        }
    }
}

fn generate_opaque_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_sets_expiry_from_lifetimes() {
        let token = Token::issue(
            "client-1",
            Some("a@b.com".to_string()),
            TokenLifetimes::default(),
        );

        assert_eq!(token.client_id, "client-1");
        assert_eq!(token.access_token.len(), 64);
        assert_ne!(token.access_token, token.refresh_token);
        assert_eq!(token.access_expires - token.created, Duration::hours(1));
        assert_eq!(token.refresh_expires - token.created, Duration::days(30));
        assert!(!token.is_deleted());
    }

    #[test]
    fn test_payload_has_exactly_public_fields() {
        let mut token = Token::issue("client-1", None, TokenLifetimes::default());
        token.deleted = Some(Utc::now());

        let json = serde_json::to_value(token.payload()).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();

        assert_eq!(
            keys,
            vec!["access_expires", "access_token", "refresh_expires", "refresh_token"]
        );
        assert_eq!(json["access_token"], token.access_token.as_str());
    }
}
