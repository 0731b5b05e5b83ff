use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;
use subtle::ConstantTimeEq;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SecretQuery {
    #[serde(rename = "sharedFetchSecret")]
    shared_fetch_secret: Option<String>,
}

/// Reject requests whose `sharedFetchSecret` query parameter does not match
/// the configured secret.
pub async fn shared_secret_middleware(
    State(state): State<AppState>,
    Query(query): Query<SecretQuery>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = query.shared_fetch_secret.ok_or_else(|| {
        tracing::warn!(path = %req.uri().path(), "Missing shared secret");
        AppError::Unauthorized(anyhow::anyhow!("Missing shared secret"))
    })?;

    let expected = state.shared_secret.expose_secret().as_bytes();
    if !bool::from(provided.as_bytes().ct_eq(expected)) {
        tracing::warn!(path = %req.uri().path(), "Invalid shared secret");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Invalid shared secret"
        )));
    }

    Ok(next.run(req).await)
}
