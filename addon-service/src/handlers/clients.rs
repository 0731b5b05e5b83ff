use serde::Deserialize;
use service_core::axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::models::ClientDraft;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateTokenRequest {
    #[serde(default)]
    pub user_email: Option<String>,
}

/// Register a client. The only response that carries `client_secret`.
pub async fn create_client(
    State(state): State<AppState>,
    Json(draft): Json<ClientDraft>,
) -> Result<impl IntoResponse, AppError> {
    let client = state.clients.register(draft).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn create_token(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Json(req): Json<CreateTokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state.clients.issue_token(&client_id, req.user_email).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

/// Soft-delete a client and every token issued under it.
pub async fn delete_client(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let client = state.clients.revoke(&client_id).await?;
    Ok(Json(client.redacted()))
}
