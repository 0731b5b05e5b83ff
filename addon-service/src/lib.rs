pub mod commands;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod services;

use secrecy::Secret;
use service_core::axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::ClientService;

pub const SERVICE_NAME: &str = "addon-service";

#[derive(Clone)]
pub struct AppState {
    pub clients: ClientService,
    pub shared_secret: Arc<Secret<String>>,
}

impl AppState {
    pub fn new(clients: ClientService, shared_secret: Secret<String>) -> Self {
        Self {
            clients,
            shared_secret: Arc::new(shared_secret),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let client_routes = Router::new()
        .route("/client", post(handlers::clients::create_client))
        .route(
            "/client/:client_id",
            service_core::axum::routing::delete(handlers::clients::delete_client),
        )
        .route(
            "/client/:client_id/token",
            post(handlers::clients::create_token),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::shared_secret_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(client_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(service_core::middleware::tracing::REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
}
