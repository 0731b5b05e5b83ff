mod common;

use addon_service::build_router;
use addon_service::services::Filter;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{test_state, SHARED_SECRET};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn with_secret(path: &str) -> String {
    format!("{}?sharedFetchSecret={}", path, SHARED_SECRET)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_needs_no_secret() {
    let app = build_router(test_state());
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_client_routes_require_shared_secret() {
    let app = build_router(test_state());

    let (status, _) = send(&app, "POST", "/client", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/client?sharedFetchSecret=wrong",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_client_returns_generated_credentials() {
    let app = build_router(test_state());

    let (status, client) = send(
        &app,
        "POST",
        &with_secret("/client"),
        Some(json!({"name": "weather", "callback": "https://addon.example/cb"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(uuid::Uuid::parse_str(client["client_id"].as_str().unwrap()).is_ok());
    assert!(uuid::Uuid::parse_str(client["client_secret"].as_str().unwrap()).is_ok());
    assert_eq!(client["deleted"], Value::Null);
}

#[tokio::test]
async fn test_create_client_rejects_bad_email() {
    let app = build_router(test_state());
    let (status, _) = send(
        &app,
        "POST",
        &with_secret("/client"),
        Some(json!({"email": "not-an-address"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_token_for_unknown_client_is_not_found() {
    let app = build_router(test_state());
    let (status, _) = send(
        &app,
        "POST",
        &with_secret("/client/nope/token"),
        Some(json!({"user_email": "a@b.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_cascades_to_tokens() {
    let state = test_state();
    let app = build_router(state.clone());

    let (_, client) = send(
        &app,
        "POST",
        &with_secret("/client"),
        Some(json!({"client_id": "abc"})),
    )
    .await;
    assert_eq!(client["client_id"], "abc");

    for _ in 0..3 {
        let (status, token) = send(
            &app,
            "POST",
            &with_secret("/client/abc/token"),
            Some(json!({"user_email": "a@b.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(token["client_id"], "abc");
    }

    let (status, deleted) = send(&app, "DELETE", &with_secret("/client/abc"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(deleted["deleted"].is_string());
    assert!(deleted.get("client_secret").is_none());

    let tokens = state
        .clients
        .store()
        .find_tokens(&Filter::client_id("abc"))
        .await
        .unwrap();
    assert_eq!(tokens.len(), 3);
    let client_deleted = chrono::DateTime::parse_from_rfc3339(deleted["deleted"].as_str().unwrap())
        .unwrap()
        .with_timezone(&chrono::Utc);
    for token in &tokens {
        let token_deleted = token.deleted.unwrap();
        assert!(token_deleted <= client_deleted);
    }

    // A deleted client can no longer mint tokens
    let (status, _) = send(
        &app,
        "POST",
        &with_secret("/client/abc/token"),
        Some(json!({"user_email": "a@b.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_unknown_client_is_not_found() {
    let app = build_router(test_state());
    let (status, _) = send(&app, "DELETE", &with_secret("/client/nope"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = build_router(test_state());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}
