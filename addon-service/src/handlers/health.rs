use service_core::axum::Json;
use serde_json::{json, Value};

use crate::SERVICE_NAME;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
    }))
}
