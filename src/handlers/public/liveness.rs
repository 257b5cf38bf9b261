// handlers/public/liveness.rs - GET / and GET /api

use axum::response::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

/// GET / - fixed liveness payload with the current time
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Project Management API is live!",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }))
}

/// GET /api
pub async fn api_root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "API endpoint working!"
    }))
}
