//! Health check handler

use axum::response::Json;
use serde_json::{json, Value};

/// Liveness probe; requires no authentication.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "strata-web",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
