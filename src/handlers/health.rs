//! Health and metrics endpoints.

use axum::Json;
use serde_json::{json, Value};

use crate::services::get_metrics;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "submission-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn metrics() -> String {
    get_metrics()
}
