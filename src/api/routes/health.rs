//! Service identity and health routes.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::api::server::AppState;

/// Handler for `GET /api/`.
pub async fn root() -> Json<Value> {
    debug!("Health check requested");
    Json(json!({
        "status": "healthy",
        "service": "Prompt Arena",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Handler for `GET /health`.
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "templates_available": state.templates.len(),
        "categories": state.templates.categories(),
    }))
}
