//! Usage metrics route.

use axum::extract::State;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;

use crate::api::server::AppState;

/// Handler for `GET /metrics`.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.metrics.summary())
}
