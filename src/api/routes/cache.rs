//! Cache observability routes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::info;

use crate::api::server::AppState;
use crate::cache::CacheStats;

/// Handler for `GET /api/cache/stats`.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.cache_lock().get_stats())
}

/// Handler for `POST /api/cache/clear`. Drops all entries; hit/miss
/// counters survive so savings reporting stays continuous.
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> StatusCode {
    state.cache_lock().clear();
    info!("Response cache cleared by request");
    StatusCode::NO_CONTENT
}
