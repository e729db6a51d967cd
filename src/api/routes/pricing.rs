//! Model pricing route.

use axum::extract::State;
use axum::Json;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::server::AppState;
use crate::metrics::Endpoint;
use crate::pricing::{self, ModelPricing};

/// Handler for `GET /api/pricing`. Returns the full per-model price table.
pub async fn get_pricing(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<&'static str, &'static ModelPricing>> {
    state.metrics.record_request(Endpoint::Pricing);
    let table = pricing::models()
        .into_iter()
        .filter_map(|model| pricing::pricing_info(model).map(|info| (model, info)))
        .collect();
    Json(table)
}
