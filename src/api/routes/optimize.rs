//! Prompt analysis route.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::server::AppState;
use crate::metrics::Endpoint;
use crate::prompts::optimizer::{self, OptimizationResult};

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub prompt: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_target_output_tokens")]
    pub target_output_tokens: u32,
}

fn default_model() -> String {
    optimizer::DEFAULT_MODEL.to_string()
}

fn default_target_output_tokens() -> u32 {
    optimizer::DEFAULT_TARGET_OUTPUT_TOKENS
}

/// Handler for `POST /api/optimize`. Pure analysis, no upstream calls.
pub async fn optimize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OptimizeRequest>,
) -> Json<OptimizationResult> {
    state.metrics.record_request(Endpoint::Optimize);
    Json(optimizer::analyze(
        &req.prompt,
        &req.model,
        req.target_output_tokens,
    ))
}
