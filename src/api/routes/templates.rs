//! Template catalog and rendering routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::server::AppState;
use crate::error::ArenaError;
use crate::metrics::Endpoint;
use crate::prompts;

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub template_id: String,
    pub values: HashMap<String, String>,
}

/// Handler for `GET /api/templates`. Full catalog without template bodies.
pub async fn list_templates(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.metrics.record_request(Endpoint::Templates);
    let listing: Vec<Value> = state
        .templates
        .all()
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "name": t.name,
                "description": t.description,
                "category": t.category,
                "variables": t.variables,
                "example_values": t.example_values,
            })
        })
        .collect();
    Json(Value::Array(listing))
}

/// Handler for `GET /api/templates/category/{category}`. Compact listing;
/// an unknown category is an empty list, not an error.
pub async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Json<Value> {
    state.metrics.record_request(Endpoint::Templates);
    let listing: Vec<Value> = state
        .templates
        .by_category(&category)
        .into_iter()
        .map(|t| {
            json!({
                "id": t.id,
                "name": t.name,
                "description": t.description,
                "variables": t.variables,
            })
        })
        .collect();
    Json(Value::Array(listing))
}

/// Handler for `GET /api/templates/{id}`. Full template including body
/// and system prompt.
pub async fn get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    state.metrics.record_request(Endpoint::Templates);
    match state.templates.get(&id) {
        Some(t) => (
            StatusCode::OK,
            Json(json!({
                "id": t.id,
                "name": t.name,
                "description": t.description,
                "template": t.template,
                "variables": t.variables,
                "system_prompt": t.system_prompt,
                "category": t.category,
                "example_values": t.example_values,
            })),
        ),
        None => not_found(&id),
    }
}

/// Handler for `GET /api/categories`.
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<&'static str>> {
    state.metrics.record_request(Endpoint::Templates);
    Json(state.templates.categories())
}

/// Handler for `POST /api/render`.
pub async fn render_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenderRequest>,
) -> (StatusCode, Json<Value>) {
    state.metrics.record_request(Endpoint::Render);
    let Some(template) = state.templates.get(&req.template_id) else {
        state.metrics.record_error();
        return not_found(&req.template_id);
    };

    let rendered = prompts::render(template, &req.values);
    (
        StatusCode::OK,
        Json(json!({
            "template_id": template.id,
            "name": template.name,
            "rendered_prompt": rendered,
            "system_prompt": template.system_prompt,
            "variables": template.variables,
        })),
    )
}

fn not_found(id: &str) -> (StatusCode, Json<Value>) {
    let message = ArenaError::TemplateNotFound(id.to_string()).to_string();
    (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
}
