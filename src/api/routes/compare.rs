//! Prompt comparison across providers.
//!
//! Each requested provider runs concurrently. Before any client is built
//! the response cache is consulted under the request's full fingerprint
//! (prompt, provider, model, temperature, system prompt); a hit replays
//! the stored response without spending money upstream. One provider
//! failing does not fail the comparison: the error is reported inline in
//! that provider's result slot.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::api::server::AppState;
use crate::cache::{RequestKey, DEFAULT_TEMPERATURE};
use crate::error::ArenaError;
use crate::metrics::Endpoint;
use crate::pricing;
use crate::providers::{self, DEFAULT_MAX_TOKENS};

#[derive(Debug, Clone, Deserialize)]
pub struct CompareRequest {
    pub prompt: String,
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
    #[serde(default)]
    pub models: Option<HashMap<String, String>>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_providers() -> Vec<String> {
    vec!["openai".to_string(), "anthropic".to_string()]
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// One provider's slot in the comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderResult {
    pub provider: String,
    pub model: String,
    pub response: String,
    pub latency: f64,
    pub cost: f64,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cached: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub prompt: String,
    pub results: Vec<ProviderResult>,
    /// Dollars spent by this request. Cache hits contribute nothing.
    pub total_cost: f64,
    pub fastest: String,
    pub cheapest: String,
}

/// Handler for `POST /api/compare`.
pub async fn compare(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, (StatusCode, Json<Value>)> {
    let start = Instant::now();
    state.metrics.record_request(Endpoint::Compare);

    if req.prompt.is_empty() {
        state.metrics.record_error();
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "prompt must not be empty" })),
        ));
    }
    let max_len = state.settings.max_prompt_length;
    if req.prompt.chars().count() > max_len {
        state.metrics.record_error();
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": format!("prompt exceeds maximum length of {max_len} characters")
            })),
        ));
    }

    info!(
        providers = req.providers.len(),
        prompt = %preview(&req.prompt),
        "Compare request"
    );

    let req = Arc::new(req);
    let tasks = req.providers.iter().map(|name| {
        let state = Arc::clone(&state);
        let req = Arc::clone(&req);
        let name = name.clone();
        async move { run_provider(state, req, name).await }
    });
    let results: Vec<ProviderResult> = join_all(tasks).await;

    let total_cost: f64 = results
        .iter()
        .filter(|r| r.error.is_none() && !r.cached)
        .map(|r| r.cost)
        .sum();

    // First minimum wins on ties, so result order stays authoritative.
    let mut fastest = "none".to_string();
    let mut cheapest = "none".to_string();
    let mut best_latency = f64::INFINITY;
    let mut best_cost = f64::INFINITY;
    for result in results.iter().filter(|r| r.error.is_none()) {
        if result.latency < best_latency {
            best_latency = result.latency;
            fastest = result.provider.clone();
        }
        if result.cost < best_cost {
            best_cost = result.cost;
            cheapest = result.provider.clone();
        }
    }

    let total_time = start.elapsed();
    state.metrics.record_response_time(total_time);
    info!(
        results = results.len(),
        total_cost = format!("{total_cost:.4}"),
        elapsed_secs = format!("{:.2}", total_time.as_secs_f64()),
        "Compare complete"
    );

    Ok(Json(CompareResponse {
        prompt: req.prompt.clone(),
        results,
        total_cost,
        fastest,
        cheapest,
    }))
}

/// Run one provider: cache lookup, then generate and store on a miss.
async fn run_provider(
    state: Arc<AppState>,
    req: Arc<CompareRequest>,
    name: String,
) -> ProviderResult {
    let provider_start = Instant::now();

    let requested = req.models.as_ref().and_then(|m| m.get(&name)).cloned();
    let resolved = requested
        .clone()
        .or_else(|| providers::default_model(&name).map(str::to_string));

    // A resolvable model means the cache key is known before any client
    // exists; a hit replays the stored entry and skips construction
    // entirely.
    if let Some(model) = resolved.as_deref() {
        let key = request_key(&req, &name, model);
        if let Some(entry) = state.cache_lock().get(&key) {
            debug!(provider = %name, model = %model, "Cache hit, skipping generation");
            return ProviderResult {
                provider: name,
                model: entry.model,
                response: entry.response,
                latency: entry.latency,
                cost: entry.cost,
                input_tokens: entry.input_tokens,
                output_tokens: entry.output_tokens,
                cached: true,
                error: None,
            };
        }
    }

    let provider = match state
        .providers
        .create(&name, requested.clone(), req.temperature, req.max_tokens)
    {
        Ok(p) => p,
        Err(e) => return error_result(&state, name, requested, provider_start, e),
    };

    info!(provider = %name, model = %provider.model_name(), "Generating");
    let generated = provider
        .generate(&req.prompt, req.system_prompt.as_deref())
        .await;
    let latency = provider_start.elapsed().as_secs_f64();

    match generated {
        Ok(response) => {
            let model = provider.model_name().to_string();
            let (input_tokens, output_tokens) = match response.usage {
                Some(usage) => (usage.input_tokens, usage.output_tokens),
                None => (
                    pricing::estimate_tokens(&req.prompt),
                    pricing::estimate_tokens(&response.text),
                ),
            };
            let cost = pricing::calculate_cost(&model, input_tokens, output_tokens);
            debug!(
                provider = %name,
                latency_secs = format!("{latency:.2}"),
                cost = format!("{cost:.4}"),
                "Generation complete"
            );

            let key = request_key(&req, &name, &model);
            state
                .cache_lock()
                .put(&key, &response.text, input_tokens, output_tokens, cost, latency);

            ProviderResult {
                provider: name,
                model,
                response: response.text,
                latency,
                cost,
                input_tokens,
                output_tokens,
                cached: false,
                error: None,
            }
        }
        Err(e) => error_result(&state, name, requested, provider_start, e),
    }
}

fn request_key(req: &CompareRequest, provider: &str, model: &str) -> RequestKey {
    let mut key = RequestKey::new(req.prompt.clone(), provider, model)
        .with_temperature(req.temperature);
    if let Some(ref system) = req.system_prompt {
        key = key.with_system_prompt(system.clone());
    }
    key
}

fn error_result(
    state: &AppState,
    provider: String,
    requested_model: Option<String>,
    started: Instant,
    err: ArenaError,
) -> ProviderResult {
    error!(provider = %provider, error = %err, "Provider call failed");
    state.metrics.record_llm_error();
    ProviderResult {
        provider,
        model: requested_model.unwrap_or_else(|| "unknown".to_string()),
        response: String::new(),
        latency: started.elapsed().as_secs_f64(),
        cost: 0.0,
        input_tokens: 0,
        output_tokens: 0,
        cached: false,
        error: Some(err.to_string()),
    }
}

fn preview(prompt: &str) -> String {
    prompt.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::Result;
    use crate::providers::{
        LLMProvider, LLMResponse, MockProviderFactory, ProviderFactory, Usage,
    };
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;

    struct CannedProvider {
        provider: &'static str,
        model: String,
        text: String,
        usage: Option<Usage>,
    }

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn generate(&self, _prompt: &str, _system_prompt: Option<&str>) -> Result<LLMResponse> {
            let mut response = LLMResponse::text(&self.text);
            if let Some(usage) = self.usage {
                response = response.with_usage(usage);
            }
            Ok(response)
        }

        fn model_name(&self) -> &str {
            &self.model
        }

        fn name(&self) -> &str {
            self.provider
        }
    }

    fn canned(
        provider: &'static str,
        model: &str,
        text: &str,
        usage: Option<Usage>,
    ) -> Box<dyn LLMProvider> {
        Box::new(CannedProvider {
            provider,
            model: model.to_string(),
            text: text.to_string(),
            usage,
        })
    }

    fn state_with_factory(factory: impl ProviderFactory + 'static) -> Arc<AppState> {
        let mut state = AppState::new(Arc::new(Settings::default()));
        state.providers = Arc::new(factory);
        Arc::new(state)
    }

    fn request(prompt: &str, providers: &[&str]) -> CompareRequest {
        CompareRequest {
            prompt: prompt.to_string(),
            providers: providers.iter().map(|p| p.to_string()).collect(),
            models: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: None,
        }
    }

    fn approx(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[tokio::test]
    async fn test_compare_rejects_empty_prompt() {
        let state = Arc::new(AppState::new(Arc::new(Settings::default())));
        let err = compare(State(state.clone()), Json(request("", &["openai"])))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.metrics.total_errors.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_compare_rejects_oversized_prompt() {
        let settings = Settings {
            max_prompt_length: 10,
            ..Settings::default()
        };
        let state = Arc::new(AppState::new(Arc::new(settings)));
        let err = compare(
            State(state),
            Json(request("this is eleven", &["openai"])),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        let (_, Json(body)) = err;
        assert!(body["error"].as_str().unwrap().contains("maximum length"));
    }

    #[tokio::test]
    async fn test_compare_two_providers_in_request_order() {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .withf(|name, _, _, _| name == "anthropic")
            .returning(|_, _, _, _| {
                Ok(canned(
                    "anthropic",
                    "claude-3-5-sonnet-20241022",
                    "Claude says hi",
                    Some(Usage::new(1000, 500)),
                ))
            });
        factory
            .expect_create()
            .withf(|name, _, _, _| name == "openai")
            .returning(|_, _, _, _| {
                Ok(canned("openai", "gpt-4", "GPT says hi", Some(Usage::new(1000, 500))))
            });

        let state = state_with_factory(factory);
        let Json(body) = compare(
            State(state),
            Json(request("What is Rust?", &["anthropic", "openai"])),
        )
        .await
        .unwrap();

        assert_eq!(body.results.len(), 2);
        assert_eq!(body.results[0].provider, "anthropic");
        assert_eq!(body.results[1].provider, "openai");
        assert_eq!(body.results[0].model, "claude-3-5-sonnet-20241022");
        assert_eq!(body.results[1].response, "GPT says hi");
        assert!(!body.results[0].cached);

        // claude-3-5-sonnet: 1.0 * 0.003 + 0.5 * 0.015; gpt-4: 1.0 * 0.03 + 0.5 * 0.06
        assert!(approx(body.results[0].cost, 0.0105));
        assert!(approx(body.results[1].cost, 0.06));
        assert!(approx(body.total_cost, 0.0705));
        assert_eq!(body.cheapest, "anthropic");
        assert!(body.fastest == "anthropic" || body.fastest == "openai");
    }

    #[tokio::test]
    async fn test_compare_estimates_tokens_when_usage_missing() {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .returning(|_, _, _, _| Ok(canned("openai", "gpt-4", "12345678", None)));

        let state = state_with_factory(factory);
        // 13 chars -> 3 input tokens; 8-char response -> 2 output tokens.
        let Json(body) = compare(State(state), Json(request("what is rust?", &["openai"])))
            .await
            .unwrap();

        let result = &body.results[0];
        assert_eq!(result.input_tokens, 3);
        assert_eq!(result.output_tokens, 2);
        assert!(approx(result.cost, 3.0 / 1000.0 * 0.03 + 2.0 / 1000.0 * 0.06));
    }

    #[tokio::test]
    async fn test_compare_passes_model_override_to_factory() {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .withf(|name, model, _, _| {
                name == "openai" && model.as_deref() == Some("gpt-3.5-turbo")
            })
            .times(1)
            .returning(|_, model, _, _| {
                let model = model.unwrap_or_default();
                Ok(canned("openai", &model, "cheap reply", Some(Usage::new(100, 50))))
            });

        let state = state_with_factory(factory);
        let mut req = request("What is Rust?", &["openai"]);
        req.models = Some(
            [("openai".to_string(), "gpt-3.5-turbo".to_string())]
                .into_iter()
                .collect(),
        );

        let Json(body) = compare(State(state), Json(req)).await.unwrap();
        assert_eq!(body.results[0].model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_compare_one_failure_does_not_poison_the_rest() {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .withf(|name, _, _, _| name == "openai")
            .returning(|_, _, _, _| {
                Err(ArenaError::Provider("OpenAI API error (500): boom".to_string()))
            });
        factory
            .expect_create()
            .withf(|name, _, _, _| name == "anthropic")
            .returning(|_, _, _, _| {
                Ok(canned(
                    "anthropic",
                    "claude-3-5-sonnet-20241022",
                    "still here",
                    Some(Usage::new(1000, 500)),
                ))
            });

        let state = state_with_factory(factory);
        let Json(body) = compare(
            State(state.clone()),
            Json(request("What is Rust?", &["openai", "anthropic"])),
        )
        .await
        .unwrap();

        let failed = &body.results[0];
        assert_eq!(failed.provider, "openai");
        assert_eq!(failed.model, "unknown");
        assert_eq!(failed.response, "");
        assert!(approx(failed.cost, 0.0));
        assert!(failed.error.as_deref().unwrap().contains("boom"));

        assert!(body.results[1].error.is_none());
        assert_eq!(body.fastest, "anthropic");
        assert_eq!(body.cheapest, "anthropic");
        assert!(approx(body.total_cost, 0.0105));
        assert_eq!(state.metrics.llm_errors.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_compare_error_keeps_requested_model_name() {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .returning(|_, _, _, _| Err(ArenaError::Provider("down".to_string())));

        let state = state_with_factory(factory);
        let mut req = request("What is Rust?", &["openai"]);
        req.models = Some(
            [("openai".to_string(), "gpt-9".to_string())]
                .into_iter()
                .collect(),
        );

        let Json(body) = compare(State(state), Json(req)).await.unwrap();
        assert_eq!(body.results[0].model, "gpt-9");
    }

    #[tokio::test]
    async fn test_compare_all_failures_report_none() {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .returning(|name, _, _, _| Err(ArenaError::Provider(format!("{name} down"))));

        let state = state_with_factory(factory);
        let Json(body) = compare(
            State(state.clone()),
            Json(request("What is Rust?", &["openai", "anthropic"])),
        )
        .await
        .unwrap();

        assert_eq!(body.fastest, "none");
        assert_eq!(body.cheapest, "none");
        assert!(approx(body.total_cost, 0.0));
        assert_eq!(state.metrics.llm_errors.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_compare_replays_cached_response() {
        let mut factory = MockProviderFactory::new();
        // Exactly one construction: the second request must be served from
        // the cache without touching the factory.
        factory
            .expect_create()
            .times(1)
            .returning(|_, _, _, _| {
                Ok(canned("openai", "gpt-4", "generated once", Some(Usage::new(1000, 500))))
            });

        let state = state_with_factory(factory);
        let req = request("What is Rust?", &["openai"]);

        let Json(first) = compare(State(state.clone()), Json(req.clone()))
            .await
            .unwrap();
        assert!(!first.results[0].cached);
        assert!(approx(first.total_cost, 0.06));

        let Json(second) = compare(State(state.clone()), Json(req)).await.unwrap();
        let replayed = &second.results[0];
        assert!(replayed.cached);
        assert_eq!(replayed.response, "generated once");
        assert_eq!(replayed.model, "gpt-4");
        assert!(approx(replayed.cost, 0.06));
        assert!(approx(second.total_cost, 0.0));

        let stats = state.cache_lock().get_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_compare_different_temperature_misses_cache() {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .times(2)
            .returning(|_, _, _, _| {
                Ok(canned("openai", "gpt-4", "fresh", Some(Usage::new(10, 5))))
            });

        let state = state_with_factory(factory);
        let req = request("What is Rust?", &["openai"]);

        compare(State(state.clone()), Json(req.clone())).await.unwrap();
        let mut hotter = req;
        hotter.temperature = 0.9;
        let Json(body) = compare(State(state), Json(hotter)).await.unwrap();
        assert!(!body.results[0].cached);
    }

    #[tokio::test]
    async fn test_compare_cached_result_keeps_original_latency() {
        let factory = MockProviderFactory::new();
        let state = state_with_factory(factory);

        // Prime the cache directly with a known latency.
        let key = RequestKey::new("What is Rust?", "openai", "gpt-4")
            .with_temperature(DEFAULT_TEMPERATURE);
        state.cache_lock().put(&key, "primed", 10, 5, 0.002, 9.9);

        let Json(body) = compare(State(state), Json(request("What is Rust?", &["openai"])))
            .await
            .unwrap();
        let result = &body.results[0];
        assert!(result.cached);
        assert_eq!(result.latency, 9.9);
        assert_eq!(result.response, "primed");
    }

    #[tokio::test]
    async fn test_compare_unknown_provider_with_real_factory() {
        let state = Arc::new(AppState::new(Arc::new(Settings::default())));
        let Json(body) = compare(State(state), Json(request("What is Rust?", &["cohere"])))
            .await
            .unwrap();

        let result = &body.results[0];
        assert_eq!(result.model, "unknown");
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .contains("Unsupported provider: cohere"));
    }

    #[tokio::test]
    async fn test_compare_missing_api_key_with_real_factory() {
        // Default settings carry no API keys.
        let state = Arc::new(AppState::new(Arc::new(Settings::default())));
        let Json(body) = compare(State(state), Json(request("What is Rust?", &["openai"])))
            .await
            .unwrap();
        assert!(body.results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("OpenAI API key required"));
    }

    #[test]
    fn test_compare_request_defaults_deserialize() {
        let req: CompareRequest = serde_json::from_str(r#"{"prompt": "hi"}"#).unwrap();
        assert_eq!(req.providers, vec!["openai", "anthropic"]);
        assert_eq!(req.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(req.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(req.models.is_none());
        assert!(req.system_prompt.is_none());
    }
}
