//! Axum API server for Prompt Arena.

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use crate::api::middleware::RateLimiter;
use crate::cache::ResponseCache;
use crate::config::Settings;
use crate::metrics::UsageMetrics;
use crate::prompts::TemplateLibrary;
use crate::providers::{ProviderFactory, SettingsProviderFactory};

/// Shared state for all API handlers.
#[derive(Clone)]
pub struct AppState {
    /// Resolved application settings.
    pub settings: Arc<Settings>,
    /// Response cache keyed by full request fingerprint.
    ///
    /// The cache mutates on reads (recency tracking, lazy expiry), so it
    /// sits behind a `Mutex` rather than an `RwLock`.
    pub cache: Arc<Mutex<ResponseCache>>,
    /// The built-in prompt template catalog.
    pub templates: Arc<TemplateLibrary>,
    /// Lock-free usage counters (requests, errors, response times).
    pub metrics: Arc<UsageMetrics>,
    /// Fixed-window rate limiter guarding the compare endpoint.
    pub limiter: Arc<RateLimiter>,
    /// Constructs LLM provider clients on demand.
    ///
    /// Swapped for a mock in handler tests so no HTTP client is ever built.
    pub providers: Arc<dyn ProviderFactory>,
}

impl AppState {
    pub fn new(settings: Arc<Settings>) -> Self {
        let cache = Arc::new(Mutex::new(ResponseCache::new(
            settings.cache_max_entries,
            settings.cache_ttl_seconds,
        )));
        let limiter = Arc::new(RateLimiter::new(
            settings.rate_limit_max_requests,
            settings.rate_limit_window_secs,
        ));
        let providers: Arc<dyn ProviderFactory> =
            Arc::new(SettingsProviderFactory::new(Arc::clone(&settings)));
        Self {
            settings,
            cache,
            templates: Arc::new(TemplateLibrary::builtin()),
            metrics: Arc::new(UsageMetrics::new()),
            limiter,
            providers,
        }
    }

    /// Lock the response cache.
    ///
    /// Callers must keep the guard to a single statement so it never lives
    /// across an await point.
    pub fn cache_lock(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().expect("cache lock poisoned")
    }
}

/// CORS layer built from the configured origin list.
///
/// Origins that fail to parse as header values are skipped rather than
/// aborting startup.
fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([HeaderName::from_static("content-type")])
}

/// Build the axum router with all API routes.
pub fn build_router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    // Wrap state in Arc once so it can be shared across both the middleware
    // layers and the route handlers without a double-Arc.
    let shared_state = Arc::new(state);

    let cors = cors_layer(&shared_state.settings);

    // Only the compare endpoint spends money upstream, so only it sits
    // behind the rate limiter.
    let throttled = Router::new()
        .route("/api/compare", post(super::routes::compare::compare))
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&shared_state),
            super::middleware::rate_limit,
        ));

    let api = Router::new()
        // Service identity & health
        .route("/api/", get(super::routes::health::root))
        .route("/health", get(super::routes::health::get_health))
        .route("/metrics", get(super::routes::metrics::get_metrics))
        // Templates
        .route("/api/templates", get(super::routes::templates::list_templates))
        .route(
            "/api/templates/category/{category}",
            get(super::routes::templates::list_by_category),
        )
        .route(
            "/api/templates/{id}",
            get(super::routes::templates::get_template),
        )
        .route(
            "/api/categories",
            get(super::routes::templates::list_categories),
        )
        .route("/api/render", post(super::routes::templates::render_template))
        // Pricing & analysis
        .route("/api/pricing", get(super::routes::pricing::get_pricing))
        .route("/api/optimize", post(super::routes::optimize::optimize))
        // Cache observability
        .route("/api/cache/stats", get(super::routes::cache::get_stats))
        .route("/api/cache/clear", post(super::routes::cache::clear_cache))
        .merge(throttled)
        // Body size limit: 1 MiB.  Applied ahead of the other layers so
        // oversized payloads are rejected before any JSON parsing.
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(axum_mw::from_fn(super::middleware::security_headers))
        .layer(axum_mw::from_fn(super::middleware::request_context))
        .with_state(shared_state);

    if let Some(dir) = static_dir {
        api.fallback_service(tower_http::services::ServeDir::new(dir))
    } else {
        api
    }
}

/// Periodically sweep expired cache entries and log a usage snapshot.
pub fn start_cache_sweeper(state: &AppState) -> tokio::task::JoinHandle<()> {
    let cache = Arc::clone(&state.cache);
    let metrics = Arc::clone(&state.metrics);
    let every = state.settings.cache_cleanup_interval_secs.max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(every));
        // The first tick completes immediately; skip it so startup stays
        // quiet.
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = cache.lock().expect("cache lock poisoned").cleanup_expired();
            if removed > 0 {
                info!(removed, "Cache sweep removed expired entries");
            }
            metrics.emit_usage("periodic");
        }
    })
}

/// Start the API server.
pub async fn start_server(
    settings: Arc<Settings>,
    static_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = AppState::new(Arc::clone(&settings));
    start_cache_sweeper(&state);

    let app = build_router(state, static_dir);
    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Prompt Arena API server listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn make_state() -> AppState {
        AppState::new(Arc::new(Settings::default()))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_state_new_wires_settings() {
        let settings = Settings {
            cache_max_entries: 7,
            ..Settings::default()
        };
        let state = AppState::new(Arc::new(settings));
        assert_eq!(state.templates.len(), 10);
        assert_eq!(state.cache_lock().get_stats().max_size, 7);
        assert_eq!(state.settings.cache_max_entries, 7);
    }

    #[test]
    fn test_build_router_no_static() {
        let _router = build_router(make_state(), None);
    }

    #[test]
    fn test_build_router_with_static() {
        let dir = std::env::temp_dir();
        let _router = build_router(make_state(), Some(dir));
    }

    #[tokio::test]
    async fn test_root_endpoint_served_with_stamped_headers() {
        let app = build_router(make_state(), None);
        let resp = app.oneshot(get_request("/api/")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-process-time"));
        assert_eq!(
            resp.headers().get("x-api-version").unwrap(),
            env!("CARGO_PKG_VERSION")
        );
        assert_eq!(
            resp.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );

        let body = json_body(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "Prompt Arena");
    }

    #[tokio::test]
    async fn test_health_endpoint_reports_catalog() {
        let app = build_router(make_state(), None);
        let resp = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["templates_available"], 10);
    }

    #[tokio::test]
    async fn test_cache_stats_endpoint_routed() {
        let app = build_router(make_state(), None);
        let resp = app.oneshot(get_request("/api/cache/stats")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["size"], 0);
        assert_eq!(body["hits"], 0);
    }

    #[tokio::test]
    async fn test_cache_clear_endpoint_routed() {
        let app = build_router(make_state(), None);
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/cache/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_without_static_dir() {
        let app = build_router(make_state(), None);
        let resp = app.oneshot(get_request("/nope")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_template_detail_routed_before_category_listing() {
        let app = build_router(make_state(), None);

        let resp = app
            .clone()
            .oneshot(get_request("/api/templates/summarization"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["id"], "summarization");

        let resp = app
            .oneshot(get_request("/api/templates/category/coding"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
