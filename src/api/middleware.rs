//! Request middleware: rate limiting, timing headers, security headers.
//!
//! The rate limiter is a fixed-window counter keyed by client address and
//! applied only to the compare route, which is the one endpoint that spends
//! money upstream. Everything else passes through unthrottled.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use super::server::AppState;

/// Entries kept in the limiter map before stale windows are pruned.
const LIMITER_PRUNE_THRESHOLD: usize = 1024;

// ============================================================================
// RateLimiter
// ============================================================================

/// Fixed-window request counter, one window per client key.
///
/// A client may make `max_requests` requests per `window_secs` window;
/// the count resets when the wall clock crosses a window boundary.
pub struct RateLimiter {
    max_requests: u32,
    window_secs: u64,
    windows: Mutex<HashMap<String, (u64, u32)>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            // A zero window would divide by zero when bucketing.
            window_secs: window_secs.max(1),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` when the request is within the client's budget.
    pub fn check(&self, client: &str) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.check_at(client, now)
    }

    fn check_at(&self, client: &str, now_secs: u64) -> bool {
        let window_id = now_secs / self.window_secs;
        let mut windows = self.windows.lock().expect("rate limiter lock poisoned");

        if windows.len() > LIMITER_PRUNE_THRESHOLD {
            windows.retain(|_, (id, _)| *id == window_id);
        }

        let slot = windows.entry(client.to_string()).or_insert((window_id, 0));
        if slot.0 != window_id {
            *slot = (window_id, 0);
        }
        if slot.1 >= self.max_requests {
            return false;
        }
        slot.1 += 1;
        true
    }
}

/// Client key for throttling: first `X-Forwarded-For` hop when present.
///
/// Without a reverse proxy in front, all clients share the "local" bucket.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

// ============================================================================
// Middleware functions
// ============================================================================

/// Throttle middleware for the compare route.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.settings.rate_limit_enabled {
        return next.run(request).await;
    }

    let client = client_key(request.headers());
    if state.limiter.check(&client) {
        next.run(request).await
    } else {
        warn!(client = %client, "Rate limit exceeded");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Rate limit exceeded. Please try again later." })),
        )
            .into_response()
    }
}

/// Outermost middleware: logs each request and stamps responses with
/// `X-Process-Time` (seconds) and `X-API-Version`.
pub async fn request_context(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    if let Ok(value) = HeaderValue::from_str(&format!("{:.4}", elapsed)) {
        response.headers_mut().insert("x-process-time", value);
    }
    response.headers_mut().insert(
        "x-api-version",
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    debug!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_secs = format!("{:.4}", elapsed),
        "Request handled"
    );
    response
}

/// Stamp the standard hardening headers on every response.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("x-xss-protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    response
}

// ============================================================================
// Tests
// ============================================================================
