//! Lock-free usage counters for the playground service.
//!
//! Handlers bump these on every request; `GET /metrics` renders the
//! [`UsageMetrics::summary`] snapshot. Counters are process-local and
//! reset on restart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::info;

// ============================================================================
// Endpoint breakdown
// ============================================================================

/// Counted endpoint groups. Cache observability endpoints are deliberately
/// uncounted so polling them does not skew usage numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Compare,
    Templates,
    Render,
    Pricing,
    Optimize,
}

// ============================================================================
// UsageMetrics
// ============================================================================

/// Per-request counters plus response-time accumulation.
#[derive(Debug)]
pub struct UsageMetrics {
    started: Instant,
    started_at: DateTime<Utc>,
    pub total_requests: AtomicU64,
    pub compare_requests: AtomicU64,
    pub template_requests: AtomicU64,
    pub render_requests: AtomicU64,
    pub pricing_requests: AtomicU64,
    pub optimize_requests: AtomicU64,
    pub llm_errors: AtomicU64,
    pub total_errors: AtomicU64,
    response_time_micros: AtomicU64,
    response_count: AtomicU64,
}

impl UsageMetrics {
    /// Create zeroed counters anchored at "now".
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            started_at: Utc::now(),
            total_requests: AtomicU64::new(0),
            compare_requests: AtomicU64::new(0),
            template_requests: AtomicU64::new(0),
            render_requests: AtomicU64::new(0),
            pricing_requests: AtomicU64::new(0),
            optimize_requests: AtomicU64::new(0),
            llm_errors: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            response_time_micros: AtomicU64::new(0),
            response_count: AtomicU64::new(0),
        }
    }

    /// Count one request against an endpoint group.
    pub fn record_request(&self, endpoint: Endpoint) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let counter = match endpoint {
            Endpoint::Compare => &self.compare_requests,
            Endpoint::Templates => &self.template_requests,
            Endpoint::Render => &self.render_requests,
            Endpoint::Pricing => &self.pricing_requests,
            Endpoint::Optimize => &self.optimize_requests,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a generic handler error.
    pub fn record_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an upstream LLM failure. Also counts toward total errors.
    pub fn record_llm_error(&self) {
        self.llm_errors.fetch_add(1, Ordering::Relaxed);
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Accumulate one end-to-end response time.
    pub fn record_response_time(&self, elapsed: Duration) {
        self.response_time_micros
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.response_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Elapsed time since the counters were created.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Render the full snapshot served by `GET /metrics`.
    ///
    /// Rates are plain fractions, not percentages.
    pub fn summary(&self) -> Value {
        let total = self.total_requests.load(Ordering::Relaxed);
        let errors = self.total_errors.load(Ordering::Relaxed);
        let uptime_secs = self.uptime().as_secs_f64();

        let requests_per_second = if uptime_secs > 0.0 {
            total as f64 / uptime_secs
        } else {
            0.0
        };
        let error_rate = if total > 0 {
            errors as f64 / total as f64
        } else {
            0.0
        };

        let timed = self.response_count.load(Ordering::Relaxed);
        let total_response_secs =
            self.response_time_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        let average_response_time = if timed > 0 {
            total_response_secs / timed as f64
        } else {
            0.0
        };

        json!({
            "uptime_seconds": uptime_secs,
            "started_at": self.started_at.to_rfc3339(),
            "total_requests": total,
            "requests": {
                "total": total,
                "compare": self.compare_requests.load(Ordering::Relaxed),
                "templates": self.template_requests.load(Ordering::Relaxed),
                "render": self.render_requests.load(Ordering::Relaxed),
                "pricing": self.pricing_requests.load(Ordering::Relaxed),
                "optimize": self.optimize_requests.load(Ordering::Relaxed),
                "requests_per_second": requests_per_second,
            },
            "performance": {
                "average_response_time": average_response_time,
                "total_response_time": total_response_secs,
            },
            "errors": {
                "total": errors,
                "llm_errors": self.llm_errors.load(Ordering::Relaxed),
                "error_rate": error_rate,
            },
        })
    }

    /// Emit current counters as a structured log line.
    pub fn emit_usage(&self, reason: &str) {
        info!(
            event = "usage_summary",
            reason = reason,
            requests = self.total_requests.load(Ordering::Relaxed),
            compare = self.compare_requests.load(Ordering::Relaxed),
            errors = self.total_errors.load(Ordering::Relaxed),
            llm_errors = self.llm_errors.load(Ordering::Relaxed),
            "Usage metrics"
        );
    }
}

impl Default for UsageMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
