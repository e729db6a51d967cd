//! In-memory LLM response cache with TTL expiry and LRU eviction.
//!
//! Identical requests (same prompt, provider, model, temperature, and
//! system prompt) fingerprint to the same SHA-256 digest, so a repeated
//! comparison reuses the stored response instead of re-billing the
//! provider. Entries live until they expire, get evicted, or the cache is
//! cleared; nothing is persisted across restarts.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Temperature assumed when a request does not specify one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Identity of a generation request for caching purposes.
///
/// Two keys fingerprint identically exactly when all five fields match.
/// An absent system prompt and an empty one are deliberately treated as
/// the same request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestKey {
    pub prompt: String,
    pub provider: String,
    pub model: String,
    pub temperature: f64,
    pub system_prompt: Option<String>,
}

impl RequestKey {
    /// Key with the default temperature and no system prompt.
    pub fn new(
        prompt: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            provider: provider.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Deterministic SHA-256 fingerprint of the request, hex encoded.
    ///
    /// Fields are hashed in a fixed order with length-prefixed encoding to
    /// prevent separator collisions (e.g. prompt `"ab"` + provider `"c"`
    /// vs prompt `"a"` + provider `"bc"`). Temperature contributes its raw
    /// IEEE 754 bits. Stable across processes: the digest covers field
    /// contents only.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [&self.prompt, &self.provider, &self.model] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        hasher.update(self.temperature.to_bits().to_le_bytes());
        let system = self.system_prompt.as_deref().unwrap_or("");
        hasher.update((system.len() as u64).to_le_bytes());
        hasher.update(system.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// A single cached LLM response.
///
/// Immutable once stored: a repeated `put` under the same fingerprint
/// replaces the entry wholesale rather than mutating it.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    /// Prompt text the response was generated for.
    pub prompt: String,
    /// Provider id ("openai", "anthropic").
    pub provider: String,
    /// Model id the provider used.
    pub model: String,
    /// The LLM response text.
    pub response: String,
    /// Unix timestamp (seconds) when the entry was created.
    pub created_at: f64,
    /// Input token count reported or estimated at generation time.
    pub input_tokens: u32,
    /// Output token count reported or estimated at generation time.
    pub output_tokens: u32,
    /// Dollar cost incurred to generate the response.
    pub cost: f64,
    /// Generation latency in seconds.
    pub latency: f64,
}

/// Bounded LLM response cache with TTL expiry and LRU eviction.
///
/// Methods take `&mut self` and do no I/O or locking of their own. A
/// concurrent embedder wraps the whole cache in one `Mutex` so that each
/// check-then-mutate sequence (lookup + expiry removal, capacity check +
/// eviction + insert) runs atomically with respect to other operations.
/// Size never exceeds `max_size` after a `put`.
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    /// Fingerprint -> access sequence number, used only for eviction order.
    access_order: HashMap<String, u64>,
    /// Monotonic counter bumped on every insert and hit.
    access_clock: u64,
    max_size: usize,
    ttl_seconds: f64,
    hits: u64,
    misses: u64,
    /// Sum of entry costs at the moment of each hit.
    realized_cost_saved: f64,
}

impl ResponseCache {
    /// Create an empty cache holding at most `max_size` entries.
    ///
    /// `max_size` is clamped to a minimum of 1. A `ttl_seconds` of zero or
    /// less means entries never expire.
    pub fn new(max_size: usize, ttl_seconds: f64) -> Self {
        Self {
            entries: HashMap::new(),
            access_order: HashMap::new(),
            access_clock: 0,
            max_size: max_size.max(1),
            ttl_seconds,
            hits: 0,
            misses: 0,
            realized_cost_saved: 0.0,
        }
    }

    /// Look up a cached response. Returns `None` on miss or expiry.
    ///
    /// An expired entry is removed on the spot and counted as a miss. A
    /// hit refreshes the entry's recency and returns a clone; the stored
    /// entry itself is never mutated.
    pub fn get(&mut self, key: &RequestKey) -> Option<CacheEntry> {
        let fp = key.fingerprint();
        let now = Self::now_secs();
        // Check expiry with an immutable borrow first to avoid overlapping borrows.
        let expired = self.entries.get(&fp).map(|e| self.is_expired(e, now));
        match expired {
            Some(true) => {
                debug!(key = %&fp[..8.min(fp.len())], "Cache entry expired, removing");
                self.entries.remove(&fp);
                self.access_order.remove(&fp);
                self.misses += 1;
                None
            }
            Some(false) => {
                self.touch(&fp);
                self.hits += 1;
                let entry = self.entries.get(&fp).cloned();
                if let Some(e) = &entry {
                    self.realized_cost_saved += e.cost;
                }
                entry
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a response. Never fails.
    ///
    /// When the cache is full and the fingerprint is new, the
    /// least-recently-used entry is evicted first; overwriting an existing
    /// fingerprint replaces it in place without evicting anything. The new
    /// entry's creation timestamp and recency are both "now".
    #[allow(clippy::too_many_arguments)]
    pub fn put(
        &mut self,
        key: &RequestKey,
        response: &str,
        input_tokens: u32,
        output_tokens: u32,
        cost: f64,
        latency: f64,
    ) {
        let fp = key.fingerprint();
        if self.entries.len() >= self.max_size && !self.entries.contains_key(&fp) {
            self.evict_one();
        }
        let now = Self::now_secs();
        self.entries.insert(
            fp.clone(),
            CacheEntry {
                prompt: key.prompt.clone(),
                provider: key.provider.clone(),
                model: key.model.clone(),
                response: response.to_string(),
                created_at: now,
                input_tokens,
                output_tokens,
                cost,
                latency,
            },
        );
        self.touch(&fp);
    }

    /// Evict the least-recently-used entry. No-op on an empty cache.
    ///
    /// Recency ties (possible only via direct state manipulation) break on
    /// fingerprint order, keeping eviction deterministic.
    pub fn evict_one(&mut self) {
        let victim = self
            .access_order
            .iter()
            .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(k, _)| k.clone());
        if let Some(fp) = victim {
            debug!(key = %&fp[..8.min(fp.len())], "Evicting LRU cache entry");
            self.entries.remove(&fp);
            self.access_order.remove(&fp);
        }
    }

    /// Remove every expired entry and return how many were removed.
    ///
    /// Idempotent: a second immediate call returns 0. Lazy expiry in
    /// [`get`](Self::get) keeps the cache correct even if this is never
    /// called; the server runs it periodically to reclaim memory early.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Self::now_secs();
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| self.is_expired(e, now))
            .map(|(k, _)| k.clone())
            .collect();
        for fp in &stale {
            self.entries.remove(fp);
            self.access_order.remove(fp);
        }
        if !stale.is_empty() {
            debug!(removed = stale.len(), "Swept expired cache entries");
        }
        stale.len()
    }

    /// Aggregate statistics. Pure read; counters are not touched.
    pub fn get_stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            let pct = self.hits as f64 / total as f64 * 100.0;
            (pct * 100.0).round() / 100.0
        };
        let resident_cost: f64 = self.entries.values().map(|e| e.cost).sum();
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            ttl_seconds: self.ttl_seconds,
            estimated_cost_saved: resident_cost * self.hits as f64,
            realized_cost_saved: self.realized_cost_saved,
        }
    }

    /// Remove all entries. Hit/miss counters and the realized-savings
    /// ledger are process-lifetime statistics and survive a clear.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.access_order.clear();
        debug!("Response cache cleared");
    }

    /// Number of entries currently in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the cache contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -- private helpers ---------------------------------------------------

    fn is_expired(&self, entry: &CacheEntry, now: f64) -> bool {
        // ttl <= 0 disables expiry; a clock regression reads as age zero.
        self.ttl_seconds > 0.0 && (now - entry.created_at) > self.ttl_seconds
    }

    fn touch(&mut self, fp: &str) {
        self.access_clock += 1;
        self.access_order.insert(fp.to_string(), self.access_clock);
    }

    fn now_secs() -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

/// Aggregate cache statistics, served verbatim by `GET /api/cache/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Number of entries currently in the cache.
    pub size: usize,
    /// Configured capacity.
    pub max_size: usize,
    /// Cumulative hits since process start.
    pub hits: u64,
    /// Cumulative misses since process start.
    pub misses: u64,
    /// Hit percentage (0-100), 0 when no requests have been made.
    pub hit_rate: f64,
    /// Configured TTL in seconds.
    pub ttl_seconds: f64,
    /// Historical approximation: cost of all resident entries times total
    /// hits. Kept for dashboard compatibility; see `realized_cost_saved`
    /// for the exact figure.
    pub estimated_cost_saved: f64,
    /// Exact savings: sum of each hit entry's cost at the moment it was
    /// served from cache.
    pub realized_cost_saved: f64,
}
