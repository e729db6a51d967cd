//! LLM response caching with TTL expiry and LRU eviction.

pub mod response_cache;

pub use response_cache::{CacheEntry, CacheStats, RequestKey, ResponseCache, DEFAULT_TEMPERATURE};
