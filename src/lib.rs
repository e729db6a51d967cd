//! Side-by-side LLM prompt comparison with cost estimation and response
//! caching.
//!
//! The crate exposes a small set of building blocks:
//!
//! - [`providers`]: async clients for OpenAI and Anthropic behind one trait
//! - [`cache`]: an LRU + TTL response cache keyed by request fingerprint
//! - [`pricing`]: the per-model cost table and token estimation
//! - [`prompts`]: the built-in template catalog and the heuristic analyzer
//! - [`api`]: the axum HTTP surface tying it all together
//!
//! The `promptarena` binary layers a clap CLI on top.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pricing;
pub mod prompts;
pub mod providers;
