//! Service configuration loaded from the environment.
//!
//! A `.env` file is loaded by the binary (dotenvy) before `from_env` runs.
//! Every field has a default so the service starts with zero configuration;
//! provider API keys are the only values that gate functionality.

use crate::error::{ArenaError, Result};

/// Runtime settings for the promptarena service.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Deployment environment name ("development", "production", ...).
    pub environment: String,
    /// Bind address for the API server.
    pub host: String,
    /// Bind port for the API server.
    pub port: u16,
    /// Allowed CORS origins, already split and trimmed.
    pub cors_origins: Vec<String>,
    /// Log level used when RUST_LOG is unset.
    pub log_level: String,
    /// OpenAI API key. None when unset or empty.
    pub openai_api_key: Option<String>,
    /// Anthropic API key. None when unset or empty.
    pub anthropic_api_key: Option<String>,
    /// Per-request timeout for provider HTTP calls, in seconds.
    pub llm_timeout_secs: u64,
    /// Maximum accepted prompt length in characters.
    pub max_prompt_length: usize,
    /// Response cache capacity (entries).
    pub cache_max_entries: usize,
    /// Response cache TTL in seconds. Zero or negative means entries
    /// never expire.
    pub cache_ttl_seconds: f64,
    /// Interval between background expired-entry sweeps, in seconds.
    pub cache_cleanup_interval_secs: u64,
    /// Whether the /api/compare rate limit is enforced.
    pub rate_limit_enabled: bool,
    /// Requests allowed per window per client.
    pub rate_limit_max_requests: u32,
    /// Rate limit window length, in seconds.
    pub rate_limit_window_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            log_level: "info".to_string(),
            openai_api_key: None,
            anthropic_api_key: None,
            llm_timeout_secs: 30,
            max_prompt_length: 4000,
            cache_max_entries: 1000,
            cache_ttl_seconds: 3600.0,
            cache_cleanup_interval_secs: 300,
            rate_limit_enabled: true,
            rate_limit_max_requests: 20,
            rate_limit_window_secs: 60,
        }
    }
}

impl Settings {
    /// Build settings from environment variables, falling back to defaults
    /// for anything unset. Malformed numeric values are config errors.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Ok(v) = std::env::var("ENVIRONMENT") {
            settings.environment = v;
        }
        if let Ok(v) = std::env::var("HOST") {
            settings.host = v;
        }
        if let Ok(v) = std::env::var("PORT") {
            settings.port = parse_num("PORT", &v)?;
        }
        if let Ok(v) = std::env::var("CORS_ORIGINS") {
            settings.cors_origins = split_origins(&v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            settings.log_level = v;
        }
        settings.openai_api_key = non_empty(std::env::var("OPENAI_API_KEY").ok());
        settings.anthropic_api_key = non_empty(std::env::var("ANTHROPIC_API_KEY").ok());
        if let Ok(v) = std::env::var("LLM_TIMEOUT_SECS") {
            settings.llm_timeout_secs = parse_num("LLM_TIMEOUT_SECS", &v)?;
        }
        if let Ok(v) = std::env::var("MAX_PROMPT_LENGTH") {
            settings.max_prompt_length = parse_num("MAX_PROMPT_LENGTH", &v)?;
        }
        if let Ok(v) = std::env::var("CACHE_MAX_ENTRIES") {
            settings.cache_max_entries = parse_num("CACHE_MAX_ENTRIES", &v)?;
        }
        if let Ok(v) = std::env::var("CACHE_TTL_SECONDS") {
            settings.cache_ttl_seconds = parse_num("CACHE_TTL_SECONDS", &v)?;
        }
        if let Ok(v) = std::env::var("CACHE_CLEANUP_INTERVAL_SECS") {
            settings.cache_cleanup_interval_secs = parse_num("CACHE_CLEANUP_INTERVAL_SECS", &v)?;
        }
        if let Ok(v) = std::env::var("RATE_LIMIT_ENABLED") {
            settings.rate_limit_enabled = parse_bool("RATE_LIMIT_ENABLED", &v)?;
        }
        if let Ok(v) = std::env::var("RATE_LIMIT_MAX_REQUESTS") {
            settings.rate_limit_max_requests = parse_num("RATE_LIMIT_MAX_REQUESTS", &v)?;
        }
        if let Ok(v) = std::env::var("RATE_LIMIT_WINDOW_SECS") {
            settings.rate_limit_window_secs = parse_num("RATE_LIMIT_WINDOW_SECS", &v)?;
        }

        Ok(settings)
    }

    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Split a comma-separated origin list, dropping empty segments.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_num<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ArenaError::Config(format!("invalid value for {}: '{}'", name, raw)))
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ArenaError::Config(format!(
            "invalid value for {}: '{}'",
            name, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let s = Settings::default();
        assert_eq!(s.environment, "development");
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 8000);
        assert_eq!(
            s.cors_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
        assert_eq!(s.llm_timeout_secs, 30);
        assert_eq!(s.max_prompt_length, 4000);
        assert_eq!(s.cache_max_entries, 1000);
        assert_eq!(s.cache_ttl_seconds, 3600.0);
        assert_eq!(s.cache_cleanup_interval_secs, 300);
        assert!(s.rate_limit_enabled);
        assert_eq!(s.rate_limit_max_requests, 20);
        assert_eq!(s.rate_limit_window_secs, 60);
        assert!(s.openai_api_key.is_none());
        assert!(s.anthropic_api_key.is_none());
    }

    #[test]
    fn test_bind_addr_formats_host_and_port() {
        let s = Settings {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..Settings::default()
        };
        assert_eq!(s.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_is_production_case_insensitive() {
        let mut s = Settings::default();
        assert!(!s.is_production());
        s.environment = "Production".to_string();
        assert!(s.is_production());
    }

    #[test]
    fn test_split_origins_trims_and_drops_empties() {
        let origins = split_origins(" http://a.test , http://b.test ,, ");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_non_empty_filters_blank_keys() {
        assert_eq!(non_empty(Some("sk-123".to_string())).as_deref(), Some("sk-123"));
        assert!(non_empty(Some("   ".to_string())).is_none());
        assert!(non_empty(None).is_none());
    }

    #[test]
    fn test_parse_num_rejects_garbage_with_var_name() {
        let err = parse_num::<u16>("PORT", "eight").unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(err.to_string().contains("eight"));
    }

    #[test]
    fn test_parse_num_accepts_padded_input() {
        let port: u16 = parse_num("PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_parse_bool_variants() {
        assert!(parse_bool("X", "true").unwrap());
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(parse_bool("X", "1").unwrap());
        assert!(!parse_bool("X", "off").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
