//! Error types shared across the promptarena library.

use thiserror::Error;

/// Errors surfaced by the promptarena library.
///
/// The cache itself is infallible; errors come from configuration,
/// provider calls, and template lookups.
#[derive(Error, Debug)]
pub enum ArenaError {
    /// Configuration problem: missing API key, malformed env value.
    #[error("Config error: {0}")]
    Config(String),

    /// Upstream LLM provider failure (HTTP error, malformed response body).
    #[error("Provider error: {0}")]
    Provider(String),

    /// Request named a provider this build does not support.
    #[error("Unsupported provider: {0}. Use 'openai' or 'anthropic'")]
    UnknownProvider(String),

    /// Prompt template id that does not exist in the library.
    #[error("Template '{0}' not found")]
    TemplateNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used by library modules.
pub type Result<T> = std::result::Result<T, ArenaError>;
