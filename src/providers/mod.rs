//! LLM provider clients.
//!
//! Providers are constructed per comparison request, since model,
//! temperature, and token ceiling all vary by request. Construction is
//! cheap; nothing is shared between calls.

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{ArenaError, Result};

/// Output token ceiling when a request does not specify one.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Token usage reported by a provider for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self { input_tokens, output_tokens }
    }
}

/// A completed generation: response text plus reported usage, when the
/// provider returned any.
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub text: String,
    pub usage: Option<Usage>,
}

impl LLMResponse {
    pub fn text(content: &str) -> Self {
        Self { text: content.to_string(), usage: None }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// A chat-completion backend.
///
/// # Example
///
/// ```rust
/// # use async_trait::async_trait;
/// # use promptarena::error::Result;
/// use promptarena::providers::{LLMProvider, LLMResponse};
///
/// struct Fixed;
///
/// #[async_trait]
/// impl LLMProvider for Fixed {
///     async fn generate(&self, _prompt: &str, _system: Option<&str>) -> Result<LLMResponse> {
///         Ok(LLMResponse::text("four"))
///     }
///     fn model_name(&self) -> &str { "fixed-1" }
///     fn name(&self) -> &str { "fixed" }
/// }
///
/// # tokio_test::block_on(async {
/// let provider = Fixed;
/// let reply = provider.generate("What is 2 + 2?", None).await.unwrap();
/// assert_eq!(reply.text, "four");
/// # });
/// ```
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion for `prompt`, optionally steered by a
    /// system prompt.
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<LLMResponse>;

    /// Model this instance calls.
    fn model_name(&self) -> &str;

    /// Short provider id ("openai", "anthropic").
    fn name(&self) -> &str;
}

/// Summarizes a boxed provider by id and model only; implementor state
/// (API keys in particular) never reaches the output.
impl fmt::Debug for dyn LLMProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LLMProvider")
            .field("provider", &self.name())
            .field("model", &self.model_name())
            .finish()
    }
}

/// Seam over [`create_provider`] so handler tests can inject canned
/// providers instead of live HTTP clients.
#[cfg_attr(test, mockall::automock)]
pub trait ProviderFactory: Send + Sync {
    fn create(
        &self,
        name: &str,
        model: Option<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<Box<dyn LLMProvider>>;
}

/// The production factory: builds real clients from service settings.
pub struct SettingsProviderFactory {
    settings: Arc<Settings>,
}

impl SettingsProviderFactory {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }
}

impl ProviderFactory for SettingsProviderFactory {
    fn create(
        &self,
        name: &str,
        model: Option<String>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<Box<dyn LLMProvider>> {
        create_provider(&self.settings, name, model.as_deref(), temperature, max_tokens)
    }
}

/// Default model for a provider name, if the name is recognized.
///
/// The compare handler resolves models up front so cache keys are built
/// from the model actually called, not from "whatever the default was".
pub fn default_model(name: &str) -> Option<&'static str> {
    match name.to_lowercase().as_str() {
        "openai" => Some(openai::DEFAULT_OPENAI_MODEL),
        "anthropic" => Some(anthropic::DEFAULT_ANTHROPIC_MODEL),
        _ => None,
    }
}

/// Build a provider by name. Names are matched case-insensitively; an
/// unknown name or a missing API key is an error.
pub fn create_provider(
    settings: &Settings,
    name: &str,
    model: Option<&str>,
    temperature: f64,
    max_tokens: u32,
) -> Result<Box<dyn LLMProvider>> {
    match name.to_lowercase().as_str() {
        "openai" => {
            let key = settings
                .openai_api_key
                .as_deref()
                .ok_or_else(|| ArenaError::Config("OpenAI API key required".to_string()))?;
            Ok(Box::new(OpenAiProvider::new(
                key,
                model.unwrap_or(openai::DEFAULT_OPENAI_MODEL),
                temperature,
                max_tokens,
                settings.llm_timeout_secs,
            )))
        }
        "anthropic" => {
            let key = settings
                .anthropic_api_key
                .as_deref()
                .ok_or_else(|| ArenaError::Config("Anthropic API key required".to_string()))?;
            Ok(Box::new(AnthropicProvider::new(
                key,
                model.unwrap_or(anthropic::DEFAULT_ANTHROPIC_MODEL),
                temperature,
                max_tokens,
                settings.llm_timeout_secs,
            )))
        }
        other => Err(ArenaError::UnknownProvider(other.to_string())),
    }
}

/// Map a non-2xx provider response to an error, surfacing the upstream
/// `error.message` when the body is JSON.
pub(crate) fn provider_error(label: &str, status: u16, body: &str) -> ArenaError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string());
    ArenaError::Provider(format!("{} API error ({}): {}", label, status, detail))
}
