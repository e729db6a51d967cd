//! Anthropic messages-API client.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::{provider_error, LLMProvider, LLMResponse, Usage};
use crate::error::{ArenaError, Result};

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    client: reqwest::Client,
}

impl fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(
        api_key: &str,
        model: &str,
        temperature: f64,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
            max_tokens,
            client: build_client(timeout_secs),
        }
    }

    // ── Request building ────────────────────────────────────────────

    fn build_request_body(&self, prompt: &str, system_prompt: Option<&str>) -> Value {
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });
        // The messages API takes the system prompt as a top-level field,
        // not as a message role.
        if let Some(system) = system_prompt {
            body["system"] = json!(system);
        }
        body
    }
}

fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .expect("failed to build HTTP client")
}

// ── Response parsing ────────────────────────────────────────────────

fn extract_text(v: &Value) -> Option<String> {
    v["content"][0]["text"].as_str().map(str::to_string)
}

fn extract_usage(v: &Value) -> Option<Usage> {
    let usage = v.get("usage")?;
    let input = usage["input_tokens"].as_u64()? as u32;
    let output = usage["output_tokens"].as_u64()? as u32;
    Some(Usage::new(input, output))
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<LLMResponse> {
        let body = self.build_request_body(prompt, system_prompt);
        debug!(model = %self.model, "calling Anthropic messages API");

        let resp = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ArenaError::Provider(format!("Anthropic request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ArenaError::Provider(format!("Anthropic response unreadable: {e}")))?;
        if !status.is_success() {
            return Err(provider_error("Anthropic", status.as_u16(), &text));
        }

        let v: Value = serde_json::from_str(&text)
            .map_err(|e| ArenaError::Provider(format!("Anthropic returned invalid JSON: {e}")))?;
        let content = extract_text(&v)
            .ok_or_else(|| ArenaError::Provider("Anthropic response had no content".to_string()))?;

        let mut response = LLMResponse::text(&content);
        if let Some(usage) = extract_usage(&v) {
            response = response.with_usage(usage);
        }
        Ok(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
