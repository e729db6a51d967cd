//! OpenAI chat-completions client.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::{provider_error, LLMProvider, LLMResponse, Usage};
use crate::error::{ArenaError, Result};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

pub struct OpenAiProvider {
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    client: reqwest::Client,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl OpenAiProvider {
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
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
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
    v["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
}

fn extract_usage(v: &Value) -> Option<Usage> {
    let usage = v.get("usage")?;
    let input = usage["prompt_tokens"].as_u64()? as u32;
    let output = usage["completion_tokens"].as_u64()? as u32;
    Some(Usage::new(input, output))
}

#[async_trait]
impl LLMProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<LLMResponse> {
        let body = self.build_request_body(prompt, system_prompt);
        debug!(model = %self.model, "calling OpenAI chat completions");

        let resp = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ArenaError::Provider(format!("OpenAI request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ArenaError::Provider(format!("OpenAI response unreadable: {e}")))?;
        if !status.is_success() {
            return Err(provider_error("OpenAI", status.as_u16(), &text));
        }

        let v: Value = serde_json::from_str(&text)
            .map_err(|e| ArenaError::Provider(format!("OpenAI returned invalid JSON: {e}")))?;
        let content = extract_text(&v)
            .ok_or_else(|| ArenaError::Provider("OpenAI response had no content".to_string()))?;

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
        "openai"
    }
}
