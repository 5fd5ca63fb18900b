//! Chat-completion client used to summarize retrieved emails.
//!
//! The [`Completions`] trait is the seam the pipeline depends on, so
//! tests can substitute a fake. [`GroqClient`] talks to any
//! OpenAI-compatible `/chat/completions` endpoint (Groq by default) with
//! a fixed low temperature, a bounded response length, a bounded request
//! timeout, and no streaming. Single attempt per call — repeated calls
//! are the caller's responsibility.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::LlmConfig;

/// LLM completion backend.
#[async_trait]
pub trait Completions: Send + Sync {
    /// Obtain a completion for `prompt`. Blocking request/response, no
    /// streaming.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI-compatible chat-completion client.
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    api_key: Option<String>,
}

impl GroqClient {
    /// Build a client from config. The `GROQ_API_KEY` environment
    /// variable is read here but only enforced on the first call, so
    /// flows that never reach the LLM (empty index, ingestion-only runs)
    /// work without a key.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            api_key: std::env::var("GROQ_API_KEY").ok(),
        })
    }
}

#[async_trait]
impl Completions for GroqClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("GROQ_API_KEY environment variable not set"))?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("LLM API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_completion_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completion response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid LLM response: missing choices[0].message.content"))
}

/// A no-op backend that always errors. Used when `llm.provider` is
/// `"disabled"` — ingestion and empty-index searches still work.
pub struct DisabledClient;

#[async_trait]
impl Completions for DisabledClient {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("LLM provider is disabled")
    }
}

/// Create the configured [`Completions`] backend.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn Completions>> {
    match config.provider.as_str() {
        "groq" => Ok(Arc::new(GroqClient::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledClient)),
        other => bail!("Unknown llm provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_response() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "1. Standup at 9:30"}}]
        });
        assert_eq!(
            parse_completion_response(&json).unwrap(),
            "1. Standup at 9:30"
        );
    }

    #[test]
    fn test_parse_completion_response_missing_content() {
        let json = serde_json::json!({"choices": []});
        assert!(parse_completion_response(&json).is_err());
    }

    #[tokio::test]
    async fn test_disabled_client_errors() {
        let client = DisabledClient;
        assert!(client.complete("anything").await.is_err());
    }
}
