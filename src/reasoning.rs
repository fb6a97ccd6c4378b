//! Text completion used by the reasoning endpoint.
//!
//! Provides the [`TextCompletion`] trait, an OpenAI-compatible chat
//! completions client, and a stand-in used when no provider is configured.
//! The client is created via [`create_completion`] from configuration.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::ReasoningConfig;

/// Turns a system prompt and a user prompt into text.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// Create a completion client from config.
///
/// `"none"` yields [`Unconfigured`]; `"openai"` talks to any OpenAI-compatible
/// `/chat/completions` endpoint, reading the API key from `api_key_env`.
pub fn create_completion(config: &ReasoningConfig) -> Result<Box<dyn TextCompletion>> {
    match config.provider.as_str() {
        "none" => Ok(Box::new(Unconfigured)),
        "openai" => Ok(Box::new(OpenAiCompletion::new(config)?)),
        other => anyhow::bail!("unknown reasoning provider: {other}. Supported: none, openai"),
    }
}

/// Fails every request with a hint on how to configure a provider.
pub struct Unconfigured;

#[async_trait]
impl TextCompletion for Unconfigured {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        anyhow::bail!("no reasoning provider configured; set [reasoning] provider = \"openai\"")
    }

    fn name(&self) -> &str {
        "none"
    }
}

pub struct OpenAiCompletion {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiCompletion {
    pub fn new(config: &ReasoningConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        // Local endpoints often need no key, so a missing variable is not fatal.
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            tracing::warn!(env = %config.api_key_env, "no API key set for reasoning provider");
        }

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextCompletion for OpenAiCompletion {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        tracing::debug!(model = %self.model, url = %self.endpoint, "sending completion request");

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("completion request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("completion endpoint returned HTTP {status}: {detail}");
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse completion response")?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("completion response has no content")
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// The user prompt sent for a reasoning query.
pub fn reasoning_prompt(query: &str, context: Option<&str>) -> String {
    let context = context
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("No additional context provided");
    format!("Query: {query}\nContext: {context}")
}
