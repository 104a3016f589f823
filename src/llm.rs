//! Text generation providers.
//!
//! Concrete implementations of the core [`Generator`] trait:
//! - [`OpenAiGenerator`]: non-streaming `POST {url}/v1/chat/completions`
//!   with a single user message.
//! - [`OllamaGenerator`]: `POST {url}/api/generate` with `stream: false`.
//! - [`DisabledGenerator`]: always fails.
//!
//! Model, temperature and token limit come from [`LlmConfig`]. Requests
//! go through [`crate::http::JsonEndpoint`], so transient failures are
//! retried with backoff.

use std::time::Instant;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use docubot_core::Generator;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::LlmConfig;
use crate::embedding::{OLLAMA_BASE_URL, OPENAI_BASE_URL};
use crate::http::{client_with_timeout, JsonEndpoint};

pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        bail!("LLM provider is disabled")
    }
}

// ============ OpenAI ============

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completion client for the OpenAI API.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    url_chat: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    max_retries: u32,
}

impl OpenAiGenerator {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self> {
        let base = config.url.as_deref().unwrap_or(OPENAI_BASE_URL);
        let url_chat = format!("{}/v1/chat/completions", base.trim_end_matches('/'));
        info!(
            model = %config.model,
            endpoint = %base,
            timeout_secs = config.timeout_secs,
            "OpenAI generator initialized"
        );
        Ok(Self {
            client: client_with_timeout(config.timeout_secs)?,
            url_chat,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
        })
    }

    /// Create a client reading the key from `OPENAI_API_KEY`.
    pub fn from_env(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let started = Instant::now();
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        debug!(model = %self.model, prompt_len = prompt.len(), "POST {}", self.url_chat);

        let endpoint = JsonEndpoint {
            service: "OpenAI",
            url: &self.url_chat,
            bearer: Some(&self.api_key),
            max_retries: self.max_retries,
        };
        let json = endpoint
            .post(&self.client, &serde_json::to_value(&request)?)
            .await?;

        let out: ChatCompletionResponse = serde_json::from_value(json).map_err(|e| {
            anyhow!("Invalid OpenAI response: {}; expected `choices[0].message.content`", e)
        })?;
        let content = out
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .ok_or_else(|| anyhow!("OpenAI response contained no choices"))?;

        info!(
            model = %self.model,
            latency_ms = started.elapsed().as_millis() as u64,
            "chat completion completed"
        );
        Ok(content)
    }
}

// ============ Ollama ============

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Completion client for a local Ollama instance.
pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    max_retries: u32,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base = config.url.as_deref().unwrap_or(OLLAMA_BASE_URL);
        Ok(Self {
            client: client_with_timeout(config.timeout_secs)?,
            url: format!("{}/api/generate", base.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };
        let endpoint = JsonEndpoint {
            service: "Ollama",
            url: &self.url,
            bearer: None,
            max_retries: self.max_retries,
        };
        let json = endpoint
            .post(&self.client, &serde_json::to_value(&request)?)
            .await?;
        let out: GenerateResponse = serde_json::from_value(json)
            .map_err(|e| anyhow!("Invalid Ollama response: {}", e))?;
        Ok(out.response)
    }
}

/// Create the generator selected by `config.provider`.
pub fn create_generator(config: &LlmConfig) -> Result<Box<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGenerator)),
        "openai" => Ok(Box::new(OpenAiGenerator::from_env(config)?)),
        "ollama" => Ok(Box::new(OllamaGenerator::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}
