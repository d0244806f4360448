//! Ollama API client implementation
//!
//! This module implements the InferenceClient trait against a local
//! Ollama-compatible server. The client owns the request deadline and the
//! policy for classifying transport failures, so tools never see raw
//! reqwest errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use crate::error::BridgeError;

/// Default Ollama base URL
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model to use
const DEFAULT_MODEL: &str = "qwen3:1.7b";

/// Default request deadline. Local inference is slow but must stay bounded.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for the Ollama client
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl OllamaConfig {
    /// Create a new config pointing at a specific server
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Errors surfaced by the inference client
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// Client construction failed
    #[error("inference client configuration error: {0}")]
    Config(String),

    /// Endpoint did not accept a connection (server not running)
    #[error("inference backend unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    /// No response within the configured deadline
    #[error("inference backend did not respond within {timeout:?}")]
    Timeout { timeout: Duration },

    /// Backend answered with an error status (e.g. unknown model)
    #[error("inference backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be interpreted
    #[error("invalid inference response: {0}")]
    InvalidResponse(String),
}

impl From<InferenceError> for BridgeError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Timeout { .. } => BridgeError::UpstreamTimeout(err.to_string()),
            _ => BridgeError::Upstream(err.to_string()),
        }
    }
}

/// Trait for inference backends
///
/// Tools depend on this rather than on the concrete client so tests can
/// substitute a stub.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Model used when the caller does not pick one
    fn model(&self) -> &str;

    /// Run a single generate call and return the full answer text
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InferenceError>;
}

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: OllamaConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InferenceError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// The generate endpoint for the configured server
    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }

    /// Build the request body for the generate API
    fn build_request(&self, model: &str, prompt: &str) -> Value {
        json!({
            "model": model,
            "prompt": prompt,
            "stream": false
        })
    }

    /// Classify a reqwest transport failure
    fn map_transport_error(&self, url: &str, err: reqwest::Error) -> InferenceError {
        if err.is_timeout() {
            InferenceError::Timeout {
                timeout: self.config.timeout,
            }
        } else if err.is_connect() {
            InferenceError::Unreachable {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            InferenceError::InvalidResponse(err.to_string())
        }
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InferenceError> {
        let url = self.endpoint();
        let body = self.build_request(model, prompt);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message: extract_error_text(&error_body),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(&url, e))?;

        parse_generate_body(&text)
    }
}

impl std::fmt::Debug for OllamaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

/// Pull the "error" field out of an Ollama error body, falling back to the
/// raw text when the body is not JSON.
fn extract_error_text(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Parse a generate response body into the answer text.
///
/// With `stream: false` the body is a single JSON object, but older servers
/// answer with newline-delimited JSON chunks regardless. Both shapes are
/// accepted: every line's "response" field is concatenated in order.
fn parse_generate_body(body: &str) -> Result<String, InferenceError> {
    let mut answer = String::new();
    let mut saw_response = false;

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(line) {
            if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
                return Err(InferenceError::InvalidResponse(format!(
                    "backend reported an error: {}",
                    message
                )));
            }
            if let Some(chunk) = value.get("response").and_then(|r| r.as_str()) {
                answer.push_str(chunk);
                saw_response = true;
            }
        }
    }

    if saw_response {
        Ok(answer)
    } else {
        Err(InferenceError::InvalidResponse(
            "no response field in body".to_string(),
        ))
    }
}
