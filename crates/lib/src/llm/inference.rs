//! Inference client: single-shot prompt → assistant text.

use crate::config::{normalize_backend_url, validate_backend_url, ConfigError};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

pub const CHAT_PATH: &str = "/v1/chat";

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("inference request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("inference api error: {0}")]
    Api(String),
    #[error("inference request timed out after {0:?}")]
    Timeout(Duration),
    #[error("inference response body was empty")]
    EmptyBody,
    #[error("inference request was cancelled")]
    Cancelled,
}

impl InferenceError {
    /// Developer-facing diagnostic. Not meant for display to the user.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Something that can answer a prompt. [`InferenceClient`] is the HTTP
/// implementation; sessions hold it behind this trait so hosts and tests can
/// substitute their own.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn send_prompt(
        &self,
        backend_url: &str,
        model: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, InferenceError>;
}

#[derive(Debug, Serialize)]
struct PromptPayload<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

/// Stateless HTTP client for `POST {base}/v1/chat`. Never retries.
#[derive(Clone, Default)]
pub struct InferenceClient {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl InferenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Bound each request at the transport level as well.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// POST {backend_url}/v1/chat with `{model, prompt, max_tokens}`.
    /// A 2xx body is returned as display text; see [`assistant_text_from_body`].
    pub async fn send_prompt(
        &self,
        backend_url: &str,
        model: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, InferenceError> {
        let base = normalize_backend_url(backend_url);
        validate_backend_url(&base)?;
        let url = format!("{}{}", base, CHAT_PATH);
        let body = PromptPayload {
            model,
            prompt,
            max_tokens,
        };
        log::debug!("POST {} (model {}, max_tokens {})", url, model, max_tokens);

        let mut req = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body);
        if let Some(t) = self.timeout {
            req = req.timeout(t);
        }
        let res = req.send().await.map_err(|e| self.map_transport(e))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(InferenceError::Api(format!("{} {}", status, body)));
        }
        let text = res.text().await.map_err(|e| self.map_transport(e))?;
        assistant_text_from_body(&text)
    }

    fn map_transport(&self, e: reqwest::Error) -> InferenceError {
        match self.timeout {
            Some(t) if e.is_timeout() => InferenceError::Timeout(t),
            _ => InferenceError::Request(e),
        }
    }
}

#[async_trait]
impl InferenceBackend for InferenceClient {
    async fn send_prompt(
        &self,
        backend_url: &str,
        model: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, InferenceError> {
        InferenceClient::send_prompt(self, backend_url, model, prompt, max_tokens).await
    }
}

/// The body is opaque: a JSON string literal is unquoted, anything else is
/// passed through verbatim (trimmed). Empty bodies are an error.
pub fn assistant_text_from_body(body: &str) -> Result<String, InferenceError> {
    let body = body.trim();
    let text = match serde_json::from_str::<String>(body) {
        Ok(s) => s,
        Err(_) => body.to_string(),
    };
    if text.trim().is_empty() {
        return Err(InferenceError::EmptyBody);
    }
    Ok(text)
}
