//! OpenAI-compatible chat-completion client.

use std::time::Duration;

use async_trait::async_trait;
use emberfall_core::error::EngineError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Default completions endpoint base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model name.
pub const DEFAULT_MODEL: &str = "llama3.1:8b-instruct-q8_0";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// One completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt framing the stage's task.
    pub system: String,
    /// User prompt carrying the round context.
    pub user: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Black-box chat-completion transport. Every call is fallible and bounded
/// by the request timeout.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one prompt and returns the raw completion text.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Transport` on timeout or HTTP failure.
    async fn complete(&self, request: CompletionRequest) -> Result<String, EngineError>;
}

/// Client for an OpenAI-compatible chat-completions API.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OpenAiCompatClient {
    /// Creates a client for the given endpoint and model.
    #[must_use]
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: model.to_owned(),
        }
    }

    /// Creates a client from `COMPLETIONS_BASE_URL` and `COMPLETIONS_MODEL`,
    /// falling back to defaults when unset.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("COMPLETIONS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let model =
            std::env::var("COMPLETIONS_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
        Self::new(&base_url, &model)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, EngineError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system,
                },
                ChatMessage {
                    role: "user",
                    content: request.user,
                },
            ],
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::Transport(format!(
                "completions endpoint returned {status}: {text}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Transport(format!("malformed completion envelope: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EngineError::Transport("completion carried no content".to_owned()))
    }
}
