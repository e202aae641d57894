//! Ollama chat client used for both grounded RAG answers and direct model calls.
//!
//! Requests go to the runtime's `/api/chat` endpoint in non-streaming mode. A single
//! JSON document comes back; its `message.content` field carries the answer text.
//! When the field is structurally absent on an otherwise successful call the answer
//! defaults to an empty string; malformed payloads and transport failures surface as
//! errors to the orchestrator, which aborts the current query only.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// Local model calls can take minutes on long prompts.
const CHAT_TIMEOUT: Duration = Duration::from_secs(600);

/// Errors surfaced while calling the chat model.
#[derive(Debug, Error)]
pub enum ChatClientError {
    /// Runtime was unreachable or the request timed out.
    #[error("Chat provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Runtime returned an error response.
    #[error("Chat request failed: {0}")]
    GenerationFailed(String),
    /// Runtime response could not be parsed.
    #[error("Malformed chat response: {0}")]
    InvalidResponse(String),
}

/// Role attached to a single chat turn.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instruction turn.
    System,
    /// User message turn.
    User,
}

/// One role-tagged message in a chat exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the speaker.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Build a user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Interface implemented by chat backends.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send an ordered message sequence to the named model and return the reply text.
    async fn chat(&self, model: &str, messages: &[ChatMessage])
    -> Result<String, ChatClientError>;
}

/// Chat adapter backed by the Ollama `/api/chat` endpoint.
pub struct OllamaChatClient {
    http: Client,
    base_url: String,
}

impl OllamaChatClient {
    /// Construct a client targeting the given Ollama base URL.
    pub fn new(base_url: String) -> Self {
        let http = Client::builder()
            .user_agent("ragtag/chat")
            .timeout(CHAT_TIMEOUT)
            .build()
            .expect("Failed to construct reqwest::Client for chat");
        Self { http, base_url }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: ChatResponseMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl ChatClient for OllamaChatClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ChatClientError> {
        let payload = json!({
            "model": model,
            "messages": messages,
            "stream": false,
        });

        tracing::debug!(model, turns = messages.len(), "Sending chat request");

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                ChatClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|error| {
            ChatClientError::InvalidResponse(format!("failed to decode chat response: {error}"))
        })?;

        Ok(body.message.content.trim().to_string())
    }
}

/// Build the chat client for the current configuration.
pub fn get_chat_client() -> Arc<dyn ChatClient> {
    let config = crate::config::get_config();
    Arc::new(OllamaChatClient::new(config.ollama_url.clone()))
}
