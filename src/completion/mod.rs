// Completion module
// Chat message types and the HTTP client for the completion backend


use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::CompletionConfig;
use crate::{AssistError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Prefix of the plain-string error reply the backend may send. Treated as
/// a terminal connection failure, not a retryable format problem.
pub const BACKEND_ERROR_PREFIX: &str = "Error:";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of the conversation sent to the completion backend.
/// Appended to, never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// The reply shapes the backend may produce, resolved once at the boundary.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CompletionResponse {
    /// `{ "choices": [{ "message": { "content": .. } }] }`
    Choices { choices: Vec<Choice> },
    /// `{ "message": { "content": .. } }`
    Message { message: ResponseMessage },
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Normalized backend reply.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionReply {
    /// The assistant message content
    Content(String),
    /// An explicit backend-connection error string; terminal, do not retry
    BackendError(String),
}

/// Blocking client for the completion backend, in the style of the
/// embedding client: one agent with a global timeout, headers from config.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    url: String,
    model: String,
    headers: HashMap<String, String>,
    agent: ureq::Agent,
}

impl CompletionClient {
    #[inline]
    pub fn new(config: &CompletionConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Self {
            url: config.url.clone(),
            model: config.model.clone(),
            headers: config.headers.clone(),
            agent,
        }
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// Send the chat history and normalize whatever comes back. Transport
    /// failures surface as `BackendError` so the session stops immediately
    /// instead of spending retries.
    #[inline]
    pub fn complete(&self, messages: &[ChatMessage]) -> CompletionReply {
        match self.request_completion(messages) {
            Ok(reply) => reply,
            Err(e) => CompletionReply::BackendError(format!("{} {}", BACKEND_ERROR_PREFIX, e)),
        }
    }

    fn request_completion(&self, messages: &[ChatMessage]) -> Result<CompletionReply> {
        debug!(
            "Requesting completion from {} ({} messages)",
            self.url,
            messages.len()
        );

        let request = CompletionRequest {
            model: &self.model,
            messages,
            stream: false,
        };
        let request_json = serde_json::to_string(&request).map_err(|e| {
            AssistError::Format(format!("failed to serialize completion request: {}", e))
        })?;

        let mut builder = self
            .agent
            .post(&self.url)
            .header("Content-Type", "application/json");
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let response_text = builder
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| AssistError::Network(format!("completion request failed: {}", e)))?;

        Ok(parse_completion_reply(&response_text))
    }
}

/// Resolve the backend's reply into a normalized `CompletionReply`. Accepts
/// the `choices` shape, the bare `message` shape, or a plain string starting
/// with `"Error:"`; anything else is surfaced as a format problem in the
/// content so the caller's JSON validation drives the retry loop.
pub(crate) fn parse_completion_reply(body: &str) -> CompletionReply {
    if let Ok(response) = serde_json::from_str::<CompletionResponse>(body) {
        let content = match response {
            CompletionResponse::Choices { mut choices } => {
                if choices.is_empty() {
                    String::new()
                } else {
                    choices.swap_remove(0).message.content
                }
            }
            CompletionResponse::Message { message } => message.content,
        };
        return CompletionReply::Content(content);
    }

    if let Ok(text) = serde_json::from_str::<String>(body) {
        if text.starts_with(BACKEND_ERROR_PREFIX) {
            return CompletionReply::BackendError(text);
        }
        return CompletionReply::Content(text);
    }

    let trimmed = body.trim();
    if trimmed.starts_with(BACKEND_ERROR_PREFIX) {
        return CompletionReply::BackendError(trimmed.to_string());
    }

    CompletionReply::Content(trimmed.to_string())
}
