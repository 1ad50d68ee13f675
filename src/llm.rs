//! LLM port: the message-based chat contract every node talks to, a
//! `reqwest`-backed HTTP implementation, tolerant JSON extraction from
//! model output, and a scripted test double.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LlmError, Result};

/// A single chat message passed to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// `"system"` or `"user"`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Builds a `system` message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Builds a `user` message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from the LLM.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The model's reply text.
    pub content: String,
}

/// Message-based chat contract. Implementations must be `Send + Sync` since
/// the container shares a single instance across concurrently-served
/// requests.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Sends `messages` to the backend at the given `temperature` and
    /// returns its reply.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Llm`] if the request fails, the
    /// backend responds with an error status, or the response cannot be
    /// decoded.
    async fn chat(&self, messages: &[Message], temperature: f32) -> Result<LlmResponse>;
}

/// HTTP implementation of [`Llm`] talking to an OpenAI-compatible chat
/// completions endpoint (e.g. a local Ollama or vLLM server).
pub struct HttpLlmClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl HttpLlmClient {
    /// Builds a client pointed at `base_url` (e.g. `http://localhost:11434`)
    /// using `model` for every request, with a bounded per-call timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl Llm for HttpLlmClient {
    async fn chat(&self, messages: &[Message], temperature: f32) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(LlmError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let truncated: String = body.chars().take(500).collect();
            return Err(LlmError::ErrorResponse {
                status: status.as_u16(),
                body: truncated,
            }
            .into());
        }

        let decoded: ChatCompletionResponse = response.json().await.map_err(|e| LlmError::InvalidResponse {
            reason: e.to_string(),
        })?;

        let content = decoded
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                reason: "no choices in response".to_string(),
            })?;

        Ok(LlmResponse { content })
    }
}

/// Deterministic scripted test double for [`Llm`]. Returns canned answers
/// keyed by the substring found in the last user message, falling back to a
/// default response. Used by unit and integration tests to exercise the
/// graph without network access.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLlm {
    scripts: Vec<(String, String)>,
    default_response: String,
}

impl ScriptedLlm {
    /// Creates a scripted LLM with a single default response for any call.
    #[must_use]
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            scripts: Vec::new(),
            default_response: default_response.into(),
        }
    }

    /// Registers a canned response returned when the last user message
    /// contains `matches`. Scripts are checked in registration order.
    #[must_use]
    pub fn with_script(mut self, matches: impl Into<String>, response: impl Into<String>) -> Self {
        self.scripts.push((matches.into(), response.into()));
        self
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    async fn chat(&self, messages: &[Message], _temperature: f32) -> Result<LlmResponse> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        for (needle, response) in &self.scripts {
            if last_user.contains(needle.as_str()) {
                return Ok(LlmResponse {
                    content: response.clone(),
                });
            }
        }

        Ok(LlmResponse {
            content: self.default_response.clone(),
        })
    }
}

/// Extracts a JSON value from free-form model output.
///
/// Strips leading/trailing whitespace; if the payload begins with a triple
/// backtick fence (optionally tagged `json`), strips the opening fence and
/// any trailing backticks; then attempts to parse as JSON. Never throws:
/// returns `None` on any parse failure.
#[must_use]
pub fn parse_json_response(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();

    let unfenced = if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        let rest = rest.strip_prefix('\n').unwrap_or(rest);
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else {
        trimmed
    };

    serde_json::from_str(unfenced).ok()
}
