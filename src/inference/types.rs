//! Request and response types for the chat client.
//!
//! The public types (`ChatRequest`, `ChatResponse`, `StreamFragment`) are
//! what callers build and consume. The wire types below them mirror the
//! OpenAI Chat Completions JSON and stay crate-private.

use serde::{Deserialize, Serialize};

use super::errors::ChatError;

// ─── Messages ────────────────────────────────────────────────────────────────

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ─── ChatRequest ─────────────────────────────────────────────────────────────

/// Sampling temperature used when the builder is not given one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Output length cap used when the builder is not given one.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1000;

/// Inclusive upper bound accepted for `temperature`.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// A validated chat completion request.
///
/// Only constructible through [`ChatRequest::builder`], so every value in
/// circulation satisfies the invariants checked in
/// [`ChatRequestBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_output_tokens: u32,
    streaming: bool,
}

impl ChatRequest {
    /// Start building a request for `model`.
    pub fn builder(model: impl Into<String>) -> ChatRequestBuilder {
        ChatRequestBuilder {
            model: model.into(),
            messages: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            streaming: false,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn streaming(&self) -> bool {
        self.streaming
    }

    /// The same request with `streaming` flipped to `enabled`.
    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming = enabled;
        self
    }

    /// Borrow this request as the JSON body sent to the endpoint.
    pub(crate) fn to_wire(&self) -> ChatCompletionRequest<'_> {
        ChatCompletionRequest {
            model: &self.model,
            messages: &self.messages,
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
            stream: self.streaming,
        }
    }
}

/// Builder for [`ChatRequest`].
#[derive(Debug, Clone)]
pub struct ChatRequestBuilder {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_output_tokens: u32,
    streaming: bool,
}

impl ChatRequestBuilder {
    /// Append a message; order is preserved as submitted.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn system(self, content: impl Into<String>) -> Self {
        self.message(Message::system(content))
    }

    pub fn user(self, content: impl Into<String>) -> Self {
        self.message(Message::user(content))
    }

    pub fn assistant(self, content: impl Into<String>) -> Self {
        self.message(Message::assistant(content))
    }

    /// Sampling temperature, `0.0..=2.0`.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Upper bound on generated tokens, must be positive.
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Validate and produce the request.
    pub fn build(self) -> Result<ChatRequest, ChatError> {
        let invalid = |reason: String| ChatError::InvalidRequest { reason };

        if self.model.trim().is_empty() {
            return Err(invalid("model must not be empty".into()));
        }
        if self.messages.is_empty() {
            return Err(invalid("messages must not be empty".into()));
        }
        if !self.messages.iter().any(|m| m.role == Role::User) {
            return Err(invalid("messages must contain at least one user message".into()));
        }
        if !self.temperature.is_finite()
            || !(0.0..=MAX_TEMPERATURE).contains(&self.temperature)
        {
            return Err(invalid(format!(
                "temperature {} outside 0.0..={MAX_TEMPERATURE}",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(invalid("max_output_tokens must be positive".into()));
        }

        Ok(ChatRequest {
            model: self.model,
            messages: self.messages,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            streaming: self.streaming,
        })
    }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Result of a non-streaming completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    /// Text of the first choice. Empty when the model returned `null` content.
    pub content: String,
    /// Why the model stopped: `"stop"`, `"length"`, or `None` if unreported.
    pub finish_reason: Option<String>,
}

/// An incremental piece of a streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFragment {
    pub text: String,
    /// Set when the chunk carrying this text also reported a finish reason.
    pub is_final: bool,
}

// ─── Wire Types ──────────────────────────────────────────────────────────────

/// Request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

/// Non-streaming response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseChoice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Raw SSE chunk from the streaming endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionChunk {
    pub choices: Vec<ChunkChoice>,
}

/// A single choice within a streaming chunk.
#[derive(Debug, Deserialize)]
pub(crate) struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The delta (incremental update) within a chunk choice.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
