//! Request presets for the console programs.
//!
//! Each program configures the same `ChatRequest` differently; keeping the
//! settings here lets them be tested without a terminal or a server.

use crate::inference::{ChatError, ChatRequest};

/// System prompt for the interactive chat program.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful coding assistant.";

/// Sampling settings as `(temperature, max_output_tokens)`.
pub const CHAT_SAMPLING: (f32, u32) = (0.7, 1000);
pub const CODEGEN_SAMPLING: (f32, u32) = (0.2, 2000);
pub const STREAM_SAMPLING: (f32, u32) = (0.7, 1000);

/// Prompts run by the code-generation program when none are given.
pub const CODEGEN_EXAMPLES: [&str; 3] = [
    "Write a Python function to calculate fibonacci numbers recursively",
    "Create a Python class for a binary search tree with insert and search methods",
    "Write a Python function to validate email addresses using regex",
];

/// Prompt streamed by the streaming program when none is given.
pub const STREAM_EXAMPLE: &str =
    "Write a detailed explanation of how Python decorators work with examples";

/// Overrides a program may apply on top of its preset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sampling {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Sampling {
    fn resolve(self, preset: (f32, u32)) -> (f32, u32) {
        (
            self.temperature.unwrap_or(preset.0),
            self.max_output_tokens.unwrap_or(preset.1),
        )
    }
}

/// System prompt for generating code in `language`.
pub fn codegen_system_prompt(language: &str) -> String {
    format!("You are an expert {language} developer. Generate clean, well-documented code.")
}

/// One chat turn: fixed system prompt plus the user's message.
pub fn chat_request(
    model: &str,
    message: &str,
    sampling: Sampling,
) -> Result<ChatRequest, ChatError> {
    let (temperature, max_tokens) = sampling.resolve(CHAT_SAMPLING);
    ChatRequest::builder(model)
        .system(CHAT_SYSTEM_PROMPT)
        .user(message)
        .temperature(temperature)
        .max_output_tokens(max_tokens)
        .build()
}

/// A code-generation request for `language`.
pub fn codegen_request(
    model: &str,
    language: &str,
    prompt: &str,
    sampling: Sampling,
) -> Result<ChatRequest, ChatError> {
    let (temperature, max_tokens) = sampling.resolve(CODEGEN_SAMPLING);
    ChatRequest::builder(model)
        .system(codegen_system_prompt(language))
        .user(prompt)
        .temperature(temperature)
        .max_output_tokens(max_tokens)
        .build()
}

/// A streaming request with no system prompt.
pub fn stream_request(
    model: &str,
    prompt: &str,
    sampling: Sampling,
) -> Result<ChatRequest, ChatError> {
    let (temperature, max_tokens) = sampling.resolve(STREAM_SAMPLING);
    ChatRequest::builder(model)
        .user(prompt)
        .temperature(temperature)
        .max_output_tokens(max_tokens)
        .streaming(true)
        .build()
}
