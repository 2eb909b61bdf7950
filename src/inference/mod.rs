//! Chat client for OpenAI-compatible completion endpoints.
//!
//! This module handles all communication with the local model endpoint:
//! - Non-streaming chat completions
//! - Streaming chat completions as a pull-based `ChatStream`
//! - SSE stream decoding
//! - Connection configuration injected by the caller
//!
//! The client speaks the OpenAI Chat Completions API, so any server that
//! implements it (LiteLLM, Ollama, llama.cpp, vLLM) can sit behind it.

pub mod client;
pub mod config;
pub mod errors;
pub mod streaming;
pub mod types;

// Re-exports for convenience
pub use client::ChatClient;
pub use config::ClientConfig;
pub use errors::ChatError;
pub use streaming::{ChatStream, StreamState};
pub use types::{ChatRequest, ChatRequestBuilder, ChatResponse, Message, Role, StreamFragment};
