//! Chat client error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Structured logging
//! is the caller's responsibility; these types carry the context needed to build
//! meaningful log entries.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while talking to the chat completion endpoint.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The endpoint could not be reached, or the connection broke mid-response.
    #[error("transport error for {endpoint}: {reason}")]
    Transport {
        endpoint: String,
        reason: String,
    },

    /// Connecting, or waiting for the next bytes of a response, took too long.
    #[error("timed out after {timeout_ms}ms waiting on {endpoint}")]
    Timeout {
        endpoint: String,
        timeout_ms: u64,
    },

    /// Non-2xx HTTP response from the endpoint.
    #[error("HTTP {status}: {body}")]
    Api {
        status: u16,
        body: String,
    },

    /// The response body did not match the chat completion contract.
    #[error("malformed response: {reason}")]
    MalformedResponse {
        reason: String,
    },

    /// The request was rejected before any network I/O.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        reason: String,
    },

    /// Client configuration could not be turned into a working HTTP client.
    #[error("config error: {reason}")]
    Config {
        reason: String,
    },
}

impl ChatError {
    /// Whether this error belongs to the transport family (connectivity or timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, ChatError::Transport { .. } | ChatError::Timeout { .. })
    }

    /// HTTP status code, if this is an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `error.message` field of an OpenAI-style error body.
    ///
    /// Falls back to the raw body when it is not JSON or has no message.
    pub fn api_message(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct ErrorEnvelope {
            error: ErrorDetail,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            message: Option<String>,
        }

        let ChatError::Api { body, .. } = self else {
            return None;
        };

        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|env| env.error.message)
            .unwrap_or_else(|| body.clone());
        Some(message)
    }
}

/// Whole milliseconds in `timeout`, saturating at `u64::MAX`.
pub(crate) fn duration_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Map a `reqwest` send/read error onto the transport family.
pub(crate) fn from_reqwest(err: reqwest::Error, endpoint: &str, timeout: Duration) -> ChatError {
    if err.is_timeout() {
        ChatError::Timeout {
            endpoint: endpoint.to_string(),
            timeout_ms: duration_ms(timeout),
        }
    } else {
        ChatError::Transport {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    }
}
