//! OpenAI-compatible chat completion client.
//!
//! Sends chat completion requests to a local LLM endpoint and either waits
//! for the full answer or streams it back fragment by fragment. Failures are
//! surfaced to the caller as-is; there is no retry.

use reqwest::Client as HttpClient;
use uuid::Uuid;

use super::config::ClientConfig;
use super::errors::{duration_ms, from_reqwest, ChatError};
use super::streaming::{parse_non_streaming_response, ChatStream};
use super::types::{ChatRequest, ChatResponse};

// ─── ChatClient ──────────────────────────────────────────────────────────────

/// Client for an OpenAI-compatible chat completion endpoint.
///
/// Holds no per-call state. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: HttpClient,
    config: ClientConfig,
}

impl ChatClient {
    /// Create a client from an already-built configuration.
    ///
    /// Does NOT check connectivity; that happens on the first request.
    pub fn new(config: ClientConfig) -> Result<Self, ChatError> {
        let mut builder = HttpClient::builder().connect_timeout(config.connect_timeout());
        if config.is_loopback() {
            // Local servers are never behind the system proxy.
            builder = builder.no_proxy();
        }

        let http = builder
            .build()
            .map_err(|e| ChatError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ─── Chat Completion (non-streaming) ─────────────────────────────────

    /// Send a non-streaming chat completion request.
    ///
    /// Returns the first choice's content once the whole body has arrived.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        if request.streaming() {
            return Err(ChatError::InvalidRequest {
                reason: "complete() requires a request with streaming disabled".into(),
            });
        }

        let url = self.config.completions_url();
        let request_id = Uuid::new_v4().to_string();
        log_request(&url, &request_id, request);

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.config.credential())
            .json(&request.to_wire())
            .timeout(self.config.request_timeout())
            .send()
            .await
            .map_err(|e| from_reqwest(e, &url, self.config.request_timeout()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(request_id = %request_id, status = status.as_u16(), "chat completion rejected");
            return Err(ChatError::Api {
                status: status.as_u16(),
                body: error_body(response, &request_id).await,
            });
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| from_reqwest(e, &url, self.config.request_timeout()))?;

        let parsed = parse_non_streaming_response(&body_text)?;
        tracing::debug!(
            request_id = %request_id,
            content_len = parsed.content.len(),
            finish_reason = ?parsed.finish_reason,
            "chat completion received"
        );
        Ok(parsed)
    }

    // ─── Chat Completion (streaming) ─────────────────────────────────────

    /// Send a streaming chat completion request.
    ///
    /// Connection failures and non-success statuses are returned here; errors
    /// after the first byte of the body are surfaced by the returned stream.
    /// Waiting for the response headers is bounded by the read timeout, the
    /// same limit that applies between body reads.
    pub async fn stream(&self, request: &ChatRequest) -> Result<ChatStream, ChatError> {
        if !request.streaming() {
            return Err(ChatError::InvalidRequest {
                reason: "stream() requires a request with streaming enabled".into(),
            });
        }

        let url = self.config.completions_url();
        let request_id = Uuid::new_v4().to_string();
        log_request(&url, &request_id, request);

        let read_timeout = self.config.read_timeout();
        let send = self
            .http
            .post(&url)
            .bearer_auth(self.config.credential())
            .header("Accept", "text/event-stream")
            .json(&request.to_wire())
            .send();

        // Without a whole-request timeout, reqwest itself can only time out
        // while connecting.
        let response = tokio::time::timeout(read_timeout, send)
            .await
            .map_err(|_| {
                tracing::warn!(request_id = %request_id, "no response headers before read timeout");
                ChatError::Timeout {
                    endpoint: url.clone(),
                    timeout_ms: duration_ms(read_timeout),
                }
            })?
            .map_err(|e| from_reqwest(e, &url, self.config.connect_timeout()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(request_id = %request_id, status = status.as_u16(), "chat stream rejected");
            return Err(ChatError::Api {
                status: status.as_u16(),
                body: error_body(response, &request_id).await,
            });
        }

        Ok(ChatStream::from_response(response, url, read_timeout, request_id))
    }

    // ─── Health Check ────────────────────────────────────────────────────

    /// Check if the endpoint is reachable.
    ///
    /// Lists models, which does not consume inference tokens. Transport
    /// failures count as unhealthy rather than errors.
    pub async fn health_check(&self) -> Result<bool, ChatError> {
        let url = self.config.models_url();

        match self
            .http
            .get(&url)
            .bearer_auth(self.config.credential())
            .timeout(self.config.connect_timeout())
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "health check failed");
                Ok(false)
            }
        }
    }
}

/// Read the body of a rejected response; a failed read leaves it empty.
async fn error_body(response: reqwest::Response, request_id: &str) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "failed to read error body");
            String::new()
        }
    }
}

/// Log request metadata (not the message bodies; they can be large).
fn log_request(url: &str, request_id: &str, request: &ChatRequest) {
    tracing::info!(
        url = %url,
        request_id = %request_id,
        model = %request.model(),
        message_count = request.messages().len(),
        temperature = request.temperature(),
        max_tokens = request.max_output_tokens(),
        stream = request.streaming(),
        "chat request"
    );
}

// ─── Tests ───────────────────────────────────────────────────────────────────
