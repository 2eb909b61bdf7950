//! Client connection configuration.
//!
//! `ClientConfig` is built once by the calling program and moved into
//! [`ChatClient`](super::ChatClient). The client itself never reads process
//! environment; [`ClientConfig::from_env`] is the only place that does.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use super::errors::ChatError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Environment variable holding the credential.
pub const CREDENTIAL_ENV: &str = "LITELLM_MASTER_KEY";

/// Environment variable holding the endpoint base URL.
pub const ENDPOINT_ENV: &str = "API_BASE";

/// Credential used when `LITELLM_MASTER_KEY` is unset.
pub const DEFAULT_CREDENTIAL: &str = "sk-1234";

/// Endpoint used when `API_BASE` is unset.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/v1";

/// TCP connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request timeout for non-streaming calls.
///
/// Local models can take a while to produce a full answer once the prompt
/// is long, so this is generous.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest gap allowed between two reads of a streaming body.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

// ─── ClientConfig ────────────────────────────────────────────────────────────

/// Connection parameters for a chat completion endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    endpoint: String,
    credential: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    read_timeout: Duration,
}

impl ClientConfig {
    /// Create a config for `endpoint` authenticated with `credential`.
    ///
    /// The endpoint must be an absolute `http`/`https` URL. A trailing `/`
    /// is stripped so paths can be appended uniformly.
    pub fn new(
        endpoint: impl Into<String>,
        credential: impl Into<String>,
    ) -> Result<Self, ChatError> {
        let endpoint = endpoint.into();
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();

        let url = reqwest::Url::parse(&endpoint).map_err(|e| ChatError::Config {
            reason: format!("invalid endpoint '{endpoint}': {e}"),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChatError::Config {
                reason: format!("endpoint '{endpoint}' must use http or https"),
            });
        }

        Ok(Self {
            endpoint,
            credential: credential.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }

    /// Build a config from `API_BASE` and `LITELLM_MASTER_KEY`, with defaults.
    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Unset or blank values fall back to [`DEFAULT_ENDPOINT`] and
    /// [`DEFAULT_CREDENTIAL`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChatError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let endpoint = non_blank(ENDPOINT_ENV).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let credential =
            non_blank(CREDENTIAL_ENV).unwrap_or_else(|| DEFAULT_CREDENTIAL.to_string());

        Self::new(endpoint, credential)
    }

    /// Bound the time spent establishing a TCP connection.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Bound the total time of a non-streaming call.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Bound the wait between two reads of a streaming response.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// URL of the chat completions route.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    /// Whether the endpoint points at this machine.
    pub fn is_loopback(&self) -> bool {
        let Ok(url) = reqwest::Url::parse(&self.endpoint) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');
        host.eq_ignore_ascii_case("localhost")
            || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
    }

    /// URL of the model listing route, used for health checks.
    pub fn models_url(&self) -> String {
        format!("{}/models", self.endpoint)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
