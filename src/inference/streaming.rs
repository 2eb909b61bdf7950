//! SSE streaming response decoding for OpenAI-compatible chat completions.
//!
//! Reads the response body as a byte stream, splits on SSE boundaries
//! (`data: …\n\n`), parses each event as a JSON chunk and hands the
//! `choices[0].delta.content` text to the consumer as a [`StreamFragment`].
//! Nothing is read from the socket unless the consumer polls.

use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};

use super::errors::{duration_ms, ChatError};
use super::types::{ChatCompletionChunk, ChatCompletionResponse, ChatResponse, StreamFragment};

// ─── ChatStream ──────────────────────────────────────────────────────────────

/// Lifecycle of a single [`ChatStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No fragment has been pulled yet.
    NotStarted,
    /// At least one fragment delivered, end not reached.
    Streaming,
    /// The endpoint signalled end of stream.
    Completed,
    /// An error was surfaced; no further fragments will be produced.
    Errored,
}

/// A lazily pulled sequence of completion fragments.
///
/// Owns the underlying HTTP response. The connection is released as soon as
/// the stream completes, errors, or is dropped. Once completed or errored the
/// stream is fused and keeps returning `None`.
pub struct ChatStream {
    inner: Pin<Box<dyn Stream<Item = Result<Decoded, ChatError>> + Send>>,
    state: StreamState,
    finish_reason: Option<String>,
    fragments: usize,
    request_id: String,
}

impl ChatStream {
    /// Wrap a successful streaming HTTP response.
    pub(crate) fn from_response(
        response: reqwest::Response,
        endpoint: String,
        read_timeout: Duration,
        request_id: String,
    ) -> Self {
        Self::from_byte_stream(response.bytes_stream(), endpoint, read_timeout, request_id)
    }

    /// Wrap any byte stream carrying an SSE body.
    pub(crate) fn from_byte_stream<S, B, E>(
        byte_stream: S,
        endpoint: String,
        read_timeout: Duration,
        request_id: String,
    ) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: Display + Send + 'static,
    {
        Self {
            inner: Box::pin(decode_sse(byte_stream, endpoint, read_timeout)),
            state: StreamState::NotStarted,
            finish_reason: None,
            fragments: 0,
            request_id,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The last finish reason reported by the endpoint, if any.
    pub fn finish_reason(&self) -> Option<&str> {
        self.finish_reason.as_deref()
    }

    /// Drain the stream and concatenate every fragment's text.
    ///
    /// On error the text gathered so far is discarded; pull fragments
    /// individually to keep partial output.
    pub async fn collect_text(mut self) -> Result<String, ChatError> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?.text);
        }
        Ok(text)
    }

    fn is_finished(&self) -> bool {
        matches!(self.state, StreamState::Completed | StreamState::Errored)
    }
}

impl Stream for ChatStream {
    type Item = Result<StreamFragment, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.is_finished() {
            return Poll::Ready(None);
        }

        loop {
            match this.inner.as_mut().poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Ok(decoded))) => {
                    if decoded.finish_reason.is_some() {
                        this.finish_reason = decoded.finish_reason;
                    }
                    if let Some(fragment) = decoded.fragment {
                        this.state = StreamState::Streaming;
                        this.fragments += 1;
                        tracing::trace!(
                            request_id = %this.request_id,
                            len = fragment.text.len(),
                            "stream fragment"
                        );
                        return Poll::Ready(Some(Ok(fragment)));
                    }
                    // Finish-only chunk, keep pulling.
                }
                Poll::Ready(Some(Err(e))) => {
                    this.state = StreamState::Errored;
                    tracing::warn!(
                        request_id = %this.request_id,
                        fragments = this.fragments,
                        error = %e,
                        "stream failed"
                    );
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.state = StreamState::Completed;
                    tracing::debug!(
                        request_id = %this.request_id,
                        fragments = this.fragments,
                        finish_reason = ?this.finish_reason,
                        "stream completed"
                    );
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        if !self.is_finished() {
            tracing::debug!(
                request_id = %self.request_id,
                fragments = self.fragments,
                "stream dropped before completion, closing connection"
            );
        }
    }
}

// ─── SSE decoding ────────────────────────────────────────────────────────────

/// One decoded SSE event that carried something worth surfacing.
#[derive(Debug)]
pub(crate) struct Decoded {
    fragment: Option<StreamFragment>,
    finish_reason: Option<String>,
}

/// Turn raw SSE bytes into decoded chunks.
///
/// The returned stream ends after `[DONE]`, and yields at most one error,
/// after which the byte stream is dropped.
fn decode_sse<S, B, E>(
    byte_stream: S,
    endpoint: String,
    read_timeout: Duration,
) -> impl Stream<Item = Result<Decoded, ChatError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let byte_stream = Box::pin(byte_stream);
    let decoder = SseDecoder::new(endpoint);

    stream::unfold(
        Some((byte_stream, decoder)),
        move |state| async move {
            let (mut byte_stream, mut decoder) = state?;
            loop {
                if let Some(event) = decoder.next_event() {
                    match decoder.process_event(&event) {
                        Ok(Some(decoded)) => {
                            return Some((Ok(decoded), Some((byte_stream, decoder))));
                        }
                        Ok(None) if decoder.done => return None,
                        Ok(None) => continue, // keep-alive or empty delta
                        Err(e) => return Some((Err(e), None)),
                    }
                }

                if decoder.eof {
                    if decoder.saw_finish {
                        return None;
                    }
                    let err = ChatError::Transport {
                        endpoint: decoder.endpoint.clone(),
                        reason: "connection closed before end of stream".into(),
                    };
                    return Some((Err(err), None));
                }

                match tokio::time::timeout(read_timeout, byte_stream.next()).await {
                    Err(_) => {
                        let err = ChatError::Timeout {
                            endpoint: decoder.endpoint.clone(),
                            timeout_ms: duration_ms(read_timeout),
                        };
                        return Some((Err(err), None));
                    }
                    Ok(Some(Ok(bytes))) => decoder.push(bytes.as_ref()),
                    Ok(Some(Err(e))) => {
                        let err = ChatError::Transport {
                            endpoint: decoder.endpoint.clone(),
                            reason: format!("stream read error: {e}"),
                        };
                        return Some((Err(err), None));
                    }
                    Ok(None) => decoder.finish_input(),
                }
            }
        },
    )
}

/// Buffering state for splitting a byte stream into SSE events.
///
/// Line endings are normalised to `\n` as bytes arrive, so `\r\n`, `\r`
/// and mixes of them all terminate lines.
struct SseDecoder {
    endpoint: String,
    buffer: Vec<u8>,
    /// The last byte pushed was a `\r`; a following `\n` belongs to it.
    pending_cr: bool,
    /// `[DONE]` received.
    done: bool,
    /// The byte stream ended.
    eof: bool,
    /// Some chunk reported a `finish_reason`.
    saw_finish: bool,
}

impl SseDecoder {
    fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            buffer: Vec::new(),
            pending_cr: false,
            done: false,
            eof: false,
            saw_finish: false,
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        self.buffer.reserve(bytes.len());
        for &b in bytes {
            if std::mem::take(&mut self.pending_cr) && b == b'\n' {
                continue;
            }
            match b {
                b'\r' => {
                    self.pending_cr = true;
                    self.buffer.push(b'\n');
                }
                _ => self.buffer.push(b),
            }
        }
    }

    /// Mark end of input; a trailing event without a blank line still counts.
    fn finish_input(&mut self) {
        self.eof = true;
        self.pending_cr = false;
        if self.buffer.iter().any(|b| !b.is_ascii_whitespace()) {
            self.buffer.extend_from_slice(b"\n\n");
        } else {
            self.buffer.clear();
        }
    }

    /// Pop the next complete event off the buffer.
    fn next_event(&mut self) -> Option<String> {
        let end = find_event_boundary(&self.buffer)?;
        let event = String::from_utf8_lossy(&self.buffer[..end]).into_owned();
        self.buffer.drain(..end + 2);
        Some(event)
    }

    /// Process a single SSE event (may contain multiple `data:` lines).
    fn process_event(&mut self, event: &str) -> Result<Option<Decoded>, ChatError> {
        let mut data_lines: Vec<&str> = Vec::new();

        for line in event.lines() {
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.strip_prefix(' ').unwrap_or(data);
                if data.trim() == "[DONE]" {
                    self.done = true;
                    return Ok(None);
                }
                data_lines.push(data);
            }
            // Comments (`:`), `event:` and `id:` lines carry nothing we use.
        }

        let data = data_lines.join("\n");
        if data.trim().is_empty() {
            return Ok(None);
        }

        let chunk: ChatCompletionChunk =
            serde_json::from_str(&data).map_err(|e| ChatError::MalformedResponse {
                reason: format!("failed to parse SSE chunk: {e} (data: {data})"),
            })?;

        self.process_chunk(chunk)
    }

    fn process_chunk(
        &mut self,
        chunk: ChatCompletionChunk,
    ) -> Result<Option<Decoded>, ChatError> {
        let choice = chunk
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::MalformedResponse {
                reason: "stream chunk has empty choices array".into(),
            })?;

        let finish_reason = choice.finish_reason;
        if finish_reason.is_some() {
            self.saw_finish = true;
        }

        let fragment = choice
            .delta
            .content
            .filter(|text| !text.is_empty())
            .map(|text| StreamFragment {
                text,
                is_final: finish_reason.is_some(),
            });

        if fragment.is_none() && finish_reason.is_none() {
            return Ok(None);
        }
        Ok(Some(Decoded {
            fragment,
            finish_reason,
        }))
    }
}

/// Offset of the first blank-line event terminator in a normalised buffer.
fn find_event_boundary(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

// ─── Non-streaming ───────────────────────────────────────────────────────────

/// Parse a non-streaming response body.
pub(crate) fn parse_non_streaming_response(body: &str) -> Result<ChatResponse, ChatError> {
    let resp: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| ChatError::MalformedResponse {
            reason: format!("failed to parse response: {e}"),
        })?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ChatError::MalformedResponse {
            reason: "empty choices array".into(),
        })?;

    Ok(ChatResponse {
        content: choice.message.content.unwrap_or_default(),
        finish_reason: choice.finish_reason,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
