//! Stub chat completion servers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use localchat::{ChatClient, ClientConfig};

pub const CREDENTIAL: &str = "sk-test";

/// How the stub answers `POST /v1/chat/completions`.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Fixed status and JSON body.
    Json { status: u16, body: String },
    /// `text/event-stream` body made of these `data:` payloads.
    Sse(Vec<String>),
    /// Same text for both modes: one JSON message, or one SSE chunk per `pieces` entry.
    Canned { pieces: Vec<String> },
    /// One SSE chunk, then the body never progresses.
    Stall(String),
    /// Sleep before answering with `{"choices":[...]}`.
    Delay(Duration),
}

/// What the stub saw for one request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub authorization: Option<String>,
    pub body: Value,
}

struct StubState {
    reply: Reply,
    requests: Mutex<Vec<Captured>>,
}

pub struct StubServer {
    pub addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubServer {
    pub async fn spawn(reply: Reply) -> Self {
        let state = Arc::new(StubState {
            reply,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .route("/v1/models", get(list_models))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn client(&self) -> ChatClient {
        client_for(&self.endpoint(), |c| c)
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.state.requests.lock().unwrap().clone()
    }
}

/// A client for `endpoint`, with a hook to adjust timeouts.
pub fn client_for(endpoint: &str, adjust: impl FnOnce(ClientConfig) -> ClientConfig) -> ChatClient {
    let config = ClientConfig::new(endpoint, CREDENTIAL).unwrap();
    ChatClient::new(adjust(config)).unwrap()
}

pub fn content_chunk(text: &str) -> String {
    json!({"choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]}).to_string()
}

pub fn finish_chunk(reason: &str) -> String {
    json!({"choices": [{"index": 0, "delta": {}, "finish_reason": reason}]}).to_string()
}

pub fn completion_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-stub",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

fn sse_body(payloads: &[String]) -> String {
    let mut body: String = payloads.iter().map(|p| format!("data: {p}\n\n")).collect();
    body.push_str("data: [DONE]\n\n");
    body
}

fn respond(status: u16, content_type: &str, body: Body) -> Response {
    Response::builder()
        .status(StatusCode::from_u16(status).unwrap())
        .header(header::CONTENT_TYPE, content_type)
        .body(body)
        .unwrap()
}

async fn chat_completions(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let streaming = body["stream"].as_bool().unwrap_or(false);
    state.requests.lock().unwrap().push(Captured {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    match &state.reply {
        Reply::Json { status, body } => respond(*status, "application/json", Body::from(body.clone())),
        Reply::Sse(payloads) => respond(200, "text/event-stream", Body::from(sse_body(payloads))),
        Reply::Canned { pieces } if streaming => {
            let mut payloads: Vec<String> = pieces.iter().map(|p| content_chunk(p)).collect();
            payloads.push(finish_chunk("stop"));
            respond(200, "text/event-stream", Body::from(sse_body(&payloads)))
        }
        Reply::Canned { pieces } => {
            respond(200, "application/json", Body::from(completion_body(&pieces.concat())))
        }
        Reply::Stall(first) => {
            let first = format!("data: {}\n\n", content_chunk(first));
            let body = stream::once(async move { Ok::<_, std::io::Error>(first) })
                .chain(stream::pending());
            respond(200, "text/event-stream", Body::from_stream(body))
        }
        Reply::Delay(delay) => {
            tokio::time::sleep(*delay).await;
            respond(200, "application/json", Body::from(completion_body("late")))
        }
    }
}

async fn list_models() -> Json<Value> {
    Json(json!({"object": "list", "data": [{"id": "test-model", "object": "model"}]}))
}

// ─── Raw TCP stubs ───────────────────────────────────────────────────────────

/// An endpoint on a port nothing listens on.
pub async fn refused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/v1")
}

/// Read one HTTP request (headers plus `Content-Length` body).
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }
}

const SSE_HEAD: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nTransfer-Encoding: chunked\r\n\r\n";

fn http_chunk(data: &str) -> Vec<u8> {
    format!("{:x}\r\n{data}\r\n", data.len()).into_bytes()
}

/// Reads the request, then never writes a response while the socket stays open.
pub async fn spawn_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let mut sink = [0u8; 64];
        while matches!(socket.read(&mut sink).await, Ok(n) if n > 0) {}
    });

    format!("http://{addr}/v1")
}

/// Answers 500 with a body shorter than its `Content-Length`, then closes.
pub async fn spawn_truncated_error() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        let head = b"HTTP/1.1 500 Internal Server Error\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n{\"error\":";
        socket.write_all(head).await.unwrap();
        socket.flush().await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/v1")
}

/// Streams one fragment, then closes the socket without finishing the body.
pub async fn spawn_abrupt_close(first: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let event = format!("data: {}\n\n", content_chunk(first));

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(SSE_HEAD).await.unwrap();
        socket.write_all(&http_chunk(&event)).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/v1")
}

/// Streams fragments until a write fails, then reports the disconnect.
pub async fn spawn_endless_stream() -> (String, oneshot::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        if socket.write_all(SSE_HEAD).await.is_err() {
            let _ = tx.send(());
            return;
        }
        let event = format!("data: {}\n\n", content_chunk("tick "));
        loop {
            if socket.write_all(&http_chunk(&event)).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let _ = tx.send(());
    });

    (format!("http://{addr}/v1"), rx)
}
