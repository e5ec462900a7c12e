//! JSON-RPC client over WebSocket with an HTTP POST fallback.
//!
//! DESIGN
//! ======
//! A socket connection is split in two. The write half sits behind an async
//! mutex and is used by `call` / `notify`. The read half is owned by a
//! spawned reader task that routes responses to pending calls by id and hands
//! everything else to the [`ClientHooks`].
//!
//! When the socket cannot be opened and a POST URL is configured, every
//! message becomes one `POST` instead. Server notifications are only seen on
//! the socket transport.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use jsonrpc::{Id, Message, ProtocolError, Request, Response, RpcError};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Pending = Arc<Mutex<HashMap<i64, oneshot::Sender<Result<Value, ClientError>>>>>;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed reply: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("error {}: {}", .0.code, .0.message)]
    Rpc(#[from] RpcError),
    #[error("timed out waiting for a reply")]
    Timeout,
    #[error("connection closed")]
    Closed,
    #[error("no transport configured")]
    NoTransport,
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

// =============================================================================
// CONFIG + HOOKS
// =============================================================================

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub socket_url: Option<String>,
    pub post_url: Option<String>,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Both transports derived from a server base URL such as
    /// `http://127.0.0.1:8197`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] for anything but `http`/`https`.
    pub fn for_base_url(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            socket_url: Some(ws_url(base_url)?),
            post_url: Some(post_url(base_url)?),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }
}

/// Connection lifecycle callbacks. Every method defaults to a no-op.
///
/// Hooks run on the reader task and must not block.
pub trait ClientHooks: Send + Sync {
    fn on_open(&self) {}
    /// Raw text of every inbound frame (or POST reply body).
    fn on_message(&self, _text: &str) {}
    fn on_notification(&self, _notification: &Request) {}
    fn on_close(&self) {}
    fn on_error(&self, _error: &ClientError) {}
}

pub struct NoHooks;

impl ClientHooks for NoHooks {}

// =============================================================================
// URLS
// =============================================================================

/// `http://host` → `ws://host/ws`, `https://host` → `wss://host/ws`.
///
/// # Errors
///
/// Returns [`ClientError::InvalidUrl`] for any other scheme.
pub fn ws_url(base_url: &str) -> Result<String, ClientError> {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/ws"));
    }
    if let Some(rest) = base.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/ws"));
    }
    Err(ClientError::InvalidUrl(base_url.to_owned()))
}

/// `http://host` → `http://host/post`.
///
/// # Errors
///
/// Returns [`ClientError::InvalidUrl`] unless the scheme is `http`/`https`.
pub fn post_url(base_url: &str) -> Result<String, ClientError> {
    let base = base_url.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        return Ok(format!("{base}/post"));
    }
    Err(ClientError::InvalidUrl(base_url.to_owned()))
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct Client {
    connection: Connection,
    next_id: AtomicI64,
    request_timeout: Duration,
}

enum Connection {
    Socket(SocketConnection),
    Post(PostConnection),
}

impl Client {
    /// Open the WebSocket, or fall back to HTTP POST when it fails and a
    /// POST URL is configured.
    ///
    /// # Errors
    ///
    /// Returns the socket error when there is no fallback, and
    /// [`ClientError::NoTransport`] when neither URL is configured.
    pub async fn connect(config: ClientConfig, hooks: Arc<dyn ClientHooks>) -> Result<Self, ClientError> {
        if let Some(url) = config.socket_url.as_deref() {
            match open_socket(url, config.request_timeout).await {
                Ok(stream) => {
                    hooks.on_open();
                    return Ok(Self::new(
                        Connection::Socket(SocketConnection::start(stream, hooks)),
                        config.request_timeout,
                    ));
                }
                Err(error) if config.post_url.is_some() => hooks.on_error(&error),
                Err(error) => return Err(error),
            }
        }

        let Some(url) = config.post_url else {
            return Err(ClientError::NoTransport);
        };
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(url));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        hooks.on_open();
        Ok(Self::new(Connection::Post(PostConnection { http, url, hooks }), config.request_timeout))
    }

    fn new(connection: Connection, request_timeout: Duration) -> Self {
        Self { connection, next_id: AtomicI64::new(1), request_timeout }
    }

    #[must_use]
    pub fn is_websocket(&self) -> bool {
        matches!(self.connection, Connection::Socket(_))
    }

    /// Send a call and wait for its response.
    ///
    /// # Errors
    ///
    /// [`ClientError::Rpc`] carries an error returned by the server. Transport
    /// failures, timeouts and connection loss map to the other variants.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = Request::call(id, method, params);
        match &self.connection {
            Connection::Socket(socket) => socket.call(id, &request, self.request_timeout).await,
            Connection::Post(post) => post.call(&request).await,
        }
    }

    /// Send a notification. No reply is expected.
    ///
    /// # Errors
    ///
    /// Returns an error when the message could not be delivered.
    pub async fn notify(&self, method: &str, params: Value) -> Result<(), ClientError> {
        let request = Request::notification(method, params);
        match &self.connection {
            Connection::Socket(socket) => socket.send(&request).await,
            Connection::Post(post) => post.send(&request).await.map(|_| ()),
        }
    }

    /// Resolves once the socket has closed. Never resolves on the POST
    /// transport, which has no connection to lose.
    pub async fn closed(&self) {
        match &self.connection {
            Connection::Socket(socket) => {
                let mut closed = socket.closed.clone();
                // An error means the reader is gone, which is also closed.
                let _ = closed.wait_for(|closed| *closed).await;
            }
            Connection::Post(_) => std::future::pending::<()>().await,
        }
    }

    /// Start the closing handshake on the socket transport.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::WebSocket`] when the close frame cannot be sent.
    pub async fn close(&self) -> Result<(), ClientError> {
        match &self.connection {
            Connection::Socket(socket) => socket.write(WsMessage::Close(None)).await,
            Connection::Post(_) => Ok(()),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Connection::Socket(socket) = &self.connection {
            socket.reader.abort();
        }
    }
}

async fn open_socket(url: &str, limit: Duration) -> Result<WsStream, ClientError> {
    let (stream, _) = tokio::time::timeout(limit, connect_async(url))
        .await
        .map_err(|_| ClientError::Timeout)?
        .map_err(|error| ClientError::Connect(Box::new(error)))?;
    Ok(stream)
}

// =============================================================================
// WEBSOCKET TRANSPORT
// =============================================================================

struct SocketConnection {
    sink: tokio::sync::Mutex<SplitSink<WsStream, WsMessage>>,
    pending: Pending,
    closed: watch::Receiver<bool>,
    reader: JoinHandle<()>,
}

impl SocketConnection {
    fn start(stream: WsStream, hooks: Arc<dyn ClientHooks>) -> Self {
        let (sink, stream) = stream.split();
        let pending: Pending = Arc::default();
        let (closed_tx, closed) = watch::channel(false);
        let reader = tokio::spawn(read_loop(stream, Arc::clone(&pending), closed_tx, hooks));
        Self { sink: tokio::sync::Mutex::new(sink), pending, closed, reader }
    }

    async fn call(&self, id: i64, request: &Request, limit: Duration) -> Result<Value, ClientError> {
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);

        if let Err(error) = self.send(request).await {
            lock(&self.pending).remove(&id);
            return Err(error);
        }

        match tokio::time::timeout(limit, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => {
                lock(&self.pending).remove(&id);
                Err(ClientError::Timeout)
            }
        }
    }

    async fn send(&self, request: &Request) -> Result<(), ClientError> {
        if *self.closed.borrow() {
            return Err(ClientError::Closed);
        }
        self.write(WsMessage::Text(request.to_json().to_string().into()))
            .await
    }

    async fn write(&self, message: WsMessage) -> Result<(), ClientError> {
        self.sink
            .lock()
            .await
            .send(message)
            .await
            .map_err(|error| ClientError::WebSocket(Box::new(error)))
    }
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    pending: Pending,
    closed: watch::Sender<bool>,
    hooks: Arc<dyn ClientHooks>,
) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                hooks.on_message(&text);
                route_inbound(&text, &pending, hooks.as_ref());
            }
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => {}
            Err(error) => {
                hooks.on_error(&ClientError::WebSocket(Box::new(error)));
                break;
            }
        }
    }

    closed.send_replace(true);
    for (_, waiter) in lock(&pending).drain() {
        let _ = waiter.send(Err(ClientError::Closed));
    }
    hooks.on_close();
}

/// Route one inbound frame: responses to their waiting calls, notifications
/// to the hooks. Batches are unpacked.
fn route_inbound(text: &str, pending: &Pending, hooks: &dyn ClientHooks) {
    let json: Value = match serde_json::from_str(text) {
        Ok(json) => json,
        Err(error) => {
            hooks.on_error(&ClientError::Json(error));
            return;
        }
    };
    let items = match json {
        Value::Array(items) => items,
        other => vec![other],
    };

    for item in &items {
        match Message::from_json(item) {
            Ok(Message::Response(response)) => deliver(response, pending, hooks),
            Ok(Message::Notification(notification)) => hooks.on_notification(&notification),
            Err(error) => hooks.on_error(&ClientError::Protocol(error)),
        }
    }
}

fn deliver(response: Response, pending: &Pending, hooks: &dyn ClientHooks) {
    let waiter = match &response.id {
        Some(Id::Number(id)) => lock(pending).remove(id),
        _ => None,
    };
    match waiter {
        Some(waiter) => {
            let _ = waiter.send(response.outcome.map_err(ClientError::Rpc));
        }
        // Errors the server could not tie to a call (parse errors).
        None => {
            if let Err(error) = response.outcome {
                hooks.on_error(&ClientError::Rpc(error));
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// HTTP POST TRANSPORT
// =============================================================================

struct PostConnection {
    http: reqwest::Client,
    url: String,
    hooks: Arc<dyn ClientHooks>,
}

impl PostConnection {
    async fn call(&self, request: &Request) -> Result<Value, ClientError> {
        let Some(body) = self.send(request).await? else {
            return Err(ClientError::Protocol(ProtocolError::MissingOutcome));
        };
        let response = Response::from_json(&body)?;
        response.outcome.map_err(ClientError::Rpc)
    }

    /// POST one message. `None` when the server answered `204 No Content`.
    async fn send(&self, request: &Request) -> Result<Option<Value>, ClientError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http_error)?;
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response.text().await.map_err(http_error)?;
        self.hooks.on_message(&text);
        Ok(Some(serde_json::from_str(&text)?))
    }
}

fn http_error(error: reqwest::Error) -> ClientError {
    if error.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Http(error)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
