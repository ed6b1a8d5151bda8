//! WebSocket Transport
//!
//! Connects to the backend's `/ws/streams/{camera_id}?token=...` endpoint
//! with tokio-tungstenite.

use async_trait::async_trait;
use futures_util::StreamExt;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::error::{StreamError, StreamResult};
use super::transport::{Credential, StreamConnection, StreamTransport, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default time allowed for the WebSocket handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Live-stream transport over WebSocket
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    base_url: String,
    connect_timeout: Duration,
}

impl WebSocketTransport {
    /// Create a transport for a backend at `base_url` (e.g. "ws://localhost:8000")
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Full stream URL for a camera
    pub fn stream_url(&self, camera_id: i64, credential: &Credential) -> String {
        format!(
            "{}/ws/streams/{}?token={}",
            self.base_url,
            camera_id,
            urlencoding::encode(credential.token())
        )
    }
}

/// Derive the WebSocket base URL from an HTTP API base URL
pub fn ws_url_from_http(api_url: &str) -> String {
    api_url
        .trim_end_matches('/')
        .replacen("https://", "wss://", 1)
        .replacen("http://", "ws://", 1)
}

#[async_trait]
impl StreamTransport for WebSocketTransport {
    async fn connect(
        &self,
        camera_id: i64,
        credential: &Credential,
    ) -> StreamResult<Box<dyn StreamConnection>> {
        let url = self.stream_url(camera_id, credential);
        tracing::debug!(camera_id, base_url = %self.base_url, "Opening stream socket");

        let (stream, _response) = tokio::time::timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| StreamError::Transport("connection timed out".to_string()))?
            .map_err(handshake_error)?;

        Ok(Box::new(WebSocketConnection {
            stream,
            finished: false,
            close_timeout: self.connect_timeout,
        }))
    }
}

/// A rejected upgrade means the token is no good; retrying will not help
fn handshake_error(err: WsError) -> StreamError {
    match &err {
        WsError::Http(response) if matches!(response.status().as_u16(), 401 | 403) => {
            StreamError::AuthMissing
        }
        _ => StreamError::Transport(err.to_string()),
    }
}

/// Await a socket close for at most `limit`
///
/// Returns false if the close stalled; the caller then drops the socket.
async fn close_within<F, E>(limit: Duration, close: F) -> bool
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(limit, close).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "Stream socket close failed");
            true
        }
        Err(_) => {
            tracing::warn!(
                timeout_ms = limit.as_millis() as u64,
                "Stream socket close timed out; dropping it"
            );
            false
        }
    }
}

/// An open stream socket
struct WebSocketConnection {
    stream: WsStream,
    finished: bool,
    close_timeout: Duration,
}

#[async_trait]
impl StreamConnection for WebSocketConnection {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.finished {
            return None;
        }

        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(TransportEvent::Error(e.to_string()));
                }
                None => {
                    self.finished = true;
                    return None;
                }
            };

            match message {
                Message::Text(text) => return Some(TransportEvent::Text(text)),
                Message::Binary(data) => return Some(TransportEvent::Binary(data)),
                Message::Close(frame) => {
                    self.finished = true;
                    let reason = frame.map(|f| format!("{} {}", u16::from(f.code), f.reason));
                    return Some(TransportEvent::Closed {
                        clean: true,
                        reason,
                    });
                }
                // tungstenite answers pings itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    async fn close(&mut self) {
        // Also flushes the reply to a server-initiated close
        self.finished = true;
        close_within(self.close_timeout, self.stream.close(None)).await;
    }
}
