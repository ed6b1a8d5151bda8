//! Live Stream Sessions
//!
//! Everything needed to watch one camera's annotated live feed:
//!
//! - **transport**: The `StreamTransport` seam and its event type
//! - **websocket**: tokio-tungstenite transport for `/ws/streams/{id}`
//! - **messages**: Wire message decoding and subscriber events
//! - **backoff**: Exponential reconnect policy
//! - **window**: Sliding window of recent plate detections
//! - **state**: Pure session state machine
//! - **session**: Task driver with generation guard and cancellable timer
//! - **error**: Error types
//!
//! # Lifecycle
//!
//! ```text
//!   Idle → Connecting → Live ⇄ Error (backend {error})
//!               ↑         │
//!               │   unclean close
//!               │         ↓
//!               └─ Disconnected ── retries spent ──→ Error (terminal)
//!
//!   clean close / explicit close ──→ Terminated
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use optiya_console::stream::*;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(WebSocketTransport::new("ws://localhost:8000"));
//!     let (tx, mut rx) = mpsc::unbounded_channel();
//!
//!     let handle = StreamSession::open(
//!         1,
//!         Some(Credential::new("token")),
//!         transport,
//!         SessionOptions::default(),
//!         Generations::new(),
//!         tx,
//!     )?;
//!
//!     while let Some(event) = rx.recv().await {
//!         println!("{:?}", event.kind);
//!     }
//!
//!     handle.close().await;
//!     Ok(())
//! }
//! ```

pub mod backoff;
pub mod error;
pub mod messages;
pub mod session;
pub mod state;
pub mod transport;
pub mod websocket;
pub mod window;

#[cfg(test)]
pub(crate) mod mock;

pub use backoff::ReconnectPolicy;
pub use error::{StreamError, StreamResult};
pub use messages::{
    decode_message, BoundingBox, DecodedMessage, DetectionEvent, FrameEvent, SessionEvent,
    SessionEventKind,
};
pub use session::{EventSender, Generations, SessionHandle, SessionOptions, StreamSession};
pub use state::{CloseKind, CloseOutcome, Session, SessionStatus};
pub use transport::{Credential, StreamConnection, StreamTransport, TransportEvent};
pub use websocket::{ws_url_from_http, WebSocketTransport};
pub use window::{DetectionWindow, DEFAULT_WINDOW_CAPACITY};
