//! # Optiya Console
//!
//! Operator console for an ANPR (automatic number plate recognition)
//! backend: live annotated camera streams with plate detections, plus the
//! camera, plate log, watchlist and dashboard screens over REST.
//!
//! ## Features
//!
//! - **Live streams**: One WebSocket session per selected camera with
//!   bounded exponential reconnect and generation-guarded camera switching
//! - **Detections**: Rolling window of the most recent unique plates, with
//!   watchlist alerts
//! - **REST client**: Typed access to cameras, logs, watchlist, dashboard
//! - **Export**: Plate logs to CSV, JSON or NDJSON
//!
//! ## Modules
//!
//! - [`stream`]: Stream session state machine, transport and wire format
//! - [`viewer`]: Single-camera live viewer built on [`stream`]
//! - [`api`]: Backend REST client
//! - [`credentials`]: On-disk token store
//! - [`export`]: Plate log export
//! - [`config`]: TOML configuration with environment overrides
//! - [`logging`]: tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use optiya_console::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!
//!     // Log in and keep the token
//!     let api = ApiClient::new(&config.api.url)?;
//!     let token = api.login("ops@example.com", "secret").await?;
//!
//!     // Watch camera 1
//!     let transport = Arc::new(WebSocketTransport::new(&config.api.ws_url()));
//!     let mut viewer = LiveViewer::new(transport, config.stream.session_options());
//!     viewer
//!         .select_camera(1, Some(Credential::new(token.access_token)))
//!         .await?;
//!
//!     while let Some(event) = viewer.next_event().await {
//!         println!("{} | {} plates", viewer.state().status_label, viewer.state().detections.len());
//!         if let SessionEventKind::WatchlistAlert(hit) = event.kind {
//!             println!("WATCHLIST ALERT: {}", hit.plate_text);
//!         }
//!     }
//!
//!     viewer.close().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod export;
pub mod logging;
pub mod stream;
pub mod viewer;

// Re-export top-level types for convenience
pub use stream::{
    Credential, DetectionEvent, FrameEvent, Generations, ReconnectPolicy, SessionEvent,
    SessionEventKind, SessionHandle, SessionOptions, SessionStatus, StreamError, StreamResult,
    StreamSession, StreamTransport, WebSocketTransport,
};

pub use viewer::{LiveViewer, ViewerState};

pub use api::{ApiClient, ApiError, ApiResult, LogQuery};

pub use config::{Config, ConfigError, LoggingConfig, StreamConfig};

pub use credentials::{CredentialError, CredentialStore, StoredCredential};

pub use export::{ExportError, ExportFormat};
