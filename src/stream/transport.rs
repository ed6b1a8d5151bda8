//! Stream Transport
//!
//! The seam between a session and the network. A transport opens one
//! connection per call; the connection yields a single ordered stream of
//! tagged events, so the session never handles re-entrant callbacks.

use async_trait::async_trait;

use super::error::StreamResult;

/// Bearer credential used to authenticate the stream
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Inbound event from an open connection
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Text message
    Text(String),
    /// Binary message (not part of the protocol)
    Binary(Vec<u8>),
    /// Connection-level error; the connection is unusable afterwards
    Error(String),
    /// Connection closed
    Closed {
        /// True when the closing handshake completed
        clean: bool,
        reason: Option<String>,
    },
}

/// Opens connections to a camera's live stream
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a connection to `camera_id` authenticated with `credential`
    async fn connect(
        &self,
        camera_id: i64,
        credential: &Credential,
    ) -> StreamResult<Box<dyn StreamConnection>>;
}

/// One open connection
#[async_trait]
pub trait StreamConnection: Send {
    /// Next inbound event
    ///
    /// `None` means the connection ended without a closing handshake.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Close the connection on purpose
    async fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("secret-token");
        assert_eq!(format!("{:?}", credential), "Credential(***)");
        assert_eq!(credential.token(), "secret-token");
    }
}
