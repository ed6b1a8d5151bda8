//! Stream session error types
//!
//! Errors the live-stream layer can report. Only `AuthMissing` and
//! `SessionClosed` ever cross the session boundary as a `Result`; transport
//! and protocol failures are folded into session status events.

use thiserror::Error;

/// Errors that can occur in the live-stream layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// No credential was supplied; the operator must log in again
    #[error("Not authenticated: log in to watch live streams")]
    AuthMissing,

    /// Connect, read or write failure on the underlying transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// The reconnect budget ran out
    #[error("Stream closed unexpectedly: {last_error}. Max reconnect attempts ({attempts}) reached.")]
    ReconnectExhausted { attempts: u32, last_error: String },

    /// An incoming message could not be decoded
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// The session task has already finished
    #[error("Session closed")]
    SessionClosed,
}

impl StreamError {
    /// Whether the session can recover from this error on its own
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StreamError::Transport(_) | StreamError::MalformedMessage(_))
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::MalformedMessage(err.to_string())
    }
}

impl From<base64::DecodeError> for StreamError {
    fn from(err: base64::DecodeError) -> Self {
        StreamError::MalformedMessage(format!("invalid image payload: {}", err))
    }
}

/// Result type alias for stream operations
pub type StreamResult<T> = Result<T, StreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StreamError::ReconnectExhausted {
            attempts: 10,
            last_error: "connection reset".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Stream closed unexpectedly: connection reset. Max reconnect attempts (10) reached."
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(StreamError::Transport("reset".into()).is_recoverable());
        assert!(StreamError::MalformedMessage("bad".into()).is_recoverable());
        assert!(!StreamError::AuthMissing.is_recoverable());
        assert!(!StreamError::ReconnectExhausted {
            attempts: 10,
            last_error: String::new()
        }
        .is_recoverable());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StreamError = json_err.into();
        assert!(matches!(err, StreamError::MalformedMessage(_)));
    }
}
