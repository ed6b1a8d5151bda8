//! Session State Machine
//!
//! Pure transition logic for one "watch camera X" subscription. The
//! session task in `session.rs` drives it; nothing here touches the
//! network or the clock.

use std::fmt;
use std::time::Duration;

use super::backoff::ReconnectPolicy;
use super::error::StreamError;

/// Lifecycle state of a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Created, nothing opened yet
    Idle,
    /// Transport open in progress
    Connecting,
    /// Transport open, frames flowing
    Live,
    /// Transport lost, reconnect pending
    Disconnected,
    /// Backend reported an error, or reconnects were exhausted
    Error,
    /// Closed cleanly; no further transitions
    Terminated,
}

impl SessionStatus {
    /// Label shown next to the video pane
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "Idle",
            SessionStatus::Connecting => "Connecting...",
            SessionStatus::Live => "Live",
            SessionStatus::Disconnected => "Disconnected",
            SessionStatus::Error => "Error",
            SessionStatus::Terminated => "Terminated",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a transport connection ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseKind {
    /// Closing handshake completed, or we closed it on purpose
    Clean { reason: Option<String> },
    /// Connection dropped, failed to open, or errored
    Unclean { reason: String },
}

/// What the driver should do after a close
#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    /// Stop; the session is over
    Terminated,
    /// Sleep for `delay`, then open retry number `attempt`
    Reconnect { attempt: u32, delay: Duration },
    /// Retry budget spent; the session is in `Error`
    Exhausted(StreamError),
}

/// State of one stream session
#[derive(Debug, Clone)]
pub struct Session {
    pub camera_id: i64,
    pub generation: u64,
    pub status: SessionStatus,
    pub reconnect_attempt: u32,
    pub last_error: Option<String>,
    connection_open: bool,
    policy: ReconnectPolicy,
}

impl Session {
    pub fn new(camera_id: i64, generation: u64, policy: ReconnectPolicy) -> Self {
        Self {
            camera_id,
            generation,
            status: SessionStatus::Idle,
            reconnect_attempt: 0,
            last_error: None,
            connection_open: false,
            policy,
        }
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Whether the session reached a state it never leaves on its own
    pub fn is_finished(&self) -> bool {
        match self.status {
            SessionStatus::Terminated => true,
            SessionStatus::Error => !self.connection_open,
            _ => false,
        }
    }

    /// Start opening a transport
    pub fn begin_connect(&mut self) {
        self.status = SessionStatus::Connecting;
    }

    /// Transport opened
    pub fn on_open(&mut self) {
        self.status = SessionStatus::Live;
        self.connection_open = true;
        self.reconnect_attempt = 0;
        self.last_error = None;
    }

    /// Backend sent an explicit `{error}` payload; the connection stays up
    pub fn on_backend_error(&mut self, message: &str) {
        self.status = SessionStatus::Error;
        self.last_error = Some(message.to_string());
    }

    /// Frame or plate data arrived
    ///
    /// Returns true if this moved the session back to `Live` after a
    /// backend error.
    pub fn on_stream_data(&mut self) -> bool {
        if self.connection_open && self.status == SessionStatus::Error {
            self.status = SessionStatus::Live;
            return true;
        }
        false
    }

    /// Transport closed or failed to open
    pub fn on_close(&mut self, kind: CloseKind) -> CloseOutcome {
        self.connection_open = false;

        let reason = match kind {
            CloseKind::Clean { .. } => {
                self.status = SessionStatus::Terminated;
                return CloseOutcome::Terminated;
            }
            CloseKind::Unclean { reason } => reason,
        };

        self.status = SessionStatus::Disconnected;
        self.last_error = Some(reason.clone());

        if self.policy.allows_retry(self.reconnect_attempt) {
            let delay = self.policy.delay_for(self.reconnect_attempt);
            self.reconnect_attempt += 1;
            CloseOutcome::Reconnect {
                attempt: self.reconnect_attempt,
                delay,
            }
        } else {
            self.status = SessionStatus::Error;
            CloseOutcome::Exhausted(StreamError::ReconnectExhausted {
                attempts: self.reconnect_attempt,
                last_error: reason,
            })
        }
    }

    /// Explicit teardown
    pub fn terminate(&mut self) {
        self.connection_open = false;
        self.status = SessionStatus::Terminated;
    }

    /// Forget the retry history before a manual refresh
    pub fn reset_attempts(&mut self) {
        self.reconnect_attempt = 0;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unclean(reason: &str) -> CloseKind {
        CloseKind::Unclean {
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_open_resets_attempts() {
        let mut session = Session::new(1, 1, ReconnectPolicy::default());
        session.begin_connect();
        assert_eq!(session.status, SessionStatus::Connecting);

        session.on_close(unclean("refused"));
        session.on_close(unclean("refused"));
        assert_eq!(session.reconnect_attempt, 2);

        session.begin_connect();
        session.on_open();
        assert_eq!(session.status, SessionStatus::Live);
        assert_eq!(session.reconnect_attempt, 0);
        assert!(session.last_error.is_none());
    }

    #[test]
    fn test_unclean_close_schedules_backoff() {
        let mut session = Session::new(1, 1, ReconnectPolicy::default());
        session.on_open();

        let mut delays = Vec::new();
        for expected_attempt in 1..=10 {
            match session.on_close(unclean("reset")) {
                CloseOutcome::Reconnect { attempt, delay } => {
                    assert_eq!(attempt, expected_attempt);
                    assert_eq!(session.status, SessionStatus::Disconnected);
                    delays.push(delay.as_secs());
                }
                other => panic!("Expected Reconnect, got {:?}", other),
            }
            session.begin_connect();
        }
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60, 60, 60]);

        match session.on_close(unclean("reset")) {
            CloseOutcome::Exhausted(StreamError::ReconnectExhausted { attempts, last_error }) => {
                assert_eq!(attempts, 10);
                assert_eq!(last_error, "reset");
            }
            other => panic!("Expected Exhausted, got {:?}", other),
        }
        assert_eq!(session.status, SessionStatus::Error);
        assert!(session.is_finished());
    }

    #[test]
    fn test_clean_close_never_reconnects() {
        for prior_attempts in [0, 5, 10, 50] {
            let mut session = Session::new(1, 1, ReconnectPolicy::default());
            session.reconnect_attempt = prior_attempts;
            session.on_open();
            session.reconnect_attempt = prior_attempts;

            let outcome = session.on_close(CloseKind::Clean { reason: None });
            assert_eq!(outcome, CloseOutcome::Terminated);
            assert_eq!(session.status, SessionStatus::Terminated);
        }
    }

    #[test]
    fn test_backend_error_recovers_on_data() {
        let mut session = Session::new(1, 1, ReconnectPolicy::default());
        session.on_open();

        session.on_backend_error("RTSP URL is required");
        assert_eq!(session.status, SessionStatus::Error);
        assert!(!session.is_finished());

        assert!(session.on_stream_data());
        assert_eq!(session.status, SessionStatus::Live);
        assert!(!session.on_stream_data());
    }

    #[test]
    fn test_reset_attempts() {
        let mut session = Session::new(1, 1, ReconnectPolicy::default());
        session.on_close(unclean("x"));
        session.on_close(unclean("x"));
        session.reset_attempts();
        assert_eq!(session.reconnect_attempt, 0);
        assert!(session.last_error.is_none());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(SessionStatus::Connecting.to_string(), "Connecting...");
        assert_eq!(SessionStatus::Live.label(), "Live");
    }
}
