//! Stream Session
//!
//! Runs one session on its own tokio task. The task owns the `Session`
//! state, the open connection (at most one) and the reconnect timer, and
//! reacts to exactly three inputs: control messages from the handle,
//! transport events, and the timer firing. Every input is checked
//! against the shared generation counter first, so a superseded session
//! goes quiet instead of touching the subscriber's view. Every wait also
//! watches the counter, so a superseded session drops its transport as
//! soon as the next one is opened.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::backoff::ReconnectPolicy;
use super::error::{StreamError, StreamResult};
use super::messages::{decode_message, SessionEvent, SessionEventKind};
use super::state::{CloseKind, CloseOutcome, Session, SessionStatus};
use super::transport::{Credential, StreamConnection, StreamTransport, TransportEvent};
use super::window::{DetectionWindow, DEFAULT_WINDOW_CAPACITY};

/// Monotonic generation counter shared by a viewer and its sessions
#[derive(Debug, Clone)]
pub struct Generations(Arc<watch::Sender<u64>>);

impl Default for Generations {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self(Arc::new(tx))
    }
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, making every earlier one stale
    pub fn advance(&self) -> u64 {
        let mut next = 0;
        self.0.send_modify(|current| {
            *current += 1;
            next = *current;
        });
        next
    }

    pub fn current(&self) -> u64 {
        *self.0.borrow()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }

    /// Resolves once `generation` is no longer the current one
    pub async fn superseded(&self, generation: u64) {
        let mut rx = self.0.subscribe();
        while *rx.borrow_and_update() == generation {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Tunables for a session
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub policy: ReconnectPolicy,
    pub window_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            policy: ReconnectPolicy::default(),
            window_capacity: DEFAULT_WINDOW_CAPACITY,
        }
    }
}

/// Sender side of the subscriber channel
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

#[derive(Debug)]
enum Control {
    Refresh,
    Close,
}

/// Handle to a running session
///
/// Dropping the handle tears the session down the same way `close` does,
/// without waiting for the transport to finish closing.
#[derive(Debug)]
pub struct SessionHandle {
    camera_id: i64,
    generation: u64,
    control: mpsc::UnboundedSender<Control>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn camera_id(&self) -> i64 {
        self.camera_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the session task has exited
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }

    /// Force-close the transport and reopen it with a fresh retry budget
    pub fn refresh(&self) -> StreamResult<()> {
        self.control
            .send(Control::Refresh)
            .map_err(|_| StreamError::SessionClosed)
    }

    /// Cancel any pending reconnect, close the transport, and wait for the
    /// session task to finish
    pub async fn close(self) {
        let _ = self.control.send(Control::Close);
        if let Err(e) = self.task.await {
            tracing::error!(camera_id = self.camera_id, error = %e, "Session task failed");
        }
    }
}

/// Entry point for opening stream sessions
pub struct StreamSession;

impl StreamSession {
    /// Open a session for `camera_id`
    ///
    /// Advances `generations`, so any session opened earlier against the same
    /// counter becomes stale. Without a credential the session terminates
    /// immediately and `AuthMissing` is returned.
    pub fn open(
        camera_id: i64,
        credential: Option<Credential>,
        transport: Arc<dyn StreamTransport>,
        options: SessionOptions,
        generations: Generations,
        events: EventSender,
    ) -> StreamResult<SessionHandle> {
        let generation = generations.advance();

        let credential = match credential {
            Some(credential) => credential,
            None => {
                tracing::warn!(camera_id, generation, "No credential; stream not opened");
                let _ = events.send(SessionEvent {
                    generation,
                    camera_id,
                    kind: SessionEventKind::Status(SessionStatus::Terminated),
                });
                return Err(StreamError::AuthMissing);
            }
        };

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let task = SessionTask {
            session: Session::new(camera_id, generation, options.policy),
            credential,
            transport,
            generations,
            events,
            control: control_rx,
            window: DetectionWindow::new(options.window_capacity),
        };

        tracing::info!(camera_id, generation, "Opening stream session");
        let task = tokio::spawn(task.run());

        Ok(SessionHandle {
            camera_id,
            generation,
            control: control_tx,
            task,
        })
    }
}

enum Phase {
    Connect,
    Streaming(Box<dyn StreamConnection>),
    Waiting(Duration),
    /// Terminal state reached; only a refresh or close moves on
    Parked,
    Done,
}

struct SessionTask {
    session: Session,
    credential: Credential,
    transport: Arc<dyn StreamTransport>,
    generations: Generations,
    events: EventSender,
    control: mpsc::UnboundedReceiver<Control>,
    window: DetectionWindow,
}

impl SessionTask {
    async fn run(mut self) {
        let mut phase = Phase::Connect;

        loop {
            if !self.is_current() || self.events.is_closed() {
                if let Phase::Streaming(mut connection) = phase {
                    connection.close().await;
                }
                self.session.terminate();
                tracing::debug!(
                    camera_id = self.session.camera_id,
                    generation = self.session.generation,
                    "Stale session stopped"
                );
                break;
            }

            phase = match phase {
                Phase::Connect => self.connect().await,
                Phase::Streaming(connection) => self.stream(connection).await,
                Phase::Waiting(delay) => self.wait(delay).await,
                Phase::Parked => {
                    let generation = self.session.generation;
                    tokio::select! {
                        biased;
                        control = self.control.recv() => self.on_control(control),
                        _ = self.generations.superseded(generation) => self.stop_stale(),
                    }
                }
                Phase::Done => break,
            };
        }
    }

    fn is_current(&self) -> bool {
        self.generations.is_current(self.session.generation)
    }

    fn emit(&self, kind: SessionEventKind) {
        if !self.is_current() {
            return;
        }
        let _ = self.events.send(SessionEvent {
            generation: self.session.generation,
            camera_id: self.session.camera_id,
            kind,
        });
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.session.status = status;
        self.emit(SessionEventKind::Status(status));
    }

    async fn connect(&mut self) -> Phase {
        self.session.begin_connect();
        self.emit(SessionEventKind::Status(SessionStatus::Connecting));

        let camera_id = self.session.camera_id;
        let generation = self.session.generation;
        let result = tokio::select! {
            biased;
            control = self.control.recv() => return self.on_control(control),
            _ = self.generations.superseded(generation) => return self.stop_stale(),
            result = self.transport.connect(camera_id, &self.credential) => result,
        };

        match result {
            Ok(mut connection) => {
                if !self.is_current() {
                    connection.close().await;
                    return Phase::Done;
                }
                self.session.on_open();
                tracing::info!(camera_id, generation = self.session.generation, "Stream live");
                self.emit(SessionEventKind::Status(SessionStatus::Live));
                Phase::Streaming(connection)
            }
            Err(e) if !e.is_recoverable() => {
                tracing::error!(camera_id, error = %e, "Stream connect rejected");
                self.session.on_backend_error(&e.to_string());
                self.emit(SessionEventKind::Error(e.to_string()));
                self.emit(SessionEventKind::Status(SessionStatus::Error));
                Phase::Parked
            }
            Err(e) => {
                tracing::warn!(camera_id, error = %e, "Stream connect failed");
                self.after_close(CloseKind::Unclean {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn stream(&mut self, mut connection: Box<dyn StreamConnection>) -> Phase {
        let generation = self.session.generation;
        let event = tokio::select! {
            biased;
            control = self.control.recv() => {
                connection.close().await;
                return self.on_control(control);
            }
            _ = self.generations.superseded(generation) => {
                connection.close().await;
                return self.stop_stale();
            }
            event = connection.next_event() => event,
        };

        if !self.is_current() {
            connection.close().await;
            return Phase::Done;
        }

        match event {
            Some(TransportEvent::Text(text)) => {
                self.handle_text(&text);
                Phase::Streaming(connection)
            }
            Some(TransportEvent::Binary(data)) => {
                tracing::warn!(
                    camera_id = self.session.camera_id,
                    bytes = data.len(),
                    "Dropping binary stream message"
                );
                Phase::Streaming(connection)
            }
            Some(TransportEvent::Error(reason)) => {
                tracing::warn!(camera_id = self.session.camera_id, error = %reason, "Stream transport error");
                connection.close().await;
                self.emit(SessionEventKind::Error(format!(
                    "Stream connection error: {}",
                    reason
                )));
                self.after_close(CloseKind::Unclean { reason })
            }
            Some(TransportEvent::Closed { clean: true, reason }) => {
                tracing::info!(
                    camera_id = self.session.camera_id,
                    reason = reason.as_deref().unwrap_or(""),
                    "Stream closed by server"
                );
                connection.close().await;
                self.after_close(CloseKind::Clean { reason })
            }
            Some(TransportEvent::Closed { clean: false, reason }) => {
                connection.close().await;
                self.after_close(CloseKind::Unclean {
                    reason: reason.unwrap_or_else(|| "connection lost".to_string()),
                })
            }
            None => {
                connection.close().await;
                self.after_close(CloseKind::Unclean {
                    reason: "connection lost".to_string(),
                })
            }
        }
    }

    async fn wait(&mut self, delay: Duration) -> Phase {
        let generation = self.session.generation;
        tokio::select! {
            biased;
            control = self.control.recv() => self.on_control(control),
            _ = self.generations.superseded(generation) => self.stop_stale(),
            _ = tokio::time::sleep(delay) => Phase::Connect,
        }
    }

    fn on_control(&mut self, control: Option<Control>) -> Phase {
        match control {
            Some(Control::Refresh) => self.restart(),
            Some(Control::Close) | None => self.shutdown(),
        }
    }

    fn restart(&mut self) -> Phase {
        tracing::info!(camera_id = self.session.camera_id, "Refreshing stream");
        self.session.reset_attempts();
        Phase::Connect
    }

    fn shutdown(&mut self) -> Phase {
        tracing::info!(
            camera_id = self.session.camera_id,
            generation = self.session.generation,
            "Stream session closed"
        );
        self.session.terminate();
        self.emit(SessionEventKind::Status(SessionStatus::Terminated));
        Phase::Done
    }

    /// A newer session took over; stop without emitting anything
    fn stop_stale(&mut self) -> Phase {
        self.session.terminate();
        tracing::debug!(
            camera_id = self.session.camera_id,
            generation = self.session.generation,
            "Superseded session stopped"
        );
        Phase::Done
    }

    fn after_close(&mut self, kind: CloseKind) -> Phase {
        let camera_id = self.session.camera_id;

        match self.session.on_close(kind) {
            CloseOutcome::Terminated => {
                self.emit(SessionEventKind::Status(SessionStatus::Terminated));
                Phase::Parked
            }
            CloseOutcome::Reconnect { attempt, delay } => {
                tracing::info!(
                    camera_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling stream reconnect"
                );
                self.emit(SessionEventKind::Status(SessionStatus::Disconnected));
                Phase::Waiting(delay)
            }
            CloseOutcome::Exhausted(error) => {
                tracing::error!(camera_id, error = %error, "Giving up on stream");
                self.emit(SessionEventKind::Error(error.to_string()));
                self.emit(SessionEventKind::Status(SessionStatus::Error));
                Phase::Parked
            }
        }
    }

    fn handle_text(&mut self, text: &str) {
        let decoded = match decode_message(text) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(camera_id = self.session.camera_id, error = %e, "Dropping stream message");
                return;
            }
        };

        if let Some(status) = &decoded.status {
            tracing::debug!(camera_id = self.session.camera_id, status = %status, "Stream status");
        }

        if decoded.has_stream_data() && self.session.on_stream_data() {
            self.emit(SessionEventKind::Status(SessionStatus::Live));
        }

        if let Some(frame) = decoded.frame {
            self.emit(SessionEventKind::Frame(frame));
        }

        if !decoded.detections.is_empty() {
            let added = self.window.extend(decoded.detections);
            for hit in added.iter().filter(|d| d.is_watchlist_hit) {
                tracing::warn!(
                    camera_id = self.session.camera_id,
                    plate = %hit.plate_text,
                    "Watchlist hit"
                );
                self.emit(SessionEventKind::WatchlistAlert(hit.clone()));
            }
            if !added.is_empty() {
                self.emit(SessionEventKind::Detections(self.window.snapshot()));
            }
        }

        if let Some(message) = decoded.error {
            self.session.on_backend_error(&message);
            self.emit(SessionEventKind::Error(message));
            self.set_status(SessionStatus::Error);
        }
    }
}
