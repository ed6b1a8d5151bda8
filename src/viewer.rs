//! Live Viewer
//!
//! Owns at most one stream session for the currently selected camera and
//! folds its events into a `ViewerState` that a front end can render.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::stream::{
    Credential, DetectionEvent, FrameEvent, Generations, SessionEvent, SessionEventKind,
    SessionHandle, SessionOptions, SessionStatus, StreamError, StreamResult, StreamSession,
    StreamTransport,
};

/// Label shown when no camera is selected
pub const NO_CAMERA_LABEL: &str = "No Camera Selected";

/// Confidence above which a detection counts as high confidence
pub const HIGH_CONFIDENCE: f64 = 90.0;

/// What the live pane currently shows
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub camera_id: Option<i64>,
    pub status: Option<SessionStatus>,
    pub status_label: String,
    pub latest_frame: Option<FrameEvent>,
    pub frames_received: u64,
    pub detections: Vec<DetectionEvent>,
    pub last_error: Option<String>,
    pub last_alert: Option<DetectionEvent>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            camera_id: None,
            status: None,
            status_label: NO_CAMERA_LABEL.to_string(),
            latest_frame: None,
            frames_received: 0,
            detections: Vec::new(),
            last_error: None,
            last_alert: None,
        }
    }
}

impl ViewerState {
    fn connecting(camera_id: i64) -> Self {
        Self {
            camera_id: Some(camera_id),
            status: Some(SessionStatus::Connecting),
            status_label: SessionStatus::Connecting.label().to_string(),
            ..Default::default()
        }
    }

    /// Fold one session event into the state
    pub fn apply(&mut self, event: &SessionEvent) {
        match &event.kind {
            SessionEventKind::Status(status) => {
                self.status = Some(*status);
                self.status_label = status.label().to_string();
                if *status == SessionStatus::Live {
                    self.last_error = None;
                }
            }
            SessionEventKind::Frame(frame) => {
                self.latest_frame = Some(frame.clone());
                self.frames_received += 1;
            }
            SessionEventKind::Detections(window) => {
                self.detections = window.clone();
            }
            SessionEventKind::Error(message) => {
                self.last_error = Some(message.clone());
            }
            SessionEventKind::WatchlistAlert(detection) => {
                self.last_alert = Some(detection.clone());
            }
        }
    }

    /// Number of detections currently in the window
    pub fn active_detections(&self) -> usize {
        self.detections.len()
    }

    pub fn high_confidence_count(&self) -> usize {
        self.detections
            .iter()
            .filter(|d| d.confidence > HIGH_CONFIDENCE)
            .count()
    }

    pub fn watchlist_hit_count(&self) -> usize {
        self.detections.iter().filter(|d| d.is_watchlist_hit).count()
    }
}

/// Single-camera live viewer
pub struct LiveViewer {
    transport: Arc<dyn StreamTransport>,
    options: SessionOptions,
    generations: Generations,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    pending: VecDeque<SessionEvent>,
    session: Option<SessionHandle>,
    state: ViewerState,
}

impl LiveViewer {
    pub fn new(transport: Arc<dyn StreamTransport>, options: SessionOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            options,
            generations: Generations::new(),
            events_tx,
            events_rx,
            pending: VecDeque::new(),
            session: None,
            state: ViewerState::default(),
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /// Generation of the active session, if any
    pub fn generation(&self) -> Option<u64> {
        self.session.as_ref().map(|s| s.generation())
    }

    pub fn selected_camera(&self) -> Option<i64> {
        self.state.camera_id
    }

    /// Switch to `camera_id`
    ///
    /// The previous session is closed, and its transport released, before the
    /// new one starts connecting.
    pub async fn select_camera(
        &mut self,
        camera_id: i64,
        credential: Option<Credential>,
    ) -> StreamResult<()> {
        self.teardown().await;
        self.state = ViewerState::connecting(camera_id);

        match StreamSession::open(
            camera_id,
            credential,
            Arc::clone(&self.transport),
            self.options,
            self.generations.clone(),
            self.events_tx.clone(),
        ) {
            Ok(handle) => {
                tracing::info!(camera_id, generation = handle.generation(), "Camera selected");
                self.session = Some(handle);
                Ok(())
            }
            Err(e) => {
                while self.events_rx.try_recv().is_ok() {}
                self.state.status = Some(SessionStatus::Terminated);
                self.state.status_label = SessionStatus::Terminated.label().to_string();
                self.state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop the current selection
    pub async fn clear_selection(&mut self) {
        self.teardown().await;
        self.state = ViewerState::default();
    }

    /// Force-close and reopen the current camera's stream
    pub fn refresh(&self) -> StreamResult<()> {
        match &self.session {
            Some(handle) => handle.refresh(),
            None => Err(StreamError::SessionClosed),
        }
    }

    /// Tear down on exit
    pub async fn close(&mut self) {
        self.teardown().await;
        self.state.status = Some(SessionStatus::Terminated);
        self.state.status_label = SessionStatus::Terminated.label().to_string();
    }

    /// Wait for the next event of the current session and apply it
    ///
    /// Frames that queued up behind each other are coalesced so only the
    /// newest is applied. Returns `None` once no session is active and
    /// nothing is left to deliver.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            let event = match self.pending.pop_front() {
                Some(event) => event,
                None => {
                    if self.session.is_none() {
                        match self.events_rx.try_recv() {
                            Ok(event) => event,
                            Err(_) => return None,
                        }
                    } else {
                        self.events_rx.recv().await?
                    }
                }
            };

            if !self.is_current(&event) {
                continue;
            }

            let event = if matches!(event.kind, SessionEventKind::Frame(_)) {
                self.coalesce_frames(event)
            } else {
                event
            };

            self.state.apply(&event);
            return Some(event);
        }
    }

    fn is_current(&self, event: &SessionEvent) -> bool {
        self.generations.is_current(event.generation)
            && self.state.camera_id == Some(event.camera_id)
    }

    fn coalesce_frames(&mut self, mut latest: SessionEvent) -> SessionEvent {
        let mut dropped = 0u64;
        while let Ok(next) = self.events_rx.try_recv() {
            if !self.is_current(&next) {
                continue;
            }
            if matches!(next.kind, SessionEventKind::Frame(_)) {
                latest = next;
                dropped += 1;
            } else {
                self.pending.push_back(next);
                break;
            }
        }
        if dropped > 0 {
            tracing::trace!(dropped, "Coalesced stale frames");
        }
        latest
    }

    async fn teardown(&mut self) {
        // Invalidate first so nothing from the old session is applied
        self.generations.advance();
        if let Some(handle) = self.session.take() {
            let camera_id = handle.camera_id();
            handle.close().await;
            tracing::debug!(camera_id, "Previous session closed");
        }
        self.pending.clear();
        while self.events_rx.try_recv().is_ok() {}
    }
}
