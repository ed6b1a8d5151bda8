//! Scripted transport for session and viewer tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::error::{StreamError, StreamResult};
use super::transport::{Credential, StreamConnection, StreamTransport, TransportEvent};

/// Outcome of one `connect` call
pub enum ConnectScript {
    /// Fail to open with this reason
    Fail(String),
    /// Fail to open with this error as is
    Reject(StreamError),
    /// Open; events are pushed later through `MockTransport::push`
    Open,
    /// Never finish opening
    Hang,
}

#[derive(Default)]
struct Shared {
    script: Mutex<VecDeque<ConnectScript>>,
    connects: Mutex<Vec<(i64, Instant)>>,
    senders: Mutex<Vec<mpsc::UnboundedSender<TransportEvent>>>,
    open: AtomicUsize,
    max_open: AtomicUsize,
    closed_by_client: AtomicUsize,
}

/// In-memory transport that records every connect and tracks open handles
#[derive(Clone, Default)]
pub struct MockTransport {
    shared: Arc<Shared>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue connect outcomes; once the script runs dry every connect fails
    pub fn script(&self, steps: impl IntoIterator<Item = ConnectScript>) {
        self.shared.script.lock().unwrap().extend(steps);
    }

    /// Push an event into the most recently opened connection
    pub fn push(&self, event: TransportEvent) {
        if let Some(tx) = self.shared.senders.lock().unwrap().last() {
            let _ = tx.send(event);
        }
    }

    /// Drop the sender of the latest connection, ending it without a handshake
    pub fn drop_latest(&self) {
        self.shared.senders.lock().unwrap().pop();
    }

    pub fn connect_count(&self) -> usize {
        self.shared.connects.lock().unwrap().len()
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.shared.connects.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    pub fn connected_cameras(&self) -> Vec<i64> {
        self.shared.connects.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }

    pub fn open_count(&self) -> usize {
        self.shared.open.load(Ordering::SeqCst)
    }

    pub fn max_open(&self) -> usize {
        self.shared.max_open.load(Ordering::SeqCst)
    }

    pub fn closed_by_client(&self) -> usize {
        self.shared.closed_by_client.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamTransport for MockTransport {
    async fn connect(
        &self,
        camera_id: i64,
        _credential: &Credential,
    ) -> StreamResult<Box<dyn StreamConnection>> {
        self.shared
            .connects
            .lock()
            .unwrap()
            .push((camera_id, Instant::now()));

        let step = self.shared.script.lock().unwrap().pop_front();
        match step {
            Some(ConnectScript::Open) => {
                let (tx, rx) = mpsc::unbounded_channel();
                self.shared.senders.lock().unwrap().push(tx);
                let open = self.shared.open.fetch_add(1, Ordering::SeqCst) + 1;
                self.shared.max_open.fetch_max(open, Ordering::SeqCst);
                Ok(Box::new(MockConnection {
                    rx,
                    shared: Arc::clone(&self.shared),
                    released: false,
                }))
            }
            Some(ConnectScript::Hang) => std::future::pending().await,
            Some(ConnectScript::Fail(reason)) => Err(StreamError::Transport(reason)),
            Some(ConnectScript::Reject(error)) => Err(error),
            None => Err(StreamError::Transport("connection refused".to_string())),
        }
    }
}

struct MockConnection {
    rx: mpsc::UnboundedReceiver<TransportEvent>,
    shared: Arc<Shared>,
    released: bool,
}

impl MockConnection {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.shared.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl StreamConnection for MockConnection {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        if !self.released {
            self.shared.closed_by_client.fetch_add(1, Ordering::SeqCst);
        }
        self.release();
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.release();
    }
}
