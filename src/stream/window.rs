//! Recent detections window
//!
//! Keeps the most recent plates, unique by plate text, for the viewer's
//! sidebar. Duplicates of a plate already shown are dropped rather than
//! moved to the end.

use std::collections::VecDeque;

use super::messages::DetectionEvent;

/// Default number of detections kept
pub const DEFAULT_WINDOW_CAPACITY: usize = 8;

/// Bounded FIFO of unique detections, newest last
#[derive(Debug, Clone)]
pub struct DetectionWindow {
    entries: VecDeque<DetectionEvent>,
    capacity: usize,
}

impl Default for DetectionWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY)
    }
}

impl DetectionWindow {
    /// Create an empty window holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a batch of detections
    ///
    /// Returns the entries that were actually added, in order.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = DetectionEvent>) -> Vec<DetectionEvent> {
        let mut added = Vec::new();

        for detection in batch {
            if self.contains(&detection.plate_text) {
                continue;
            }
            self.entries.push_back(detection.clone());
            added.push(detection);
        }

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }

        added
    }

    /// Whether a plate is currently in the window
    pub fn contains(&self, plate_text: &str) -> bool {
        self.entries.iter().any(|d| d.plate_text == plate_text)
    }

    /// Copy of the current entries, oldest first
    pub fn snapshot(&self) -> Vec<DetectionEvent> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
