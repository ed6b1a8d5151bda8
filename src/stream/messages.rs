//! Stream Message Types
//!
//! Wire format of the backend's live-stream endpoint and the decoded
//! events a session republishes to its subscriber.

use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{StreamError, StreamResult};
use super::state::SessionStatus;

/// Raw JSON message sent by the backend on `/ws/streams/{camera_id}`
///
/// Every field is optional; a single message may carry a frame, a batch of
/// plates, an error, or a bare status line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamMessage {
    /// Latest JPEG frame, base64 encoded
    #[serde(default)]
    pub image: Option<String>,
    /// Plates recognised in this frame
    #[serde(default)]
    pub plates: Option<Vec<PlateMessage>>,
    /// Explicit error reported by the backend
    #[serde(default)]
    pub error: Option<String>,
    /// Informational status line ("Waiting for stream data...")
    #[serde(default)]
    pub status: Option<String>,
}

/// A single plate entry in a stream message
#[derive(Debug, Clone, Deserialize)]
pub struct PlateMessage {
    pub plate_text: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub is_watchlist_hit: bool,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

/// Latest decoded frame (latest-wins, never queued)
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEvent {
    pub image_bytes: Vec<u8>,
}

impl FrameEvent {
    /// Write the image to `path`, replacing the previous frame
    pub async fn save(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, &self.image_bytes).await
    }
}

/// Plate region within the frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A recognised plate, as shown in the recent detections list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionEvent {
    pub id: String,
    pub plate_text: String,
    /// Recognition confidence as a percentage, 0-100
    pub confidence: f64,
    pub is_watchlist_hit: bool,
    pub bounding_box: Option<BoundingBox>,
    pub seen_at: DateTime<Utc>,
}

impl DetectionEvent {
    /// Create a detection received now
    pub fn new(plate_text: impl Into<String>, confidence: f64, is_watchlist_hit: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            plate_text: plate_text.into(),
            confidence: clamp_confidence(confidence),
            is_watchlist_hit,
            bounding_box: None,
            seen_at: Utc::now(),
        }
    }

    /// Attach a bounding box
    pub fn with_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }
}

impl From<PlateMessage> for DetectionEvent {
    fn from(plate: PlateMessage) -> Self {
        let has_box = plate.x.is_some()
            || plate.y.is_some()
            || plate.width.is_some()
            || plate.height.is_some();

        let mut event = DetectionEvent::new(plate.plate_text, plate.confidence, plate.is_watchlist_hit);
        if has_box {
            event = event.with_box(BoundingBox {
                x: plate.x.unwrap_or(0.0),
                y: plate.y.unwrap_or(0.0),
                width: plate.width.unwrap_or(0.0),
                height: plate.height.unwrap_or(0.0),
            });
        }
        event
    }
}

/// The live socket sends raw detector scores (0-1) while stored logs use
/// percentages; a value of at most 1 is taken as a fraction.
fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        return 0.0;
    }
    let percent = if (0.0..=1.0).contains(&confidence) {
        confidence * 100.0
    } else {
        confidence
    };
    percent.clamp(0.0, 100.0)
}

/// Contents of one decoded stream message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedMessage {
    pub frame: Option<FrameEvent>,
    pub detections: Vec<DetectionEvent>,
    pub error: Option<String>,
    pub status: Option<String>,
}

impl DecodedMessage {
    /// Whether the message carried frame or plate data
    pub fn has_stream_data(&self) -> bool {
        self.frame.is_some() || !self.detections.is_empty()
    }
}

/// Decode a text message received from the backend
///
/// Anything that is not a JSON object, or that carries an image which is
/// not valid base64, is rejected as `MalformedMessage`.
pub fn decode_message(text: &str) -> StreamResult<DecodedMessage> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(StreamError::MalformedMessage(
            "expected a JSON object".to_string(),
        ));
    }
    let message: StreamMessage = serde_json::from_value(value)?;

    let frame = match message.image {
        Some(encoded) if !encoded.is_empty() => Some(FrameEvent {
            image_bytes: BASE64_STANDARD.decode(encoded.as_bytes())?,
        }),
        _ => None,
    };

    let detections = message
        .plates
        .unwrap_or_default()
        .into_iter()
        .map(DetectionEvent::from)
        .collect();

    Ok(DecodedMessage {
        frame,
        detections,
        error: message.error,
        status: message.status,
    })
}

/// Event delivered from a session to its subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    /// Generation of the session that produced this event
    pub generation: u64,
    pub camera_id: i64,
    pub kind: SessionEventKind,
}

/// Payload of a session event
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEventKind {
    /// Session status changed
    Status(SessionStatus),
    /// New frame (replaces any previous one)
    Frame(FrameEvent),
    /// Snapshot of the recent detections window, newest last
    Detections(Vec<DetectionEvent>),
    /// Error surfaced to the operator
    Error(String),
    /// A watchlisted plate was seen
    WatchlistAlert(DetectionEvent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_decode_frame_and_plates() {
        let json = r#"{
            "image": "aGVsbG8=",
            "plates": [
                {"plate_text": "ABC123", "confidence": 97.4, "is_watchlist_hit": true, "x": 10, "y": 20, "width": 30, "height": 40},
                {"plate_text": "XYZ789", "confidence": 55, "is_watchlist_hit": false}
            ]
        }"#;
        let decoded = decode_message(json).unwrap();

        assert_eq!(decoded.frame.unwrap().image_bytes, b"hello".to_vec());
        assert_eq!(decoded.detections.len(), 2);

        let first = &decoded.detections[0];
        assert_eq!(first.plate_text, "ABC123");
        assert_eq!(first.confidence, 97.4);
        assert!(first.is_watchlist_hit);
        assert_eq!(
            first.bounding_box,
            Some(BoundingBox { x: 10.0, y: 20.0, width: 30.0, height: 40.0 })
        );

        let second = &decoded.detections[1];
        assert!(!second.is_watchlist_hit);
        assert!(second.bounding_box.is_none());
    }

    #[test]
    fn test_decode_error_payload() {
        let decoded = decode_message(r#"{"error": "RTSP URL is required for this camera."}"#).unwrap();
        assert_eq!(decoded.error.as_deref(), Some("RTSP URL is required for this camera."));
        assert!(!decoded.has_stream_data());
    }

    #[test]
    fn test_decode_status_only() {
        let decoded = decode_message(r#"{"status": "Waiting for stream data..."}"#).unwrap();
        assert_eq!(decoded.status.as_deref(), Some("Waiting for stream data..."));
        assert!(decoded.frame.is_none());
        assert!(decoded.error.is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_message("not json at all"),
            Err(StreamError::MalformedMessage(_))
        ));
        assert!(matches!(
            decode_message("[1, 2, 3]"),
            Err(StreamError::MalformedMessage(_))
        ));
        assert!(matches!(
            decode_message(r#"{"image": "***not base64***"}"#),
            Err(StreamError::MalformedMessage(_))
        ));
        assert!(matches!(
            decode_message(r#"{"plates": [{"confidence": 50}]}"#),
            Err(StreamError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(DetectionEvent::new("A", 140.0, false).confidence, 100.0);
        assert_eq!(DetectionEvent::new("A", -3.0, false).confidence, 0.0);
        assert_eq!(DetectionEvent::new("A", f64::NAN, false).confidence, 0.0);
    }

    #[test]
    fn test_fractional_confidence_scaled() {
        let decoded = decode_message(
            r#"{"plates": [
                {"plate_text": "A", "confidence": 0.85},
                {"plate_text": "B", "confidence": 0.42},
                {"plate_text": "C", "confidence": 97.6}
            ]}"#,
        )
        .unwrap();

        let confidences: Vec<f64> = decoded.detections.iter().map(|d| d.confidence).collect();
        assert!((confidences[0] - 85.0).abs() < 1e-9);
        assert!((confidences[1] - 42.0).abs() < 1e-9);
        assert_eq!(confidences[2], 97.6);
    }

    #[tokio::test]
    async fn test_frame_save_keeps_latest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame.jpg");

        let first = decode_message(r#"{"image": "aGVsbG8="}"#).unwrap().frame.unwrap();
        let second = decode_message(r#"{"image": "YnllIQ=="}"#).unwrap().frame.unwrap();
        first.save(&path).await.unwrap();
        second.save(&path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"bye!");
    }
}
