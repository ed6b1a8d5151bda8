//! Data Transfer Objects
//!
//! Request and response types for the backend's REST endpoints.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// AUTH DTOs
// ============================================

/// Login response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Account details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Registration and profile update body
#[derive(Debug, Clone, Serialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
}

impl UserCreate {
    pub fn new(email: impl Into<String>, password: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            role: "viewer".to_string(),
        }
    }
}

// ============================================
// CAMERA DTOs
// ============================================

/// A registered camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub id: i64,
    pub name: String,
    pub rtsp_url: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub meta: Option<serde_json::Value>,
    /// "online", "offline" or "error"
    pub status: String,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// Camera create and update body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraCreate {
    pub name: String,
    pub rtsp_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl From<&Camera> for CameraCreate {
    fn from(camera: &Camera) -> Self {
        Self {
            name: camera.name.clone(),
            rtsp_url: camera.rtsp_url.clone(),
            site: camera.site.clone(),
            meta: camera.meta.clone(),
        }
    }
}

/// Snapshot capture result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub image_url: String,
}

/// Per-camera health metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraHealth {
    /// Sent as a string by the backend
    pub camera_id: String,
    pub status: String,
    #[serde(default)]
    pub latency_ms: f64,
    #[serde(default)]
    pub cpu_usage: f64,
    #[serde(default)]
    pub last_updated: Option<String>,
}

// ============================================
// LOG DTOs
// ============================================

/// A recorded plate read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateLog {
    pub id: i64,
    pub plate_text: String,
    /// 0-100
    pub confidence: i64,
    pub camera_id: i64,
    #[serde(default)]
    pub image_snapshot_ref: Option<String>,
    #[serde(default)]
    pub extra_metadata: Option<serde_json::Value>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
}

/// One page of plate logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPage {
    pub items: Vec<PlateLog>,
    pub total: u64,
}

// ============================================
// WATCHLIST DTOs
// ============================================

/// Watchlist entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watchlist {
    pub id: i64,
    pub plate_text: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 0 or 1
    #[serde(default)]
    pub notify_sms: i64,
    /// 0 or 1
    #[serde(default)]
    pub notify_email: i64,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Watchlist create and update body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistCreate {
    pub plate_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub notify_sms: i64,
    pub notify_email: i64,
}

impl WatchlistCreate {
    /// Email notification on, SMS off
    pub fn new(plate_text: impl Into<String>) -> Self {
        Self {
            plate_text: plate_text.into(),
            description: None,
            notify_sms: 0,
            notify_email: 1,
        }
    }
}

// ============================================
// DASHBOARD DTOs
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub active_cameras: i64,
    pub total_cameras: i64,
    pub detections_today: i64,
    pub watchlist_hits: i64,
    pub avg_latency: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentDetection {
    pub id: i64,
    pub plate_text: String,
    pub camera_name: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub timestamp: DateTime<Utc>,
    pub confidence: i64,
    pub is_watchlist_hit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraStatus {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub site: Option<String>,
    pub status: String,
    pub latency: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionTrend {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub date: DateTime<Utc>,
    pub detections: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionType {
    pub name: String,
    pub value: i64,
    pub color: String,
}

/// Everything the dashboard screen shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub kpis: Kpis,
    pub recent_detections: Vec<RecentDetection>,
    pub camera_status: Vec<CameraStatus>,
    pub detection_trends: Vec<DetectionTrend>,
    pub detection_types: Vec<DetectionType>,
}

/// Backend timestamps arrive either as RFC 3339 or as naive ISO 8601
/// (no offset); naive values are taken as UTC.
pub(crate) mod timestamp {
    use super::*;
    use serde::Deserializer;

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(d)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s)))
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
        }
    }
}
