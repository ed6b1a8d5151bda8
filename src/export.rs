//! Plate Log Export
//!
//! Writes fetched plate logs as CSV (same columns as the backend's own
//! export), JSON or NDJSON.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::api::PlateLog;

/// CSV header, matching the backend export
pub const CSV_HEADER: [&str; 7] = [
    "ID",
    "Plate",
    "Timestamp",
    "Camera ID",
    "Confidence",
    "Image URL",
    "Metadata",
];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown export format: {0} (expected csv, json or ndjson)")]
    UnknownFormat(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Ndjson,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Ndjson => "ndjson",
        }
    }

    /// Guess from a file extension, defaulting to CSV
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "ndjson" | "jsonl" => Ok(ExportFormat::Ndjson),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Write logs in `format`; returns the number of records written
pub fn write_logs<W: Write>(writer: W, logs: &[PlateLog], format: ExportFormat) -> ExportResult<usize> {
    match format {
        ExportFormat::Csv => write_csv(writer, logs),
        ExportFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, logs)?;
            writer.flush()?;
            Ok(logs.len())
        }
        ExportFormat::Ndjson => {
            let mut writer = writer;
            for log in logs {
                serde_json::to_writer(&mut writer, log)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
            Ok(logs.len())
        }
    }
}

fn write_csv<W: Write>(writer: W, logs: &[PlateLog]) -> ExportResult<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for log in logs {
        let metadata = log
            .extra_metadata
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_default();

        csv.write_record([
            log.id.to_string(),
            log.plate_text.clone(),
            log.timestamp.to_rfc3339(),
            log.camera_id.to_string(),
            log.confidence.to_string(),
            log.image_snapshot_ref.clone().unwrap_or_default(),
            metadata,
        ])?;
    }

    csv.flush()?;
    Ok(logs.len())
}

/// Write logs to a file, picking the format from its extension
pub fn export_to_path(path: &Path, logs: &[PlateLog]) -> ExportResult<usize> {
    let format = ExportFormat::from_path(path);
    let file = std::fs::File::create(path)?;
    let count = write_logs(std::io::BufWriter::new(file), logs, format)?;
    tracing::info!(path = ?path, count, format = format.extension(), "Exported plate logs");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn logs() -> Vec<PlateLog> {
        vec![
            PlateLog {
                id: 1,
                plate_text: "KA01AB1234".to_string(),
                confidence: 93,
                camera_id: 2,
                image_snapshot_ref: Some("/static/snapshots/1.jpg".to_string()),
                extra_metadata: Some(serde_json::json!({"lane": "in, north"})),
                timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
            },
            PlateLog {
                id: 2,
                plate_text: "MH12DE1433".to_string(),
                confidence: 71,
                camera_id: 2,
                image_snapshot_ref: None,
                extra_metadata: None,
                timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 8, 5, 0).unwrap(),
            },
        ]
    }

    #[test]
    fn test_csv_columns_and_quoting() {
        let mut out = Vec::new();
        let count = write_logs(&mut out, &logs(), ExportFormat::Csv).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID,Plate,Timestamp,Camera ID,Confidence,Image URL,Metadata");
        assert_eq!(lines[2], "2,MH12DE1433,2025-03-01T08:05:00+00:00,2,71,,");

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(&first[6], r#"{"lane":"in, north"}"#);
    }

    #[test]
    fn test_ndjson() {
        let mut out = Vec::new();
        write_logs(&mut out, &logs(), ExportFormat::Ndjson).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["plate_text"], "KA01AB1234");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out.json")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out.JSONL")), ExportFormat::Ndjson);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Csv);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_to_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plates.csv");
        assert_eq!(export_to_path(&path, &logs()).unwrap(), 2);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("ID,Plate"));
    }
}
