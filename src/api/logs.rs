//! Plate log endpoints

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use reqwest::Method;
use serde::Serialize;

use super::client::ApiClient;
use super::dto::{LogPage, PlateLog};
use super::error::{ApiError, ApiResult};

/// Default page size, matching the backend
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Largest page `fetch_all_logs` asks for
pub const MAX_PER_PAGE: u32 = 100;

/// Filters for the log search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogQuery {
    /// Substring match, case-insensitive on the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub watchlist_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    /// 1-based
    pub page: u32,
    pub per_page: u32,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            plate: None,
            camera_id: None,
            from_date: None,
            to_date: None,
            watchlist_only: false,
            min_confidence: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl LogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plate(mut self, plate: impl Into<String>) -> Self {
        self.plate = Some(plate.into());
        self
    }

    pub fn camera(mut self, camera_id: i64) -> Self {
        self.camera_id = Some(camera_id);
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    pub fn watchlist_only(mut self) -> Self {
        self.watchlist_only = true;
        self
    }

    pub fn min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = Some(confidence);
        self
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page.max(1);
        self.per_page = per_page.max(1);
        self
    }

    fn validate(&self) -> ApiResult<()> {
        if let (Some(from), Some(to)) = (self.from_date, self.to_date) {
            if from > to {
                return Err(ApiError::Validation(
                    "from_date must not be after to_date".to_string(),
                ));
            }
        }
        if let Some(c) = self.min_confidence {
            if !(0.0..=100.0).contains(&c) {
                return Err(ApiError::Validation(format!(
                    "min_confidence must be between 0 and 100, got {}",
                    c
                )));
            }
        }
        Ok(())
    }
}

/// Parse a time filter argument
///
/// Accepts `now`, relative offsets like `now-24h`, `now-7d`, `now-2w`,
/// `now-1m` (30 days), RFC 3339 timestamps, and plain `YYYY-MM-DD` dates
/// (midnight UTC).
pub fn parse_time_arg(s: &str) -> ApiResult<DateTime<Utc>> {
    let s = s.trim();

    if s.starts_with("now") {
        let now = Utc::now();
        if s == "now" {
            return Ok(now);
        }

        let re = regex::Regex::new(r"^now-(\d+)([hdwm])$")
            .map_err(|e| ApiError::Validation(format!("time pattern: {}", e)))?;
        let caps = re
            .captures(s)
            .ok_or_else(|| ApiError::Validation(format!("Invalid relative time: {}", s)))?;
        let amount: i64 = caps[1]
            .parse()
            .map_err(|_| ApiError::Validation("Invalid number".to_string()))?;

        let offset = match &caps[2] {
            "h" => Duration::hours(amount),
            "d" => Duration::days(amount),
            "w" => Duration::weeks(amount),
            "m" => Duration::days(amount * 30),
            _ => return Err(ApiError::Validation("Invalid time unit".to_string())),
        };
        return Ok(now - offset);
    }

    if let Some(ts) = super::dto::timestamp::parse(s) {
        return Ok(ts);
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ApiError::Validation(format!("Invalid time: {}", s)))
}

impl ApiClient {
    /// One page of logs, newest first
    pub async fn search_logs(&self, query: &LogQuery) -> ApiResult<LogPage> {
        query.validate()?;
        self.send_json(self.request(Method::GET, "/logs/").query(query))
            .await
    }

    /// Walk every page of a search
    pub async fn fetch_all_logs(&self, query: &LogQuery) -> ApiResult<Vec<PlateLog>> {
        let mut query = query.clone().page(1, MAX_PER_PAGE);
        let mut logs = Vec::new();

        loop {
            let page = self.search_logs(&query).await?;
            let fetched = page.items.len();
            logs.extend(page.items);

            if fetched == 0 || logs.len() as u64 >= page.total {
                break;
            }
            query.page += 1;
        }

        tracing::debug!(count = logs.len(), "Fetched plate logs");
        Ok(logs)
    }

    pub async fn get_log(&self, log_id: i64) -> ApiResult<PlateLog> {
        self.send_json(self.request(Method::GET, &format!("/logs/{}", log_id)))
            .await
    }

    /// CSV rendered by the backend itself
    pub async fn export_logs_csv(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ApiResult<String> {
        let query = LogQuery::new().between(from, to);
        query.validate()?;

        let mut params = vec![("format", "csv".to_string())];
        if let Some(from) = from {
            params.push(("from_date", from.to_rfc3339()));
        }
        if let Some(to) = to {
            params.push(("to_date", to.to_rfc3339()));
        }

        self.send_text(self.request(Method::GET, "/logs/export").query(&params))
            .await
    }
}
