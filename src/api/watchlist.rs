//! Watchlist endpoints

use regex::Regex;
use reqwest::Method;

use super::client::ApiClient;
use super::dto::{Watchlist, WatchlistCreate};
use super::error::{ApiError, ApiResult};

/// Normalize a plate for the watchlist: trimmed, uppercase, single spaces
pub fn normalize_plate(raw: &str) -> ApiResult<String> {
    let plate = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    let re = Regex::new(r"^[A-Z0-9][A-Z0-9 -]{0,14}[A-Z0-9]$")
        .map_err(|e| ApiError::Validation(format!("plate pattern: {}", e)))?;

    if re.is_match(&plate) {
        Ok(plate)
    } else {
        Err(ApiError::Validation(format!(
            "'{}' is not a valid plate (2-16 letters, digits, spaces or dashes)",
            raw.trim()
        )))
    }
}

impl ApiClient {
    pub async fn list_watchlist(&self, skip: u32, limit: u32) -> ApiResult<Vec<Watchlist>> {
        self.send_json(
            self.request(Method::GET, "/watchlist/")
                .query(&[("skip", skip), ("limit", limit)]),
        )
        .await
    }

    pub async fn add_watchlist(&self, entry: &WatchlistCreate) -> ApiResult<Watchlist> {
        let entry = WatchlistCreate {
            plate_text: normalize_plate(&entry.plate_text)?,
            ..entry.clone()
        };
        self.send_json(self.request(Method::POST, "/watchlist/").json(&entry))
            .await
    }

    pub async fn update_watchlist(&self, entry_id: i64, entry: &WatchlistCreate) -> ApiResult<Watchlist> {
        let entry = WatchlistCreate {
            plate_text: normalize_plate(&entry.plate_text)?,
            ..entry.clone()
        };
        self.send_json(
            self.request(Method::PUT, &format!("/watchlist/{}", entry_id))
                .json(&entry),
        )
        .await
    }

    pub async fn remove_watchlist(&self, entry_id: i64) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/watchlist/{}", entry_id)))
            .await
    }
}
