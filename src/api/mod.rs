//! Backend REST API
//!
//! Typed client for the ANPR backend:
//!
//! - **client**: `ApiClient`, bearer auth, status mapping
//! - **auth**: Login, registration, profile
//! - **cameras**: Camera CRUD, snapshots, health
//! - **logs**: Plate log search and export
//! - **watchlist**: Watchlist CRUD with plate normalization
//! - **dashboard**: KPI and chart data
//! - **dto**: Request/response types
//! - **error**: Error types

pub mod auth;
pub mod cameras;
pub mod client;
pub mod dashboard;
pub mod dto;
pub mod error;
pub mod logs;
pub mod watchlist;

pub use client::{ApiClient, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use dto::*;
pub use error::{ApiError, ApiResult};
pub use logs::{parse_time_arg, LogQuery};
pub use watchlist::normalize_plate;
