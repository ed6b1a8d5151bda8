//! API Error Types
//!
//! Maps backend HTTP failures onto typed errors. The backend reports
//! failures as `{"detail": ...}` where detail is usually a string and
//! sometimes a validation object.

use reqwest::StatusCode;
use thiserror::Error;

/// REST client errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 401: token missing, expired or rejected
    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    /// 403
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// 409
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-success status
    #[error("API error {status}: {detail}")]
    Api { status: u16, detail: String },

    /// Backend unreachable or the connection broke
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Input rejected before it was sent
    #[error("Invalid input: {0}")]
    Validation(String),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Build an error from a non-success status and its raw body
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = extract_detail(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(detail),
            StatusCode::FORBIDDEN => ApiError::Forbidden(detail),
            StatusCode::NOT_FOUND => ApiError::NotFound(detail),
            StatusCode::CONFLICT => ApiError::Conflict(detail),
            _ => ApiError::Api {
                status: status.as_u16(),
                detail,
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let body = r#"{"detail": "Could not validate credentials"}"#;
        assert_eq!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, body),
            ApiError::Unauthorized("Could not validate credentials".into())
        );
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "{}"),
            ApiError::Forbidden(_)
        ));
        assert_eq!(
            ApiError::from_status(StatusCode::NOT_FOUND, r#"{"detail": "Camera not found"}"#),
            ApiError::NotFound("Camera not found".into())
        );
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, ""),
            ApiError::Conflict(_)
        ));
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::Api {
                status: 502,
                detail: "Bad Gateway".into()
            }
        );
    }

    #[test]
    fn test_structured_detail() {
        let body = r#"{"detail": [{"loc": ["body", "name"], "msg": "field required"}]}"#;
        match ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, body) {
            ApiError::Api { status, detail } => {
                assert_eq!(status, 422);
                assert!(detail.contains("field required"));
            }
            other => panic!("Expected Api, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_body() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom\n");
        assert_eq!(err.to_string(), "API error 500: boom");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ApiError::Timeout.to_string(), "Request timed out");
        assert!(ApiError::Unauthorized("x".into()).is_unauthorized());
        assert!(!ApiError::NotFound("x".into()).is_unauthorized());
    }
}
