//! Error mapping for catalog responses.
//!
//! Converts non-success HTTP responses into `QvaultError`, keeping the status
//! code so callers can tell transient failures from permanent ones.

use std::fmt;

use reqwest::StatusCode;

use crate::error::QvaultError;

/// A failed catalog response.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Server-provided message, or the canonical reason phrase
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Build from a response body, preferring a JSON `message` field.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected response")
                    .to_string()
            });
        Self::new(status, message)
    }

    /// Read the body of a failed response and build the error from it.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_body(status, &body)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ApiError> for QvaultError {
    fn from(error: ApiError) -> Self {
        if error.is_unauthorized() {
            return QvaultError::Auth(error.message);
        }
        QvaultError::Api {
            status: error.status.as_u16(),
            message: error.message,
        }
    }
}
