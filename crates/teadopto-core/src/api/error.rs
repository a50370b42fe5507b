//! Structured errors for backend calls.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message shown when a call got no response at all.
pub const UNREACHABLE_MESSAGE: &str =
    "Could not reach the server. Check that the backend is running.";

/// Categories of API errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Backend answered with a non-2xx status
    HttpStatus,
    /// No response received (connection refused, DNS, reset, ...)
    Transport,
    /// Request timed out before a response arrived
    Timeout,
    /// A response arrived but its body had an unexpected shape
    Decode,
    /// The request could not be built (bad path, bad header, non-object body)
    InvalidRequest,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Decode => write!(f, "decode"),
            ApiErrorKind::InvalidRequest => write!(f, "invalid_request"),
        }
    }
}

/// Error from a backend call with kind, status and the parsed error body.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// Parsed response body (JSON, or a string for non-JSON bodies)
    pub body: Option<Value>,
    /// One-line summary suitable for display
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// Creates an HTTP status error, pulling a cleaner message out of the
    /// body when the backend sent one.
    pub fn http_status(status: u16, body: Value) -> Self {
        let message = match extract_backend_message(&body) {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None => format!("HTTP {status}"),
        };
        let body = (!body.is_null()).then_some(body);
        Self {
            kind: ApiErrorKind::HttpStatus,
            status: Some(status),
            body,
            message,
        }
    }

    /// Maps a transport-level failure.
    pub fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ApiErrorKind::Timeout, format!("request timed out: {err}"))
        } else {
            Self::new(ApiErrorKind::Transport, format!("request failed: {err}"))
        }
    }

    /// Creates a decode error for a response that was received.
    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            status: Some(status),
            body: None,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidRequest, message)
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// True for a 401 response.
    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::HttpStatus && self.status == Some(401)
    }

    /// True when the backend answered at all.
    pub fn has_response(&self) -> bool {
        matches!(self.kind, ApiErrorKind::HttpStatus | ApiErrorKind::Decode)
    }

    /// The backend's `detail` string, if present.
    pub fn detail(&self) -> Option<&str> {
        self.body.as_ref()?.get("detail")?.as_str()
    }

    /// Best human-readable message from the error body.
    ///
    /// Checks `detail`, `non_field_errors`, `pet`, `message`, then falls back
    /// to the first field present.
    pub fn backend_message(&self) -> Option<String> {
        extract_backend_message(self.body.as_ref()?)
    }

    /// Text for a user-facing alert: backend message, the unreachable text
    /// when no response came back, or `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        if let Some(msg) = self.backend_message() {
            return msg;
        }
        match self.kind {
            ApiErrorKind::Transport | ApiErrorKind::Timeout => UNREACHABLE_MESSAGE.to_string(),
            _ => fallback.to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Returns the first message of a field error value.
///
/// DRF reports field errors either as a string or as a list of strings.
pub fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(first_message),
        Value::Object(map) => map.values().next().and_then(first_message),
        _ => None,
    }
}

fn extract_backend_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => ["detail", "non_field_errors", "pet", "message"]
            .iter()
            .find_map(|key| map.get(*key).and_then(first_message))
            .or_else(|| map.values().next().and_then(first_message)),
        Value::String(s) if !s.trim().is_empty() && s.len() <= 200 => Some(s.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_http_status_message_uses_detail() {
        let err = ApiError::http_status(401, json!({"detail": "Token expired"}));
        assert_eq!(err.message, "HTTP 401: Token expired");
        assert_eq!(err.detail(), Some("Token expired"));
        assert!(err.is_unauthorized());
        assert!(err.has_response());
    }

    #[test]
    fn test_http_status_null_body() {
        let err = ApiError::http_status(500, Value::Null);
        assert_eq!(err.message, "HTTP 500");
        assert!(err.body.is_none());
        assert_eq!(err.backend_message(), None);
    }

    #[test]
    fn test_backend_message_precedence() {
        let err = ApiError::http_status(
            400,
            json!({"pet": ["This pet is not available."], "non_field_errors": ["Already requested."]}),
        );
        assert_eq!(err.backend_message().as_deref(), Some("Already requested."));

        let err = ApiError::http_status(400, json!({"name": ["This field is required."]}));
        assert_eq!(
            err.backend_message().as_deref(),
            Some("This field is required.")
        );
    }

    #[test]
    fn test_first_message_shapes() {
        assert_eq!(first_message(&json!("plain")).as_deref(), Some("plain"));
        assert_eq!(first_message(&json!(["one", "two"])).as_deref(), Some("one"));
        assert_eq!(first_message(&json!([])), None);
        assert_eq!(first_message(&json!(42)), None);
    }

    #[test]
    fn test_user_message_fallbacks() {
        let unreachable = ApiError::new(ApiErrorKind::Transport, "connection refused");
        assert_eq!(unreachable.user_message("fallback"), UNREACHABLE_MESSAGE);
        assert!(!unreachable.has_response());

        let bare = ApiError::http_status(500, Value::Null);
        assert_eq!(bare.user_message("fallback"), "fallback");
    }
}
