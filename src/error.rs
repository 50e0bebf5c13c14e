//! Unified error type for every call that leaves the process.
//!
//! Transport failures, non-2xx responses and undecodable bodies are all
//! reported through [`ApiError`], tagged with an [`ErrorKind`] so callers can
//! branch on the category without parsing messages.

use serde_json::Value;

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network unreachable, DNS failure, timeout, TLS error
    Transport,
    /// The backend answered with a non-2xx status
    Http,
    /// The response body was not the JSON we expected
    Decode,
    /// Rejected on the client before any request was sent
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "transport_error",
            ErrorKind::Http => "http_error",
            ErrorKind::Decode => "decode_error",
            ErrorKind::Validation => "validation_error",
        }
    }
}

/// Error returned by services, the cache and the client facade.
///
/// `Clone` so a single failed fetch can be handed to every caller attached
/// to the same cache entry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{}] {message}", .kind.as_str())]
pub struct ApiError {
    kind: ErrorKind,
    /// HTTP status for `Http` errors
    status: Option<u16>,
    message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Non-2xx response. The message is taken from the backend payload when
    /// it carries one, otherwise a generic text naming the status.
    pub fn http(status: u16, body: &Value) -> Self {
        let message = backend_message(body)
            .unwrap_or_else(|| format!("Request failed with status {}", status));
        Self {
            kind: ErrorKind::Http,
            status: Some(status),
            message,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True for every failure of a round trip (transport, status or body),
    /// as opposed to a request refused locally.
    pub fn is_request_failed(&self) -> bool {
        !matches!(self.kind, ErrorKind::Validation)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::decode(format!("Malformed response body: {}", err))
        } else if err.is_timeout() {
            ApiError::transport("Request timed out")
        } else {
            ApiError::transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::decode(format!("Malformed JSON: {}", err))
    }
}

/// Pick the human-readable message out of a backend error payload.
///
/// The backend answers `{"message": "..."}` on most routes and
/// `{"error": "..."}` or `{"error": {"message": "..."}}` on a few; a bare
/// JSON string is used as-is.
pub fn backend_message(body: &Value) -> Option<String> {
    let candidate = match body {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| match map.get("error") {
                Some(Value::String(s)) => Some(s.as_str()),
                Some(Value::Object(inner)) => inner.get("message").and_then(Value::as_str),
                _ => None,
            }),
        _ => None,
    };

    candidate
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
