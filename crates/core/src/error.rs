use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a single source contributed nothing (or stopped early) to a search.
///
/// These never escape the aggregator; they end up in the per-source report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("missing required cookies: {}", .0.join(", "))]
    MissingCookies(Vec<String>),

    #[error("malformed source page: {0}")]
    MalformedPage(String),

    /// A download URL pointing outside the source's own site.
    #[error("not a link of this source: {0}")]
    ForeignLink(String),

    #[error("timed out after {}s", .0.as_secs_f32())]
    TimedOut(Duration),

    #[error("cancelled")]
    Cancelled,
}

impl SourceError {
    /// Malformed pages and timeouts are treated like an unreachable source.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// Unified API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Upstream(_) => "bad_gateway",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Upstream(_) => 502,
            Self::Internal(_) => 500,
        }
    }
}

/// JSON error envelope: `{ "error": { "code": "…", "message": "…", "details": {} } }`
#[derive(Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl From<&ApiError> for ErrorEnvelope {
    fn from(e: &ApiError) -> Self {
        Self {
            error: ErrorBody {
                code: e.code().to_string(),
                message: e.to_string(),
                details: serde_json::Value::Object(serde_json::Map::new()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cookies_lists_names() {
        let e = SourceError::MissingCookies(vec!["uid".into(), "pass".into()]);
        assert_eq!(e.to_string(), "missing required cookies: uid, pass");
        assert!(e.is_unavailable());
        assert!(!SourceError::Cancelled.is_unavailable());
    }

    #[test]
    fn envelope_carries_code_and_message() {
        let e = ApiError::NotFound("source not found".into());
        let env = ErrorEnvelope::from(&e);
        assert_eq!(env.error.code, "not_found");
        assert_eq!(env.error.message, "not found: source not found");
        assert_eq!(e.status_code(), 404);
    }
}
