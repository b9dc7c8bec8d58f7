//! Failure taxonomy for conformance runs.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConformanceError>;

#[derive(Debug, Error)]
pub enum ConformanceError {
    /// Service unreachable, refused, or timed out.
    #[error("connection to {url} failed: {detail}")]
    Connection { url: String, detail: String },

    #[error("{method} {path}: expected {expected}, got {actual}: {body}")]
    UnexpectedStatus {
        method: String,
        path: String,
        expected: String,
        actual: u16,
        /// Leading part of the response body.
        body: String,
    },

    /// Body missing expected fields, of the wrong shape, or with wrong values.
    #[error("{context}: {detail}")]
    SchemaMismatch { context: String, detail: String },
}

impl ConformanceError {
    pub fn connection(url: impl Into<String>, err: &reqwest::Error) -> Self {
        let detail = if err.is_timeout() {
            format!("timed out: {err}")
        } else {
            err.to_string()
        };
        ConformanceError::Connection {
            url: url.into(),
            detail,
        }
    }

    pub fn schema(context: impl Into<String>, detail: impl Into<String>) -> Self {
        ConformanceError::SchemaMismatch {
            context: context.into(),
            detail: detail.into(),
        }
    }

    /// Stable short name, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ConformanceError::Connection { .. } => "connection",
            ConformanceError::UnexpectedStatus { .. } => "unexpected_status",
            ConformanceError::SchemaMismatch { .. } => "schema_mismatch",
        }
    }
}
