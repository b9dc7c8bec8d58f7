//! Shared error type across usersvc crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed body.
    BadRequest,
    /// Unknown user or route.
    NotFound,
    /// Uniqueness violation (duplicate email).
    Conflict,
    /// Rate limited.
    RateLimited,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Conflict => "CONFLICT",
            ClientCode::RateLimited => "RATE_LIMITED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// HTTP status code carried by responses with this code.
    pub fn http_status(self) -> u16 {
        match self {
            ClientCode::BadRequest => 400,
            ClientCode::NotFound => 404,
            ClientCode::Conflict => 409,
            ClientCode::RateLimited => 429,
            ClientCode::UnsupportedVersion => 400,
            ClientCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, UsersError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum UsersError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Invalid user ID")]
    InvalidId,
    #[error("user {0} not found")]
    NotFound(u64),
    #[error("Resource not found")]
    RouteNotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { retry_after_secs: u64 },
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl UsersError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            UsersError::BadRequest(_) | UsersError::InvalidId | UsersError::Config(_) => {
                ClientCode::BadRequest
            }
            UsersError::NotFound(_) | UsersError::RouteNotFound => ClientCode::NotFound,
            UsersError::Conflict(_) => ClientCode::Conflict,
            UsersError::RateLimited { .. } => ClientCode::RateLimited,
            UsersError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            UsersError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Message safe to show a client. Internal detail is withheld when `redact` is set.
    pub fn public_message(&self, redact: bool) -> String {
        match self {
            UsersError::NotFound(_) => "Resource not found".to_string(),
            UsersError::Internal(_) if redact => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}
