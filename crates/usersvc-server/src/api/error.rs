//! HTTP mapping for [`UsersError`].
//!
//! Every failure leaves the service as `{"error": <message>, "code": <CODE>}`
//! with the status taken from the error's client code.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use usersvc_core::UsersError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// A [`UsersError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError {
    err: UsersError,
    redact: bool,
}

impl ApiError {
    pub fn new(err: UsersError, redact: bool) -> Self {
        Self { err, redact }
    }

    pub fn error(&self) -> &UsersError {
        &self.err
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.err.client_code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<UsersError> for ApiError {
    fn from(err: UsersError) -> Self {
        Self::new(err, false)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.err, "request failed");
        }

        let body = ErrorBody {
            error: self.err.public_message(self.redact),
            code: self.err.client_code().as_str(),
        };
        let mut resp = (status, Json(body)).into_response();

        if let UsersError::RateLimited { retry_after_secs } = self.err {
            if let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                resp.headers_mut().insert(header::RETRY_AFTER, v);
            }
        }
        resp
    }
}
