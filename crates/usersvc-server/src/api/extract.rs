//! Extractors that answer malformed input in the service's error shape.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use usersvc_core::UsersError;

use super::ApiError;

/// Like [`Json`], but rejections become `400 {"error", "code"}`.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                let msg = match &rejection {
                    JsonRejection::JsonDataError(_) => "Invalid JSON data",
                    JsonRejection::JsonSyntaxError(_) => "Malformed JSON",
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing or invalid Content-Type header. Expected 'application/json'"
                    }
                    JsonRejection::BytesRejection(_) => "Failed to read request body",
                    _ => "Invalid JSON request",
                };
                tracing::warn!(detail = %rejection, "rejected request body");
                Err(ApiError::from(UsersError::BadRequest(msg.to_string())))
            }
        }
    }
}

/// A user id taken from the `:id` path segment.
///
/// Path rejections answer in the service's error shape too; see
/// [`parse_id`](super::users::parse_id) for how the segment is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub u64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::warn!(detail = %rejection, "rejected path parameter");
                ApiError::from(UsersError::BadRequest("Invalid path parameter".to_string()))
            })?;
        super::users::parse_id(&raw)
            .map(UserId)
            .map_err(ApiError::from)
    }
}
