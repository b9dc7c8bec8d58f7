//! `/users` CRUD handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use usersvc_core::{User, UserInput, UsersError};

use super::{ApiError, JsonBody, UserId};
use crate::app_state::AppState;
use crate::policy::find_suspicious;

/// Path ids must be positive integers. Anything that is not an integer at all
/// does not name a user resource.
pub fn parse_id(raw: &str) -> Result<u64, UsersError> {
    let id: i64 = raw.trim().parse().map_err(|_| UsersError::RouteNotFound)?;
    if id <= 0 {
        return Err(UsersError::InvalidId);
    }
    u64::try_from(id).map_err(|_| UsersError::InvalidId)
}

fn inspect_input(state: &AppState, input: &UserInput) {
    if !state.cfg().inspection.enabled {
        return;
    }
    let fields = [input.name.as_deref(), input.email.as_deref()];
    if let Some(pattern) = find_suspicious(fields.into_iter().flatten()) {
        state.metrics().security_event("suspicious_pattern");
        tracing::warn!(pattern, "suspicious pattern in request body");
    }
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.store().list().await.map_err(|e| state.reject(e))?;
    state
        .metrics()
        .active_users
        .set(i64::try_from(users.len()).unwrap_or(i64::MAX));
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<Json<User>, ApiError> {
    let user = state.store().get(id).await.map_err(|e| state.reject(e))?;
    Ok(Json(user))
}

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<UserInput>,
) -> Result<impl IntoResponse, ApiError> {
    inspect_input(&state, &input);
    let new = input.validate().map_err(|e| state.reject(e))?;
    let user = state.store().create(new).await.map_err(|e| state.reject(e))?;

    tracing::info!(id = user.id, "user created");
    state.refresh_user_count().await;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    UserId(id): UserId,
    JsonBody(input): JsonBody<UserInput>,
) -> Result<Json<User>, ApiError> {
    inspect_input(&state, &input);
    let new = input.validate().map_err(|e| state.reject(e))?;
    let user = state
        .store()
        .replace(id, new)
        .await
        .map_err(|e| state.reject(e))?;

    tracing::info!(id, "user updated");
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<StatusCode, ApiError> {
    state.store().delete(id).await.map_err(|e| state.reject(e))?;

    tracing::info!(id, "user deleted");
    state.refresh_user_count().await;
    Ok(StatusCode::NO_CONTENT)
}
