//! User-facing HTTP surface: `/users` handlers plus their error and body plumbing.

pub mod error;
pub mod extract;
pub mod users;

pub use error::ApiError;
pub use extract::{JsonBody, UserId};

use axum::extract::State;

use crate::app_state::AppState;
use usersvc_core::UsersError;

/// Fallback for unmatched routes.
pub async fn not_found(State(state): State<AppState>) -> ApiError {
    state.reject(UsersError::RouteNotFound)
}
