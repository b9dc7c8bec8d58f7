//! Operational HTTP endpoints.
//!
//! - `/health`  : liveness (503 once draining)
//! - `/metrics` : Prometheus text format

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthBody<'a> {
    pub status: &'static str,
    pub service: &'a str,
    pub instance: &'a str,
}

pub async fn health(State(state): State<AppState>) -> Response {
    let svc = &state.cfg().service;
    let (code, status) = if state.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, "draining")
    } else {
        (StatusCode::OK, "healthy")
    };

    (
        code,
        Json(HealthBody {
            status,
            service: &svc.name,
            instance: &svc.instance_id,
        }),
    )
        .into_response()
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    state.refresh_user_count().await;
    let body = state.metrics().render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
