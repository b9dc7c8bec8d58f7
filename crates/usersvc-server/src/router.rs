//! Axum router wiring.
//!
//! Layers are listed innermost first; `security_headers` wraps everything but
//! CORS so that even rate-limited and fallback responses carry them. CORS sits
//! outermost and answers preflights itself.

use axum::http::{header, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsSection;

use crate::{api, app_state::AppState, middleware, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .route(
            "/users",
            get(api::users::list_users).post(api::users::create_user),
        )
        .route(
            "/users/:id",
            get(api::users::get_user)
                .put(api::users::update_user)
                .delete(api::users::delete_user),
        )
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.clone(), middleware::inspect_uri))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
        .layer(from_fn_with_state(state.clone(), middleware::track_metrics))
        .layer(from_fn_with_state(state.clone(), middleware::security_headers))
        .layer(cors_layer(&state.cfg().cors))
        .with_state(state)
}

fn cors_layer(cfg: &CorsSection) -> CorsLayer {
    // origins were checked when the state was built
    let origins = cfg.header_values().unwrap_or_default();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
