//! Request middleware: security headers, request metrics, per-client rate
//! limiting and path inspection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Instant;

use axum::extract::{ConnectInfo, MatchedPath, Query, Request, State};
use axum::http::{HeaderName, HeaderValue, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use usersvc_core::UsersError;

use crate::app_state::AppState;
use crate::policy::{find_suspicious, RouteClass};

const STATIC_HEADERS: [(&str, &str); 4] = [
    ("x-frame-options", "SAMEORIGIN"),
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
];

/// Matched route template, or `unknown` for fallback traffic.
fn endpoint_of(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn security_headers(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    for (name, value) in STATIC_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    if let Ok(v) = HeaderValue::from_str(&state.cfg().service.instance_id) {
        headers.insert(HeaderName::from_static("x-instance-id"), v);
    }
    resp
}

/// Count and time every request except scrapes of `/metrics` itself.
pub async fn track_metrics(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let endpoint = endpoint_of(&req);
    if endpoint == "/metrics" {
        return next.run(req).await;
    }
    let method = req.method().clone();

    let started = Instant::now();
    let resp = next.run(req).await;
    state.metrics().observe_request(
        method.as_str(),
        &endpoint,
        resp.status().as_u16(),
        started.elapsed(),
    );
    resp
}

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !state.limiter().enabled() {
        return next.run(req).await;
    }
    let Some(class) = RouteClass::classify(req.method(), &endpoint_of(&req)) else {
        return next.run(req).await;
    };

    let ip = client_ip(&req);
    match state.limiter().check(ip, class) {
        Ok(()) => next.run(req).await,
        Err(retry_after_secs) => {
            state.metrics().security_event("rate_limit_exceeded");
            tracing::warn!(%ip, ?class, retry_after_secs, "rate limit exceeded");
            state
                .reject(UsersError::RateLimited { retry_after_secs })
                .into_response()
        }
    }
}

/// Query pairs after percent-decoding, or the raw query when it does not decode.
fn decoded_query(uri: &Uri) -> Vec<String> {
    let Some(raw) = uri.query() else {
        return Vec::new();
    };
    match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => pairs.into_iter().flat_map(|(k, v)| [k, v]).collect(),
        Err(_) => vec![raw.to_string()],
    }
}

/// Flag suspicious markers in the request path and decoded query.
pub async fn inspect_uri(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if state.cfg().inspection.enabled {
        let uri = req.uri();
        let query = decoded_query(uri);
        let parts = std::iter::once(uri.path()).chain(query.iter().map(String::as_str));
        if let Some(pattern) = find_suspicious(parts) {
            state.metrics().security_event("suspicious_pattern");
            let ip = client_ip(&req);
            tracing::warn!(%ip, pattern, path = uri.path(), "suspicious pattern in request uri");
        }
    }
    next.run(req).await
}
