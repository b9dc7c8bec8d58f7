#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use axum::body::to_bytes;
use axum::extract::Request;
use axum::http::Method;
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use usersvc_conformance::suite::CASES;
use usersvc_conformance::{Suite, SuiteConfig, UsersClient};
use usersvc_server::config::ServiceConfig;
use usersvc_server::{router, AppState};

struct Running {
    base_url: String,
    _stop: oneshot::Sender<()>,
}

async fn spawn_service() -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(ServiceConfig::default()).unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(usersvc_server::serve(listener, state, async move {
        let _ = rx.await;
    }));
    Running {
        base_url: format!("http://{addr}"),
        _stop: tx,
    }
}

async fn spawn_router(app: Router) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await
    });
    Running {
        base_url: format!("http://{addr}"),
        _stop: tx,
    }
}

fn fast(expect_fresh: bool) -> SuiteConfig {
    SuiteConfig {
        traffic: 5,
        interval: Duration::from_millis(5),
        ready_timeout: Duration::from_secs(5),
        expect_fresh,
        skip_delete: false,
    }
}

fn client(base_url: &str) -> UsersClient {
    UsersClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fresh_service_passes_every_case() {
    let svc = spawn_service().await;
    let report = Suite::new(client(&svc.base_url), fast(true)).run().await;

    assert!(report.is_success(), "{report}");
    assert_eq!(report.exit_code(), 0);
    let names: Vec<&str> = report.cases().iter().map(|c| c.name).collect();
    assert_eq!(names, CASES);
    assert_eq!(report.passed(), CASES.len());
}

#[tokio::test]
async fn reruns_pass_unless_fresh_ids_are_required() {
    let svc = spawn_service().await;

    let first = Suite::new(client(&svc.base_url), fast(false)).run().await;
    assert!(first.is_success(), "{first}");
    let second = Suite::new(client(&svc.base_url), fast(false)).run().await;
    assert!(second.is_success(), "{second}");

    // ids no longer start at 1
    let strict = Suite::new(client(&svc.base_url), fast(true)).run().await;
    assert_eq!(strict.exit_code(), 1);
    let create = strict.case("create_user").unwrap();
    assert_eq!(create.error().unwrap().kind(), "schema_mismatch");
    assert!(strict.case("get_created").unwrap().skipped());
}

#[tokio::test]
async fn skip_delete_is_reported_as_skipped() {
    let svc = spawn_service().await;
    let cfg = SuiteConfig {
        skip_delete: true,
        ..fast(true)
    };
    let report = Suite::new(client(&svc.base_url), cfg).run().await;

    assert!(report.is_success(), "{report}");
    assert!(report.case("delete_user").unwrap().skipped());
    assert_eq!(report.skipped(), 1);
}

#[tokio::test]
async fn unreachable_service_fails_fast() {
    // grab a free port, then release it so nothing listens there
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap().port()
    };
    let cfg = SuiteConfig {
        ready_timeout: Duration::from_millis(300),
        ..fast(false)
    };
    let report = Suite::new(client(&format!("http://127.0.0.1:{port}")), cfg)
        .run()
        .await;

    assert_eq!(report.exit_code(), 1);
    assert_eq!(
        report.case("wait_ready").unwrap().error().unwrap().kind(),
        "connection"
    );
    assert_eq!(report.skipped(), CASES.len() - 1);
}

#[tokio::test]
async fn lax_implementation_is_caught() {
    // answers 200 with an empty object everywhere but /health
    let app = Router::new()
        .route("/health", get(|| async { r#"{"status":"healthy"}"# }))
        .fallback(|| async { "{}" });
    let svc = spawn_router(app).await;

    let report = Suite::new(client(&svc.base_url), fast(false)).run().await;
    assert_eq!(report.exit_code(), 1);
    assert!(report.case("health").unwrap().passed());
    assert_eq!(
        report.case("create_user").unwrap().error().unwrap().kind(),
        "schema_mismatch"
    );
    assert_eq!(
        report
            .case("unknown_user_is_error")
            .unwrap()
            .error()
            .unwrap()
            .kind(),
        "unexpected_status"
    );
    assert!(report.case("delete_user").unwrap().skipped());
    assert!(report.case("metrics_series_present").unwrap().failed());
}

/// Wrap the user list in `{"data": [...]}` and answer `/health` with a bare object.
async fn reshape(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let is_list = *req.method() == Method::GET && path == "/users";
    if path == "/health" {
        return Json(json!({"ok": true})).into_response();
    }

    let resp = next.run(req).await;
    if !is_list {
        return resp;
    }
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let users: Value = serde_json::from_slice(&bytes).unwrap();
    Json(json!({"data": users, "source": "database"})).into_response()
}

#[tokio::test]
async fn object_shaped_list_and_bare_health_pass() {
    let state = AppState::new(ServiceConfig::default()).unwrap();
    let app = router::build_router(state).layer(from_fn(reshape));
    let svc = spawn_router(app).await;

    let report = Suite::new(client(&svc.base_url), fast(true)).run().await;
    assert!(report.is_success(), "{report}");
    assert_eq!(report.passed(), CASES.len());
}

#[tokio::test]
async fn duration_family_matches_by_prefix() {
    // a histogram under another unit name still satisfies the scrape check
    let scrape = "# TYPE http_request_duration_ms histogram\n\
                  http_request_duration_ms_count 3\n\
                  http_requests_total 3\nservice_up 1\nactive_users 0\n";
    let app = Router::new()
        .route("/health", get(|| async { "{}" }))
        .route("/metrics", get(move || async move { scrape }));
    let svc = spawn_router(app).await;

    let report = Suite::new(client(&svc.base_url), fast(false)).run().await;
    assert!(report.case("health").unwrap().passed());
    assert!(report.case("metrics_series_present").unwrap().passed(), "{report}");
}
