#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use usersvc_server::obs::HttpMetrics;

#[test]
fn families_have_help_and_type() {
    let m = HttpMetrics::default();
    let text = m.render();
    for (name, kind) in [
        ("http_requests_total", "counter"),
        ("http_request_duration_seconds", "histogram"),
        ("http_errors_total", "counter"),
        ("security_events_total", "counter"),
        ("service_up", "gauge"),
        ("active_users", "gauge"),
    ] {
        assert!(text.contains(&format!("# TYPE {name} {kind}")), "{name} missing");
    }
}

#[test]
fn errors_only_counted_from_400() {
    let m = HttpMetrics::default();
    m.observe_request("GET", "/users", 200, Duration::from_millis(3));
    m.observe_request("GET", "/users/:id", 404, Duration::from_millis(3));
    m.observe_request("POST", "/users", 500, Duration::from_millis(3));

    assert_eq!(m.requests.total(), 3);
    assert_eq!(m.errors.total(), 2);
}

#[test]
fn histogram_buckets_are_cumulative_seconds() {
    let m = HttpMetrics::default();
    m.observe_request("GET", "/users", 200, Duration::from_millis(2));
    m.observe_request("GET", "/users", 200, Duration::from_millis(60));

    let text = m.render();
    let bucket = |le: &str| {
        format!(r#"http_request_duration_seconds_bucket{{endpoint="/users",method="GET",le="{le}"}}"#)
    };
    assert!(text.contains(&format!("{} 1", bucket("0.005"))));
    assert!(text.contains(&format!("{} 2", bucket("0.075"))));
    assert!(text.contains(&format!("{} 2", bucket("+Inf"))));
    assert!(text.contains(r#"http_request_duration_seconds_count{endpoint="/users",method="GET"} 2"#));
}

#[test]
fn label_values_are_escaped() {
    let m = HttpMetrics::default();
    m.security_event("quote\"d");
    assert!(m.render().contains(r#"security_events_total{type="quote\"d"} 1"#));
}

#[test]
fn gauges_render_without_labels() {
    let m = HttpMetrics::default();
    m.service_up.set(1);
    m.active_users.set(4);
    let text = m.render();
    assert!(text.lines().any(|l| l == "service_up 1"));
    assert!(text.lines().any(|l| l == "active_users 4"));
}
