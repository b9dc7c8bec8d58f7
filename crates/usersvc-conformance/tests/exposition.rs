#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use usersvc_conformance::Exposition;

const SCRAPE: &str = r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total{endpoint="/users",method="GET",status="200"} 20
http_requests_total{endpoint="/users",method="POST",status="201"} 2
http_requests_total{endpoint="/users/:id",method="GET",status="404"} 1
# HELP http_request_duration_seconds HTTP request latency
# TYPE http_request_duration_seconds histogram
http_request_duration_seconds_bucket{endpoint="/users",method="GET",le="0.005"} 19
http_request_duration_seconds_bucket{endpoint="/users",method="GET",le="+Inf"} 20
http_request_duration_seconds_sum{endpoint="/users",method="GET"} 0.0421
http_request_duration_seconds_count{endpoint="/users",method="GET"} 20
# TYPE security_events_total counter
security_events_total{type="say \"hi\", then\\leave"} 1
# TYPE service_up gauge
service_up 1
active_users 3 1700000000000
"#;

#[test]
fn sums_across_label_sets() {
    let e = Exposition::parse(SCRAPE).unwrap();
    assert_eq!(e.sum("http_requests_total"), 23.0);
    assert_eq!(e.sum("http_request_duration_seconds_count"), 20.0);
    assert_eq!(e.sum("nope"), 0.0);
}

#[test]
fn exact_label_lookup() {
    let e = Exposition::parse(SCRAPE).unwrap();
    let v = e.get(
        "http_requests_total",
        &[("status", "404"), ("method", "GET"), ("endpoint", "/users/:id")],
    );
    assert_eq!(v, Some(1.0));
    assert_eq!(e.get("http_requests_total", &[("status", "404")]), None);
}

#[test]
fn families_by_type_line_or_series() {
    let e = Exposition::parse(SCRAPE).unwrap();
    assert!(e.has_family("http_requests_total"));
    assert!(e.has_family("http_request_duration_seconds"));
    assert!(e.has_family("service_up"));
    // no TYPE line, only a sample with a timestamp
    assert!(e.has_family("active_users"));
    assert!(!e.has_family("http_errors_total"));
}

#[test]
fn escaped_label_values_and_inf() {
    let e = Exposition::parse(SCRAPE).unwrap();
    let ev = e
        .samples()
        .iter()
        .find(|s| s.name == "security_events_total")
        .unwrap();
    assert_eq!(ev.label("type"), Some(r#"say "hi", then\leave"#));

    let inf = e
        .samples()
        .iter()
        .find(|s| s.label("le") == Some("+Inf"))
        .unwrap();
    assert_eq!(inf.value, 20.0);
}

#[test]
fn garbage_is_a_schema_mismatch() {
    let err = Exposition::parse("{\"status\":\"ok\"}").unwrap_err();
    assert_eq!(err.kind(), "schema_mismatch");

    let err = Exposition::parse("up{job=\"x} 1").unwrap_err();
    assert_eq!(err.kind(), "schema_mismatch");

    let err = Exposition::parse("up not_a_number").unwrap_err();
    assert_eq!(err.kind(), "schema_mismatch");
}

#[test]
fn trailing_star_matches_by_prefix() {
    let e = Exposition::parse(SCRAPE).unwrap();
    assert!(e.has_family_matching("http_request_duration*"));
    assert!(e.has_family_matching("service_up"));
    assert!(!e.has_family_matching("http_response*"));

    let other_unit = Exposition::parse("http_request_duration_ms_sum 1.5\n").unwrap();
    assert!(other_unit.has_family_matching("http_request_duration*"));
    assert!(!other_unit.has_family("http_request_duration_seconds"));
}
