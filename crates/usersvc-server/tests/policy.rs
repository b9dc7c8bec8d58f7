#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::{IpAddr, Ipv4Addr};

use axum::http::Method;
use usersvc_server::config::RateLimitSection;
use usersvc_server::policy::limiter::LeakyBucket;
use usersvc_server::policy::{find_suspicious, RateLimiter, RouteClass};

fn ip(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
}

fn enabled(create: u32) -> RateLimitSection {
    RateLimitSection {
        enabled: true,
        create_per_minute: create,
        ..RateLimitSection::default()
    }
}

#[test]
fn classify_routes() {
    assert_eq!(RouteClass::classify(&Method::GET, "/users"), Some(RouteClass::List));
    assert_eq!(RouteClass::classify(&Method::POST, "/users"), Some(RouteClass::Create));
    assert_eq!(RouteClass::classify(&Method::GET, "/users/:id"), Some(RouteClass::Read));
    assert_eq!(RouteClass::classify(&Method::PUT, "/users/:id"), Some(RouteClass::Update));
    assert_eq!(
        RouteClass::classify(&Method::DELETE, "/users/:id"),
        Some(RouteClass::Delete)
    );
    assert_eq!(RouteClass::classify(&Method::GET, "/health"), None);
    assert_eq!(RouteClass::classify(&Method::GET, "/metrics"), None);
}

#[test]
fn bucket_drains_then_reports_retry_after() {
    let mut b = LeakyBucket::per_minute(2);
    assert!(b.try_take().is_ok());
    assert!(b.try_take().is_ok());
    let wait = b.try_take().unwrap_err();
    // 2/min refills one token in ~30s
    assert!((1..=30).contains(&wait), "wait={wait}");
}

#[test]
fn disabled_limiter_never_rejects() {
    let limiter = RateLimiter::new(RateLimitSection::default());
    for _ in 0..1_000 {
        assert!(limiter.check(ip(1), RouteClass::Create).is_ok());
    }
    assert_eq!(limiter.tracked_clients(), 0);
}

#[test]
fn budgets_are_per_client_and_class() {
    let limiter = RateLimiter::new(enabled(3));
    for _ in 0..3 {
        assert!(limiter.check(ip(1), RouteClass::Create).is_ok());
    }
    assert!(limiter.check(ip(1), RouteClass::Create).is_err());

    assert!(limiter.check(ip(2), RouteClass::Create).is_ok());
    assert!(limiter.check(ip(1), RouteClass::List).is_ok());
    assert_eq!(limiter.tracked_clients(), 3);
}

#[test]
fn trim_keeps_drained_clients_and_caps_the_map() {
    let cfg = RateLimitSection {
        max_clients: 2,
        ..enabled(10)
    };
    let limiter = RateLimiter::new(cfg);

    // drain client 1 so it ranks emptiest
    for _ in 0..10 {
        let _ = limiter.check(ip(1), RouteClass::Create);
    }
    limiter.check(ip(2), RouteClass::List).unwrap();
    limiter.check(ip(3), RouteClass::List).unwrap();

    // one of the barely used buckets went, the drained one stayed
    assert_eq!(limiter.tracked_clients(), 2);
    assert!(limiter.check(ip(1), RouteClass::Create).is_err());
}

#[test]
fn trim_runs_at_most_once_per_interval() {
    let cfg = RateLimitSection {
        max_clients: 2,
        ..enabled(10)
    };
    let limiter = RateLimiter::new(cfg);

    for last in 1..=3 {
        limiter.check(ip(last), RouteClass::List).unwrap();
    }
    assert_eq!(limiter.tracked_clients(), 2);

    // inside the same interval the map may grow past the cap again
    for last in 4..=6 {
        limiter.check(ip(last), RouteClass::List).unwrap();
    }
    assert_eq!(limiter.tracked_clients(), 5);
}

#[test]
fn bucket_fill_tracks_spent_tokens() {
    let mut b = LeakyBucket::per_minute(4);
    assert!(b.fill() >= 1.0);
    b.try_take().unwrap();
    b.try_take().unwrap();
    let fill = b.fill();
    assert!((0.5..0.51).contains(&fill), "fill={fill}");
}

#[test]
fn suspicious_markers_detected() {
    assert_eq!(find_suspicious(["Alice Dupont", "alice@example.com"]), None);
    assert_eq!(find_suspicious(["<SCRIPT>alert(1)</script>"]), Some("<script"));
    assert_eq!(find_suspicious(["ok", "x; DROP TABLE users"]), Some(";"));
    assert_eq!(find_suspicious(["/users/../../etc/passwd"]), Some("../"));
}

#[test]
fn apostrophes_are_flagged_but_still_valid_names() {
    assert_eq!(find_suspicious(["Miles O'Brien"]), Some("'"));
    assert!(usersvc_core::model::validate_name("Miles O'Brien"));
}
