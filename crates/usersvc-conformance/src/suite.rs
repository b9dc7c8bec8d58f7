//! The ordered conformance cases.
//!
//! Cases run strictly one after another. A case whose prerequisite failed is
//! reported as skipped with the name of the failed prerequisite.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

use crate::client::{UserView, UsersClient};
use crate::error::{ConformanceError, Result};
use crate::exposition::Exposition;
use crate::report::{Outcome, Report};

/// Case names in run order.
pub const CASES: [&str; 12] = [
    "wait_ready",
    "health",
    "create_user",
    "list_contains_created",
    "get_created",
    "update_user",
    "get_after_update",
    "unknown_user_is_error",
    "distinct_ids",
    "delete_user",
    "traffic_counts_requests",
    "metrics_series_present",
];

/// Families every scrape must carry. A trailing `*` matches by prefix.
pub const REQUIRED_FAMILIES: [&str; 4] = [
    "http_requests_total",
    "http_request_duration*",
    "service_up",
    "active_users",
];

const UNKNOWN_ID: u64 = 999;
const READY_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// GET `/users` calls issued by the traffic case.
    pub traffic: u32,
    /// Pause between traffic calls.
    pub interval: Duration,
    /// How long to wait for `/health` before giving up.
    pub ready_timeout: Duration,
    /// Require the first created user to get id 1, with literal emails.
    pub expect_fresh: bool,
    pub skip_delete: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            traffic: 20,
            interval: Duration::from_millis(100),
            ready_timeout: Duration::from_secs(5),
            expect_fresh: false,
            skip_delete: false,
        }
    }
}

pub struct Suite {
    client: UsersClient,
    cfg: SuiteConfig,
    /// Appended to email local parts so reruns against a live service do not collide.
    tag: Option<String>,
}

impl Suite {
    pub fn new(client: UsersClient, cfg: SuiteConfig) -> Self {
        let tag = if cfg.expect_fresh {
            None
        } else {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or_default();
            Some(format!("{nanos:x}"))
        };
        Self { client, cfg, tag }
    }

    fn email(&self, local: &str) -> String {
        match &self.tag {
            Some(tag) => format!("{local}+{tag}@example.com"),
            None => format!("{local}@example.com"),
        }
    }

    pub async fn run(&self) -> Report {
        let mut report = Report::new(self.client.base_url());

        if step(&mut report, "wait_ready", self.wait_ready()).await.is_none() {
            for &name in &CASES[1..] {
                report.skip(name, "wait_ready failed");
            }
            return report;
        }

        step(&mut report, "health", self.health()).await;

        let alice = step(&mut report, "create_user", self.create_user()).await;
        match &alice {
            Some(user) => {
                step(&mut report, "list_contains_created", self.list_contains(user)).await;
                step(&mut report, "get_created", self.get_matches(user)).await;
                match step(&mut report, "update_user", self.update_user(user)).await {
                    Some(updated) => {
                        step(&mut report, "get_after_update", self.get_matches(&updated)).await;
                    }
                    None => report.skip("get_after_update", "update_user failed"),
                }
            }
            None => {
                for name in ["list_contains_created", "get_created", "update_user", "get_after_update"] {
                    report.skip(name, "create_user failed");
                }
            }
        }

        step(&mut report, "unknown_user_is_error", self.unknown_user()).await;

        let bob = match &alice {
            Some(first) => step(&mut report, "distinct_ids", self.distinct_ids(first)).await,
            None => {
                report.skip("distinct_ids", "create_user failed");
                None
            }
        };

        if self.cfg.skip_delete {
            report.skip("delete_user", "disabled by --skip-delete");
        } else if let Some(user) = &bob {
            step(&mut report, "delete_user", self.delete_user(user)).await;
        } else {
            report.skip("delete_user", "distinct_ids failed");
        }

        step(&mut report, "traffic_counts_requests", self.traffic()).await;
        step(&mut report, "metrics_series_present", self.metrics_series()).await;

        report
    }

    /// Poll `/health` until it answers 2xx or the deadline passes.
    async fn wait_ready(&self) -> Result<()> {
        let deadline = Instant::now() + self.cfg.ready_timeout;
        loop {
            let last = match self.client.health_status().await {
                Ok(status) if (200..300).contains(&status) => return Ok(()),
                Ok(status) => format!("health answered {status}"),
                Err(e) => e.to_string(),
            };
            if Instant::now() + READY_POLL > deadline {
                return Err(ConformanceError::Connection {
                    url: self.client.base_url().to_string(),
                    detail: format!(
                        "not ready within {:?}; last attempt: {last}",
                        self.cfg.ready_timeout
                    ),
                });
            }
            tokio::time::sleep(READY_POLL).await;
        }
    }

    async fn health(&self) -> Result<()> {
        let body = self.client.health().await?;
        tracing::info!(fields = body.len(), status = ?body.get("status"), "health");
        Ok(())
    }

    async fn create_user(&self) -> Result<UserView> {
        let email = self.email("alice");
        let user = self.client.create_user("Alice Dupont", &email).await?;
        expect_fields("POST /users", &user, "Alice Dupont", &email)?;
        if self.cfg.expect_fresh && user.id != 1 {
            return Err(ConformanceError::schema(
                "POST /users",
                format!("first user on a fresh service got id {}, want 1", user.id),
            ));
        }
        Ok(user)
    }

    async fn list_contains(&self, user: &UserView) -> Result<()> {
        let users = self.client.list_users().await?;
        if users.iter().any(|u| u == user) {
            Ok(())
        } else {
            Err(ConformanceError::schema(
                "GET /users",
                format!("user {} missing from {} listed", user.id, users.len()),
            ))
        }
    }

    async fn get_matches(&self, want: &UserView) -> Result<()> {
        let got = self.client.get_user(want.id).await?;
        let context = format!("GET /users/{}", want.id);
        if got.id != want.id {
            return Err(ConformanceError::schema(
                context,
                format!("id {} != {}", got.id, want.id),
            ));
        }
        expect_fields(&context, &got, &want.name, &want.email)
    }

    async fn update_user(&self, user: &UserView) -> Result<UserView> {
        let name = "Alice Dupont-Updated";
        let email = self.email("alice.updated");
        let updated = self.client.update_user(user.id, name, &email).await?;
        let context = format!("PUT /users/{}", user.id);
        if updated.id != user.id {
            return Err(ConformanceError::schema(
                context,
                format!("id changed from {} to {}", user.id, updated.id),
            ));
        }
        expect_fields(&context, &updated, name, &email)?;
        Ok(updated)
    }

    async fn unknown_user(&self) -> Result<()> {
        let raw = self.client.get_user_raw(UNKNOWN_ID).await?;
        if raw.is_success() {
            return Err(ConformanceError::UnexpectedStatus {
                method: "GET".into(),
                path: format!("/users/{UNKNOWN_ID}"),
                expected: "non-2xx".into(),
                actual: raw.status,
                body: raw.body,
            });
        }
        Ok(())
    }

    async fn distinct_ids(&self, first: &UserView) -> Result<UserView> {
        let email = self.email("bob");
        let bob = self.client.create_user("Bob Martin", &email).await?;
        expect_fields("POST /users", &bob, "Bob Martin", &email)?;
        if bob.id == first.id {
            return Err(ConformanceError::schema(
                "POST /users",
                format!("second user reused id {}", bob.id),
            ));
        }
        Ok(bob)
    }

    async fn delete_user(&self, user: &UserView) -> Result<()> {
        self.client.delete_user(user.id).await?;
        let raw = self.client.get_user_raw(user.id).await?;
        if raw.is_success() {
            return Err(ConformanceError::UnexpectedStatus {
                method: "GET".into(),
                path: format!("/users/{}", user.id),
                expected: "non-2xx after delete".into(),
                actual: raw.status,
                body: raw.body,
            });
        }
        Ok(())
    }

    /// Issue N list calls and require the request counter to grow by at least N.
    async fn traffic(&self) -> Result<()> {
        let before = self.requests_total().await?;
        for i in 0..self.cfg.traffic {
            self.client.list_users().await?;
            if i + 1 < self.cfg.traffic {
                tokio::time::sleep(self.cfg.interval).await;
            }
        }
        let after = self.requests_total().await?;

        let delta = after - before;
        if delta < f64::from(self.cfg.traffic) {
            return Err(ConformanceError::schema(
                "GET /metrics",
                format!(
                    "http_requests_total grew by {delta} after {} requests",
                    self.cfg.traffic
                ),
            ));
        }
        tracing::info!(before, after, "request counter advanced");
        Ok(())
    }

    async fn requests_total(&self) -> Result<f64> {
        let text = self.client.metrics_text().await?;
        let expo = Exposition::parse(&text)?;
        if !expo.has_family("http_requests_total") {
            return Err(ConformanceError::schema(
                "GET /metrics",
                "http_requests_total missing",
            ));
        }
        Ok(expo.sum("http_requests_total"))
    }

    async fn metrics_series(&self) -> Result<()> {
        let text = self.client.metrics_text().await?;
        let expo = Exposition::parse(&text)?;
        let missing: Vec<&str> = REQUIRED_FAMILIES
            .iter()
            .copied()
            .filter(|f| !expo.has_family_matching(f))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConformanceError::schema(
                "GET /metrics",
                format!("missing families: {}", missing.join(", ")),
            ))
        }
    }
}

/// Run one case, timing it into the report. Returns the case value on success.
async fn step<T, F>(report: &mut Report, name: &'static str, case: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let result = case.await;
    let elapsed = started.elapsed();
    match result {
        Ok(v) => {
            report.record(name, Outcome::Passed, elapsed);
            Some(v)
        }
        Err(e) => {
            report.record(name, Outcome::Failed(e), elapsed);
            None
        }
    }
}

fn expect_fields(context: &str, user: &UserView, name: &str, email: &str) -> Result<()> {
    if user.name != name {
        return Err(ConformanceError::schema(
            context,
            format!("name {:?}, want {name:?}", user.name),
        ));
    }
    if user.email != email {
        return Err(ConformanceError::schema(
            context,
            format!("email {:?}, want {email:?}", user.email),
        ));
    }
    Ok(())
}
