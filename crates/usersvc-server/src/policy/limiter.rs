//! Per-client request limiter.
//!
//! One leaky bucket per (client IP, route class). Budgets are expressed per
//! minute and refill continuously. Rejections carry a Retry-After hint in
//! whole seconds (min 1).
//!
//! The client map is trimmed back to `max_clients` at most once per
//! [`TRIM_INTERVAL`]. Fully refilled buckets go first, then the fullest ones,
//! so drained clients keep their state longest.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::Method;
use dashmap::DashMap;

use crate::config::RateLimitSection;

/// Route families that get their own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    List,
    Read,
    Create,
    Update,
    Delete,
}

impl RouteClass {
    /// Classify a request by method and matched route. Unlisted routes are not limited.
    pub fn classify(method: &Method, route: &str) -> Option<Self> {
        match (method.as_str(), route) {
            ("GET", "/users") => Some(RouteClass::List),
            ("POST", "/users") => Some(RouteClass::Create),
            ("GET", "/users/:id") => Some(RouteClass::Read),
            ("PUT", "/users/:id") => Some(RouteClass::Update),
            ("DELETE", "/users/:id") => Some(RouteClass::Delete),
            _ => None,
        }
    }
}

/// Minimum spacing between two trims of the client map.
pub const TRIM_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct LeakyBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last: Instant,
}

impl LeakyBucket {
    pub fn per_minute(budget: u32) -> Self {
        let cap = budget.max(1) as f64;
        Self {
            capacity: cap,
            tokens: cap,
            refill_per_sec: cap / 60.0,
            last: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
    }

    /// Take one token. Err carries retry-after seconds (ceil, min 1).
    pub fn try_take(&mut self) -> Result<(), u64> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let missing = 1.0 - self.tokens;
            let wait = (missing / self.refill_per_sec).ceil();
            Err(wait.max(1.0) as u64)
        }
    }

    /// Share of capacity available right now, in `0.0..=1.0`.
    pub fn fill(&mut self) -> f64 {
        self.refill();
        self.tokens / self.capacity
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    cfg: RateLimitSection,
    buckets: DashMap<(IpAddr, RouteClass), Mutex<LeakyBucket>>,
    started: Instant,
    /// Millis since `started` before which no trim runs.
    next_trim_ms: AtomicU64,
}

impl RateLimiter {
    pub fn new(cfg: RateLimitSection) -> Self {
        Self {
            cfg,
            buckets: DashMap::new(),
            started: Instant::now(),
            next_trim_ms: AtomicU64::new(0),
        }
    }

    pub fn enabled(&self) -> bool {
        self.cfg.enabled
    }

    fn budget(&self, class: RouteClass) -> u32 {
        match class {
            RouteClass::List => self.cfg.list_per_minute,
            RouteClass::Read => self.cfg.read_per_minute,
            RouteClass::Create => self.cfg.create_per_minute,
            RouteClass::Update => self.cfg.update_per_minute,
            RouteClass::Delete => self.cfg.delete_per_minute,
        }
    }

    /// Ok if the request may proceed, otherwise retry-after seconds.
    pub fn check(&self, ip: IpAddr, class: RouteClass) -> Result<(), u64> {
        if !self.cfg.enabled {
            return Ok(());
        }

        let entry = self
            .buckets
            .entry((ip, class))
            .or_insert_with(|| Mutex::new(LeakyBucket::per_minute(self.budget(class))));
        // Poisoned mutex means a logic bug; deny instead of panicking.
        let verdict = match entry.value().lock() {
            Ok(mut b) => b.try_take(),
            Err(_) => Err(1),
        };
        // the shard guard must be gone before the map is scanned
        drop(entry);

        if self.buckets.len() > self.cfg.max_clients && self.claim_trim() {
            self.trim();
        }

        verdict
    }

    /// True for the one caller allowed to trim in the current interval.
    fn claim_trim(&self) -> bool {
        let now = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let next = self.next_trim_ms.load(Ordering::Relaxed);
        if now < next {
            return false;
        }
        let until = now.saturating_add(u64::try_from(TRIM_INTERVAL.as_millis()).unwrap_or(u64::MAX));
        self.next_trim_ms
            .compare_exchange(next, until, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Shrink the map to `max_clients`, fullest buckets first.
    fn trim(&self) {
        let before = self.buckets.len();
        let mut ranked: Vec<((IpAddr, RouteClass), f64)> = self
            .buckets
            .iter()
            .map(|r| {
                // poisoned buckets rank as full so they are dropped first
                let fill = r.value().lock().map(|mut b| b.fill()).unwrap_or(f64::MAX);
                (*r.key(), fill)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        // every fully refilled bucket, and at least enough to get back under the cap
        let full = ranked.iter().take_while(|(_, fill)| *fill >= 1.0).count();
        let excess = ranked.len().saturating_sub(self.cfg.max_clients);
        for (key, _) in ranked.into_iter().take(full.max(excess)) {
            self.buckets.remove(&key);
        }
        tracing::warn!(before, after = self.buckets.len(), "rate limiter client map trimmed");
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}
