//! Shared application state for the users service.
//!
//! Cloned into every handler; everything heavy sits behind one `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use usersvc_core::error::{Result, UsersError};
use usersvc_core::{MemoryStore, UserStore};

use crate::api::ApiError;
use crate::config::{Environment, ServiceConfig};
use crate::obs::HttpMetrics;
use crate::policy::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServiceConfig,
    store: Arc<dyn UserStore>,
    metrics: HttpMetrics,
    limiter: RateLimiter,
    draining: AtomicBool,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    pub fn new(cfg: ServiceConfig) -> Result<Self> {
        Self::with_store(cfg, Arc::new(MemoryStore::new()))
    }

    /// Returns Result so main can handle a bad config without panicking.
    pub fn with_store(cfg: ServiceConfig, store: Arc<dyn UserStore>) -> Result<Self> {
        cfg.validate()?;

        let limiter = RateLimiter::new(cfg.rate_limit.clone());
        if limiter.enabled() {
            tracing::info!(
                list = cfg.rate_limit.list_per_minute,
                read = cfg.rate_limit.read_per_minute,
                create = cfg.rate_limit.create_per_minute,
                update = cfg.rate_limit.update_per_minute,
                delete = cfg.rate_limit.delete_per_minute,
                "per-client rate limiting enabled"
            );
        }

        let metrics = HttpMetrics::default();
        metrics.service_up.set(1);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                store,
                metrics,
                limiter,
                draining: AtomicBool::new(false),
            }),
        })
    }

    pub fn cfg(&self) -> &ServiceConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> &dyn UserStore {
        self.inner.store.as_ref()
    }

    pub fn metrics(&self) -> &HttpMetrics {
        &self.inner.metrics
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    /// Wrap an error for the client, withholding internals in production.
    pub fn reject(&self, err: UsersError) -> ApiError {
        let redact = self.inner.cfg.service.environment == Environment::Production;
        ApiError::new(err, redact)
    }

    /// Re-read the user count into the `active_users` gauge.
    pub async fn refresh_user_count(&self) {
        match self.store().count().await {
            Ok(n) => self
                .metrics()
                .active_users
                .set(i64::try_from(n).unwrap_or(i64::MAX)),
            Err(e) => tracing::warn!(error = %e, "user count refresh failed"),
        }
    }

    /// Flip to draining: `/health` turns 503 and `service_up` drops to 0.
    pub fn mark_draining(&self) {
        self.inner.draining.store(true, Ordering::Relaxed);
        self.inner.metrics.service_up.set(0);
    }

    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Relaxed)
    }
}
