use std::net::SocketAddr;

use axum::http::HeaderValue;
use serde::Deserialize;
use usersvc_core::error::{Result, UsersError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub version: u32,

    #[serde(default)]
    pub service: ServiceSection,

    #[serde(default)]
    pub rate_limit: RateLimitSection,

    #[serde(default)]
    pub inspection: InspectionSection,

    #[serde(default)]
    pub cors: CorsSection,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            version: 1,
            service: ServiceSection::default(),
            rate_limit: RateLimitSection::default(),
            inspection: InspectionSection::default(),
            cors: CorsSection::default(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(UsersError::UnsupportedVersion);
        }
        self.service.validate()?;
        self.rate_limit.validate()?;
        self.cors.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    /// Internal error detail is withheld from clients.
    Production,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Reported by `/health` as `service`.
    #[serde(default = "default_name")]
    pub name: String,

    /// Reported by `/health` and the `X-Instance-ID` header.
    #[serde(default = "default_instance_id")]
    pub instance_id: String,

    #[serde(default)]
    pub environment: Environment,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            name: default_name(),
            instance_id: default_instance_id(),
            environment: Environment::default(),
        }
    }
}

impl ServiceSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if self.name.trim().is_empty() {
            return Err(UsersError::Config("service.name must not be empty".into()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            UsersError::Config(format!("service.listen must be a valid SocketAddr: {e}"))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}
fn default_name() -> String {
    "users".into()
}
fn default_instance_id() -> String {
    "unknown".into()
}

/// Per-client request budgets, one per route class, in requests per minute.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSection {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_list_per_minute")]
    pub list_per_minute: u32,

    #[serde(default = "default_read_per_minute")]
    pub read_per_minute: u32,

    #[serde(default = "default_create_per_minute")]
    pub create_per_minute: u32,

    #[serde(default = "default_update_per_minute")]
    pub update_per_minute: u32,

    #[serde(default = "default_delete_per_minute")]
    pub delete_per_minute: u32,

    /// Upper bound on tracked client buckets before idle ones are evicted.
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            enabled: false,
            list_per_minute: default_list_per_minute(),
            read_per_minute: default_read_per_minute(),
            create_per_minute: default_create_per_minute(),
            update_per_minute: default_update_per_minute(),
            delete_per_minute: default_delete_per_minute(),
            max_clients: default_max_clients(),
        }
    }
}

impl RateLimitSection {
    pub fn validate(&self) -> Result<()> {
        let budgets = [
            ("list_per_minute", self.list_per_minute),
            ("read_per_minute", self.read_per_minute),
            ("create_per_minute", self.create_per_minute),
            ("update_per_minute", self.update_per_minute),
            ("delete_per_minute", self.delete_per_minute),
        ];
        for (key, v) in budgets {
            if !(1..=100_000).contains(&v) {
                return Err(UsersError::Config(format!(
                    "rate_limit.{key} must be between 1 and 100000"
                )));
            }
        }
        if self.max_clients == 0 {
            return Err(UsersError::Config("rate_limit.max_clients must be > 0".into()));
        }
        Ok(())
    }
}

fn default_list_per_minute() -> u32 {
    30
}
fn default_read_per_minute() -> u32 {
    60
}
fn default_create_per_minute() -> u32 {
    10
}
fn default_update_per_minute() -> u32 {
    20
}
fn default_delete_per_minute() -> u32 {
    10
}
fn default_max_clients() -> usize {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InspectionSection {
    /// Log and count request payloads carrying injection markers.
    #[serde(default = "default_inspection_enabled")]
    pub enabled: bool,
}

impl Default for InspectionSection {
    fn default() -> Self {
        Self {
            enabled: default_inspection_enabled(),
        }
    }
}

fn default_inspection_enabled() -> bool {
    true
}

/// Browser origins allowed to call the API cross-site. Empty allows none.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsSection {
    #[serde(default = "default_cors_origins")]
    pub origins: Vec<String>,
}

impl Default for CorsSection {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

impl CorsSection {
    pub fn validate(&self) -> Result<()> {
        self.header_values().map(|_| ())
    }

    /// Origins as header values, ready for the CORS layer.
    pub fn header_values(&self) -> Result<Vec<HeaderValue>> {
        self.origins
            .iter()
            .map(|o| {
                if o.is_empty() || o == "*" {
                    return Err(UsersError::Config(format!(
                        "cors.origins entry {o:?} must be an explicit origin"
                    )));
                }
                HeaderValue::from_str(o)
                    .map_err(|e| UsersError::Config(format!("cors.origins entry {o:?}: {e}")))
            })
            .collect()
    }
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:8080".into()]
}
