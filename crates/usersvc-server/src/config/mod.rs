//! Service config loader (strict parsing + env overrides).

pub mod schema;

use std::fs;

use usersvc_core::error::{Result, UsersError};

pub use schema::{
    CorsSection, Environment, InspectionSection, RateLimitSection, ServiceConfig, ServiceSection,
};

pub fn load_from_file(path: &str) -> Result<ServiceConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| UsersError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServiceConfig> {
    let cfg: ServiceConfig = serde_yaml::from_str(s)
        .map_err(|e| UsersError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// File config when a path is given, defaults otherwise; process env applied on top.
pub fn load(path: Option<&str>) -> Result<ServiceConfig> {
    let mut cfg = match path {
        Some(p) => {
            let cfg = load_from_file(p)?;
            tracing::info!(path = %p, "loaded configuration");
            cfg
        }
        None => {
            tracing::info!("no config file specified, using defaults");
            ServiceConfig::default()
        }
    };
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

/// Apply `USERS_*` overrides. `lookup` abstracts the environment for tests.
pub fn apply_env_overrides<F>(cfg: &mut ServiceConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("USERS_LISTEN") {
        cfg.service.listen = v;
    }
    if let Some(v) = lookup("USERS_INSTANCE_ID") {
        cfg.service.instance_id = v;
    }
    if let Some(v) = lookup("USERS_ENVIRONMENT") {
        cfg.service.environment = match v.to_ascii_lowercase().as_str() {
            "development" => Environment::Development,
            "production" => Environment::Production,
            other => {
                return Err(UsersError::Config(format!(
                    "USERS_ENVIRONMENT must be development or production, got {other}"
                )))
            }
        };
    }
    if let Some(v) = lookup("USERS_CORS_ORIGINS") {
        cfg.cors.origins = v
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(v) = lookup("USERS_RATE_LIMIT_ENABLED") {
        cfg.rate_limit.enabled = v
            .parse()
            .map_err(|e| UsersError::Config(format!("USERS_RATE_LIMIT_ENABLED: {e}")))?;
    }
    Ok(())
}
