//! Centralized configuration for the session authority.
//!
//! All configuration is loaded from environment variables and validated
//! at startup.

use crate::error::AuthError;
use crate::jwt::claims::{ACCESS_TOKEN_TTL, DEFAULT_ISSUER, REFRESH_TOKEN_TTL};
use rust_common::TracingConfig;
use std::env;
use std::time::Duration;

/// Session authority configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // JWT settings
    /// Issuer written into every claim set
    pub jwt_issuer: String,
    /// Access token TTL
    pub access_token_ttl: Duration,
    /// Refresh token TTL
    pub refresh_token_ttl: Duration,

    // Credentials
    /// bcrypt work factor for stored passwords
    pub bcrypt_cost: u32,

    // Recovery
    /// Link prefix mailed with recovery tokens
    pub recovery_link_base: String,
    /// Answer unknown recovery logins with success instead of NotFound
    pub recovery_mask_unknown_login: bool,

    // Notification delivery
    /// Webhook endpoint of the mail relay, if any
    pub notifier_webhook_url: Option<String>,
    /// Pending deliveries held before new ones are dropped
    pub notifier_queue_capacity: usize,
    /// Concurrent delivery workers
    pub notifier_workers: usize,
    /// Time allowed for one request to the mail relay
    pub notifier_timeout: Duration,
    /// Time allowed for in-flight deliveries at shutdown
    pub shutdown_timeout: Duration,

    // Logging
    /// Tracing subscriber settings
    pub tracing: TracingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jwt_issuer: DEFAULT_ISSUER.to_string(),
            access_token_ttl: ACCESS_TOKEN_TTL,
            refresh_token_ttl: REFRESH_TOKEN_TTL,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            recovery_link_base: DEFAULT_RECOVERY_LINK_BASE.to_string(),
            recovery_mask_unknown_login: false,
            notifier_webhook_url: None,
            notifier_queue_capacity: 256,
            notifier_workers: 4,
            notifier_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
            tracing: TracingConfig::default().with_service_name(SERVICE_NAME),
        }
    }
}

/// Service name used in logs.
pub const SERVICE_NAME: &str = "session-authority";

const DEFAULT_RECOVERY_LINK_BASE: &str = "http://localhost:8080/api/v1/recoverPassword";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let jwt_issuer = lookup("JWT_ISSUER").unwrap_or(defaults.jwt_issuer);
        let access_token_ttl = Duration::from_secs(parse_var(
            &lookup,
            "ACCESS_TOKEN_TTL",
            defaults.access_token_ttl.as_secs(),
        )?);
        let refresh_token_ttl = Duration::from_secs(parse_var(
            &lookup,
            "REFRESH_TOKEN_TTL",
            defaults.refresh_token_ttl.as_secs(),
        )?);
        if access_token_ttl.is_zero() || refresh_token_ttl.is_zero() {
            return Err(AuthError::config("token TTLs must be positive"));
        }

        let bcrypt_cost = parse_var(&lookup, "BCRYPT_COST", defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(AuthError::config(format!(
                "BCRYPT_COST must be between 4 and 31, got {bcrypt_cost}"
            )));
        }

        let recovery_link_base =
            lookup("RECOVERY_LINK_BASE").unwrap_or(defaults.recovery_link_base);
        let recovery_mask_unknown_login = parse_var(
            &lookup,
            "RECOVERY_MASK_UNKNOWN_LOGIN",
            defaults.recovery_mask_unknown_login,
        )?;

        let notifier_webhook_url = lookup("NOTIFIER_WEBHOOK_URL").filter(|url| !url.is_empty());
        let notifier_queue_capacity = parse_var(
            &lookup,
            "NOTIFIER_QUEUE_CAPACITY",
            defaults.notifier_queue_capacity,
        )?;
        let notifier_workers = parse_var(&lookup, "NOTIFIER_WORKERS", defaults.notifier_workers)?;
        if notifier_queue_capacity == 0 || notifier_workers == 0 {
            return Err(AuthError::config(
                "NOTIFIER_QUEUE_CAPACITY and NOTIFIER_WORKERS must be positive",
            ));
        }
        let notifier_timeout = Duration::from_millis(parse_var(
            &lookup,
            "NOTIFIER_TIMEOUT_MS",
            u64::try_from(defaults.notifier_timeout.as_millis()).unwrap_or(u64::MAX),
        )?);
        if notifier_timeout.is_zero() {
            return Err(AuthError::config("NOTIFIER_TIMEOUT_MS must be positive"));
        }
        let shutdown_timeout = Duration::from_secs(parse_var(
            &lookup,
            "SHUTDOWN_TIMEOUT",
            defaults.shutdown_timeout.as_secs(),
        )?);

        let log_level =
            lookup("LOG_LEVEL").unwrap_or_else(|| defaults.tracing.log_level.clone());
        let mut tracing = defaults.tracing.with_log_level(log_level);
        if parse_var(&lookup, "LOG_JSON", false)? {
            tracing = tracing.with_json_output();
        }

        Ok(Self {
            jwt_issuer,
            access_token_ttl,
            refresh_token_ttl,
            bcrypt_cost,
            recovery_link_base,
            recovery_mask_unknown_login,
            notifier_webhook_url,
            notifier_queue_capacity,
            notifier_workers,
            notifier_timeout,
            shutdown_timeout,
            tracing,
        })
    }
}

/// Parse a variable with default value.
fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, AuthError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| AuthError::config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}
