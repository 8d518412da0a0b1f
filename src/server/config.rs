use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::server::error::{config::ConfigError, AppError};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:7001";
const DEFAULT_REFRESH_CRON: &str = "*/30 * * * * *";
const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SCRIPT_MAX_OPERATIONS: u64 = 100_000;
const DEFAULT_LOCATION_URL: &str = "https://ip.npmtrend.com";

pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,

    /// Six-field cron expression of the configuration refresh.
    pub refresh_cron: String,
    pub refresh_timeout: Duration,

    /// Operation budget of a single interceptor script run.
    pub script_max_operations: u64,

    /// Startup signing keys, newest first. Empty when `SIGNED_KEYS` is unset.
    pub signed_keys: Vec<String>,

    pub location_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?,
            bind_addr: parse_var("BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?,
            refresh_cron: std::env::var("CONFIG_REFRESH_CRON")
                .unwrap_or_else(|_| DEFAULT_REFRESH_CRON.to_string()),
            refresh_timeout: Duration::from_secs(parse_var(
                "CONFIG_REFRESH_TIMEOUT_SECS",
                Some(DEFAULT_REFRESH_TIMEOUT_SECS),
            )?),
            script_max_operations: parse_var(
                "SCRIPT_MAX_OPERATIONS",
                Some(DEFAULT_SCRIPT_MAX_OPERATIONS),
            )?,
            signed_keys: std::env::var("SIGNED_KEYS")
                .map(|keys| split_keys(&keys))
                .unwrap_or_default(),
            location_url: std::env::var("LOCATION_URL")
                .unwrap_or_else(|_| DEFAULT_LOCATION_URL.to_string()),
        })
    }
}

/// Reads and parses an environment variable, falling back to `default` when unset.
///
/// A variable without default is required.
fn parse_var<T: FromStr>(name: &str, default: Option<T>) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value,
        }),
        Err(_) => default.ok_or_else(|| ConfigError::MissingEnvVar(name.to_string())),
    }
}

/// Splits a comma-separated key list, dropping blank items.
fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}
