//! Application configuration from environment variables.

use chrono::Duration;
use thiserror::Error;

use pocketshop_products::DEFAULT_MAX_PRODUCTS;

pub const MAX_PRODUCTS_VAR: &str = "POCKETSHOP_MAX_PRODUCTS";
pub const NOTIFICATION_TIMEOUT_VAR: &str = "POCKETSHOP_NOTIFICATION_TIMEOUT_MS";

/// How long the limit notification stays up unless dismissed.
pub const DEFAULT_NOTIFICATION_TIMEOUT_MS: i64 = 4_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number, got {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("{var} must be at least {min}, got {value}")]
    TooSmall {
        var: &'static str,
        min: i64,
        value: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub max_products: usize,
    pub notification_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_products: DEFAULT_MAX_PRODUCTS,
            notification_timeout: Duration::milliseconds(DEFAULT_NOTIFICATION_TIMEOUT_MS),
        }
    }
}

impl AppConfig {
    /// Read the process environment; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        match read_number(&lookup, MAX_PRODUCTS_VAR, 1)? {
            Some(max) => config.max_products = max as usize,
            None => tracing::debug!(
                max_products = config.max_products,
                "{MAX_PRODUCTS_VAR} not set; using default"
            ),
        }

        if let Some(ms) = read_number(&lookup, NOTIFICATION_TIMEOUT_VAR, 0)? {
            config.notification_timeout = Duration::milliseconds(ms);
        }

        Ok(config)
    }
}

fn read_number(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    min: i64,
) -> Result<Option<i64>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let value = raw.trim().parse::<i64>().map_err(|_| ConfigError::NotANumber {
        var,
        value: raw.clone(),
    })?;
    if value < min {
        return Err(ConfigError::TooSmall { var, min, value });
    }
    Ok(Some(value))
}
