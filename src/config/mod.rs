//! Configuration management for the Ringo bridge

pub mod credentials;

use crate::error::{RingoError, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use url::Url;

/// Vendor API root used when no override is configured
pub const DEFAULT_BASE_URL: &str = "https://dev.ringodoor.com/api/";

/// Auto-lock delay bounds accepted by the setup wizard (seconds)
pub const AUTO_LOCK_RANGE: std::ops::RangeInclusive<u64> = 1..=60;

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "RINGO";

/// Bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Vendor API root; endpoints are joined relative to it
    pub base_url: Url,

    /// Total timeout for a single HTTP call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Retries beyond the first attempt
    pub max_retries: u32,

    /// Delay unit between retries (retry n waits n * backoff)
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,

    /// Lifetime assigned to a freshly issued bearer token
    #[serde(with = "humantime_serde")]
    pub token_lifetime: Duration,

    /// Time a lock stays unlocked before it re-locks
    #[serde(with = "humantime_serde")]
    pub auto_lock_time: Duration,

    /// Enable SSL/TLS verification
    pub verify_ssl: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable structured JSON logging
    pub json_format: bool,

    /// Log to file (path)
    pub file: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_backoff: Duration::ZERO,
            token_lifetime: Duration::from_secs(3600),
            auto_lock_time: Duration::from_secs(5),
            verify_ssl: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file: None,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from defaults, an optional TOML file and
    /// `RINGO_*` environment variables, in that order of precedence.
    ///
    /// Nested keys use a double underscore (`RINGO_LOGGING__LEVEL`).
    /// Durations are humantime strings (`RINGO_TIMEOUT=15s`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| RingoError::config(format!("Invalid default configuration: {e}")))?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: Self = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| RingoError::config(format!("Failed to load configuration: {e}")))?;

        loaded.validate()?;
        Ok(loaded)
    }

    /// Load configuration from defaults and `RINGO_*` environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.scheme() != "http" && self.base_url.scheme() != "https" {
            return Err(RingoError::config("URL must use http or https scheme"));
        }

        if self.base_url.cannot_be_a_base() {
            return Err(RingoError::config("URL cannot be used as a base"));
        }

        if self.timeout.is_zero() {
            return Err(RingoError::config("Timeout must be greater than zero"));
        }

        let auto_lock = self.auto_lock_time.as_secs();
        if !AUTO_LOCK_RANGE.contains(&auto_lock) || self.auto_lock_time.subsec_nanos() != 0 {
            return Err(RingoError::config(format!(
                "Auto-lock time must be a whole number of seconds between {} and {}",
                AUTO_LOCK_RANGE.start(),
                AUTO_LOCK_RANGE.end()
            )));
        }

        Ok(())
    }

    /// Base URL guaranteed to end with a slash so endpoint joins stay under it
    pub fn api_root(&self) -> Url {
        let mut url = self.base_url.clone();
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url
    }
}
