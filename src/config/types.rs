//! Configuration types.
//!
//! This module defines the library configuration struct and the enums shared
//! with command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

use crate::config::constants::*;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Errors returned by [`Config::validate`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Concurrency outside `1..=MAX_CONCURRENCY_LIMIT`.
    #[error("max_concurrency must be between 1 and {max}, got {0}", max = MAX_CONCURRENCY_LIMIT)]
    InvalidConcurrency(usize),

    /// Attempt count outside `1..=RETRY_MAX_ATTEMPTS_LIMIT`.
    #[error("max_attempts must be between 1 and {max}, got {0}", max = RETRY_MAX_ATTEMPTS_LIMIT)]
    InvalidMaxAttempts(u32),

    /// DNS timeout of zero seconds.
    #[error("dns_timeout_secs must be greater than 0")]
    InvalidDnsTimeout,

    /// Circuit breaker threshold of zero.
    #[error("storage_failure_threshold must be greater than 0")]
    InvalidStorageThreshold,

    /// Empty database path.
    #[error("db_path must not be empty")]
    EmptyDbPath,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use txt_harvest::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("./records.db"),
///     max_concurrency: 50,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// Maximum concurrent TXT lookups per batch
    pub max_concurrency: usize,

    /// Total resolution attempts per domain, including the first one
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,

    /// Per-query DNS timeout in seconds
    pub dns_timeout_secs: u64,

    /// Consecutive insert failures that abort a batch
    pub storage_failure_threshold: u32,

    /// Listen address of the HTTP server
    pub bind: String,

    /// Directory for search exports
    pub results_dir: PathBuf,

    /// Origin allowed by CORS
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            db_path: PathBuf::from(DB_PATH),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_attempts: RETRY_MAX_ATTEMPTS,
            retry_delay_ms: RETRY_DELAY_MS,
            dns_timeout_secs: DNS_TIMEOUT_SECS,
            storage_failure_threshold: STORAGE_FAILURE_THRESHOLD,
            bind: DEFAULT_BIND_ADDR.to_string(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
        }
    }
}

impl Config {
    /// Checks that all numeric settings are inside their supported ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 || self.max_concurrency > MAX_CONCURRENCY_LIMIT {
            return Err(ConfigError::InvalidConcurrency(self.max_concurrency));
        }
        if self.max_attempts == 0 || self.max_attempts > RETRY_MAX_ATTEMPTS_LIMIT {
            return Err(ConfigError::InvalidMaxAttempts(self.max_attempts));
        }
        if self.dns_timeout_secs == 0 {
            return Err(ConfigError::InvalidDnsTimeout);
        }
        if self.storage_failure_threshold == 0 {
            return Err(ConfigError::InvalidStorageThreshold);
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDbPath);
        }
        Ok(())
    }

    /// Delay between resolution attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Timeout applied to a single DNS query.
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }
}
