//! Backend configuration
//!
//! The core never reads configuration; backends are built from an already
//! resolved [`LoggerConfig`]. `from_env` resolves one from the process
//! environment.

use super::error::{LoggerError, Result};
use super::log_level::Level;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "LOG_FILE";
pub const ENV_LOG_FILE_SIZE: &str = "LOG_FILE_SIZE";
pub const ENV_LOG_FILE_NUM: &str = "LOG_FILE_NUM";
pub const ENV_LOG_FILE_AGE: &str = "LOG_FILE_AGE";
pub const ENV_LOG_STDOUT: &str = "LOG_STDOUT";

pub const DEFAULT_LOG_FILE: &str = "/var/log/agile-cloud/app.log";

/// Resolved settings for the bundled backends
///
/// # Example
///
/// ```
/// use kv_logger::core::{Level, LoggerConfig};
///
/// let config = LoggerConfig::new()
///     .with_min_level(Level::Debug)
///     .with_file("/tmp/app.log")
///     .with_max_size_mb(64)
///     .with_stdout(true);
/// assert_eq!(config.max_size_bytes(), 64 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Records below this level are dropped
    pub min_level: Level,
    /// Log file path
    pub file: PathBuf,
    /// Rotate once the file reaches this many megabytes
    pub max_size_mb: u64,
    /// Rotated files to keep
    pub max_backups: usize,
    /// Rotated files older than this many days are removed (0 keeps them)
    pub max_age_days: u64,
    /// Gzip rotated files
    pub compress: bool,
    /// Mirror records to stdout
    pub stdout: bool,
    /// Line template for the console backend
    pub template: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: Level::Info,
            file: PathBuf::from(DEFAULT_LOG_FILE),
            max_size_mb: 1024,
            max_backups: 3,
            max_age_days: 30,
            compress: false,
            stdout: false,
            template: None,
        }
    }
}

impl LoggerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve from `LOG_LEVEL`, `LOG_FILE`, `LOG_FILE_SIZE`, `LOG_FILE_NUM`,
    /// `LOG_FILE_AGE` and `LOG_STDOUT`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable source
    ///
    /// An unknown `LOG_LEVEL` falls back to `INFO`. `LOG_STDOUT` enables
    /// mirroring for any value other than `false`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let min_level = lookup(ENV_LOG_LEVEL)
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.min_level);
        let file = lookup(ENV_LOG_FILE)
            .map(PathBuf::from)
            .unwrap_or(defaults.file);
        let max_size_mb = parse_var(&lookup, ENV_LOG_FILE_SIZE, defaults.max_size_mb)?;
        let max_backups = parse_var(&lookup, ENV_LOG_FILE_NUM, defaults.max_backups)?;
        let max_age_days = parse_var(&lookup, ENV_LOG_FILE_AGE, defaults.max_age_days)?;
        let stdout = lookup(ENV_LOG_STDOUT).is_some_and(|v| v != "false");

        Ok(Self {
            min_level,
            file,
            max_size_mb,
            max_backups,
            max_age_days,
            stdout,
            ..defaults
        })
    }

    #[must_use]
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = path.into();
        self
    }

    #[must_use]
    pub fn with_max_size_mb(mut self, megabytes: u64) -> Self {
        self.max_size_mb = megabytes;
        self
    }

    #[must_use]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use]
    pub fn with_stdout(mut self, enabled: bool) -> Self {
        self.stdout = enabled;
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }

    /// `None` when age-based cleanup is disabled
    pub fn max_age(&self) -> Option<Duration> {
        (self.max_age_days > 0).then(|| Duration::from_secs(self.max_age_days * 24 * 3600))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| LoggerError::config(key, format!("'{}': {}", raw, e))),
        None => Ok(default),
    }
}
