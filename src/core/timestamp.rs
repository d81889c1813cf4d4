//! Timestamp formatting utilities
//!
//! Formats used by the timestamp valuer and the JSON backend.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use kv_logger::core::TimestampFormat;
/// use chrono::Utc;
///
/// let rendered = TimestampFormat::Iso8601.format(&Utc::now()).unwrap();
/// assert!(rendered.ends_with('Z'));
///
/// assert!(TimestampFormat::custom("%Y/%m/%d").is_ok());
/// assert!(TimestampFormat::custom("%Q").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Local wall clock with milliseconds: `2025-01-08 10:30:45.123`
    ///
    /// The layout used by the JSON backend.
    LocalMillis,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format; prefer [`TimestampFormat::custom`], which validates it
    Custom(String),
}

/// strftime layout behind [`TimestampFormat::LocalMillis`]
pub const LOCAL_MILLIS_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.3f";

impl TimestampFormat {
    /// Validated custom strftime format
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when `layout` holds a specifier chrono cannot render.
    pub fn custom(layout: impl Into<String>) -> Result<Self> {
        let layout = layout.into();
        if StrftimeItems::new(&layout).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::config(
                "timestamp format",
                format!("invalid strftime layout '{}'", layout),
            ));
        }
        Ok(TimestampFormat::Custom(layout))
    }

    /// Format a `DateTime<Utc>` according to this format
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when a `Custom` layout cannot be rendered.
    pub fn format(&self, datetime: &DateTime<Utc>) -> Result<String> {
        let rendered = match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::LocalMillis => datetime
                .with_timezone(&Local)
                .format(LOCAL_MILLIS_LAYOUT)
                .to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(layout) => {
                // `to_string` would panic on a layout chrono rejects
                let mut out = String::with_capacity(layout.len() + 16);
                write!(out, "{}", datetime.format(layout)).map_err(|_| {
                    LoggerError::config(
                        "timestamp format",
                        format!("cannot render strftime layout '{}'", layout),
                    )
                })?;
                out
            }
        };
        Ok(rendered)
    }

    /// Format the current instant
    ///
    /// # Errors
    ///
    /// See [`TimestampFormat::format`].
    pub fn now(&self) -> Result<String> {
        self.format(&Utc::now())
    }
}
