//! # KV Logger
//!
//! A structured, leveled logging core built around key/value records.
//!
//! ## Features
//!
//! - **Key/Value Records**: Alternating keys and values, repaired when odd
//! - **Lazy Fields**: Valuers resolved per call from context and call site
//! - **Immutable Binding**: `with` decorates a logger with fields shared by every call
//! - **Pluggable Backends**: Template-rendered lines and JSON lines
//! - **Rotating Files**: Size, count and age limits with optional gzip
//!
//! ## Example
//!
//! ```
//! use kv_logger::prelude::*;
//!
//! let logger = new_std_logger(std::io::stdout(), Level::Info);
//! let logger = logger.with(keyvals!["service", "api"]);
//!
//! let log = Helper::new(logger);
//! log.info("ready");
//! log.warnw(&keyvals!["msg", "slow request", "elapsed_ms", 1200]);
//! ```

pub mod backends;
pub mod core;
pub mod macros;

pub mod prelude {
    pub use crate::backends::{new_std_logger, JsonLogger, RotatingFile, RotationPolicy, StdLogger};
    pub use crate::core::{
        valuers, with, Binder, Context, Discard, FieldValue, Frame, Helper, Level, Logger,
        LoggerConfig, LoggerError, Metadata, Result, SharedLogger, TimestampFormat, Value, Valuer,
    };
    pub use crate::keyvals;
}

pub use backends::{new_std_logger, JsonLogger, StdLogger};
pub use core::{
    with, Binder, Context, FieldValue, Frame, Helper, Level, Logger, LoggerConfig, LoggerError,
    Result, Value, Valuer,
};
