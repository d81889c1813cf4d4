//! Core logging abstractions

pub mod binder;
pub mod buffer_pool;
pub mod config;
pub mod error;
pub mod helper;
pub mod log_context;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod timestamp;
pub mod value;
pub mod valuers;

pub use binder::{with, Binder};
pub use buffer_pool::{BufferPool, PooledBuffer};
pub use config::LoggerConfig;
pub use error::{LoggerError, Result};
pub use helper::{ContextHelper, Helper};
pub use log_context::{Context, Frame, Metadata};
pub use log_level::Level;
pub use logger::{Discard, Logger, SharedLogger};
pub use metrics::PoolMetrics;
pub use record::{Field, Record, UNPAIRED_SENTINEL};
pub use timestamp::TimestampFormat;
pub use value::{FieldValue, Value, Valuer};
