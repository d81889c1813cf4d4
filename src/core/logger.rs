//! The `Logger` capability

use super::{error::Result, log_context::Frame, log_level::Level, value::Value};
use std::sync::Arc;

/// Shared, type-erased logger handle
pub type SharedLogger = Arc<dyn Logger>;

/// Accepts leveled records made of a flat `[k0, v0, k1, v1, ...]` sequence
///
/// Implementations must:
/// - return `Ok(())` without allocating when `level` is below their minimum;
/// - treat an empty field list as a no-op;
/// - pair an odd trailing key with the unpaired sentinel instead of failing;
/// - resolve lazy values against `frame` before rendering;
/// - make `close` idempotent.
pub trait Logger: Send + Sync {
    /// Whether a record at `level` would be emitted
    ///
    /// Decorators consult this before doing any work of their own.
    fn enabled(&self, level: Level) -> bool {
        let _ = level;
        true
    }

    fn log(&self, frame: &Frame<'_>, level: Level, keyvals: &[Value]) -> Result<()>;

    /// Release backend resources; further records are refused
    fn close(&self) -> Result<()>;
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    #[inline]
    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }

    #[inline]
    fn log(&self, frame: &Frame<'_>, level: Level, keyvals: &[Value]) -> Result<()> {
        (**self).log(frame, level, keyvals)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

impl<L: Logger + ?Sized> Logger for Box<L> {
    #[inline]
    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }

    #[inline]
    fn log(&self, frame: &Frame<'_>, level: Level, keyvals: &[Value]) -> Result<()> {
        (**self).log(frame, level, keyvals)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    #[inline]
    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }

    #[inline]
    fn log(&self, frame: &Frame<'_>, level: Level, keyvals: &[Value]) -> Result<()> {
        (**self).log(frame, level, keyvals)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

/// Logger that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl Logger for Discard {
    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn log(&self, _frame: &Frame<'_>, _level: Level, _keyvals: &[Value]) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
