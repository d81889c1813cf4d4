//! Field binding decorator
//!
//! [`with`] wraps a logger with a fixed set of fields, some of which may be
//! [`Valuer`](super::value::Valuer)s, and merges them into every record.
//!
//! Merge order: bound fields come first, then the caller's fields. Nested
//! binders keep their own order, so `with(with(l, a), b)` emits
//! `a..., b..., caller...`. When two fields share a key, the later one in
//! that sequence wins in every bundled backend: caller fields override bound
//! ones and outer binders override inner ones.

use super::{
    error::Result,
    log_context::Frame,
    log_level::Level,
    logger::{Logger, SharedLogger},
    record::UNPAIRED_SENTINEL,
    value::Value,
};
use std::sync::Arc;

/// Logger decorated with bound fields
///
/// Cloning is cheap; clones share the wrapped logger.
#[derive(Clone)]
pub struct Binder {
    inner: SharedLogger,
    prefix: Arc<[Value]>,
    has_valuer: bool,
}

/// Wrap `logger` with `keyvals`, leaving `logger` itself untouched
///
/// # Example
///
/// ```
/// use kv_logger::core::{with, Discard, Logger, Level, Frame};
/// use kv_logger::keyvals;
///
/// let base = std::sync::Arc::new(Discard);
/// let bound = with(base.clone(), keyvals!["service", "api"]);
/// bound.log(&Frame::here(), Level::Info, &keyvals!["code", 200]).unwrap();
/// // `base` is still usable on its own
/// base.log(&Frame::here(), Level::Info, &keyvals!["code", 201]).unwrap();
/// ```
pub fn with<L>(logger: L, keyvals: impl IntoIterator<Item = Value>) -> Binder
where
    L: Logger + 'static,
{
    Binder::new(Arc::new(logger), keyvals)
}

impl Binder {
    pub fn new(inner: SharedLogger, keyvals: impl IntoIterator<Item = Value>) -> Self {
        let mut prefix: Vec<Value> = keyvals.into_iter().collect();
        // An odd prefix would shift every caller pair by one
        if prefix.len() % 2 == 1 {
            prefix.push(Value::from(UNPAIRED_SENTINEL));
        }
        let has_valuer = prefix.iter().any(Value::is_lazy);
        Self {
            inner,
            prefix: prefix.into(),
            has_valuer,
        }
    }

    /// Bind more fields on top of this binder
    ///
    /// The result delegates straight to the same inner logger with the
    /// concatenated prefix, which is equivalent to wrapping `self`.
    pub fn with(&self, keyvals: impl IntoIterator<Item = Value>) -> Binder {
        let prefix = self.prefix.iter().cloned().chain(keyvals);
        Binder::new(Arc::clone(&self.inner), prefix)
    }

    pub fn bound(&self) -> &[Value] {
        &self.prefix
    }

    pub fn inner(&self) -> &SharedLogger {
        &self.inner
    }
}

impl Logger for Binder {
    #[inline]
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn log(&self, frame: &Frame<'_>, level: Level, keyvals: &[Value]) -> Result<()> {
        // Filtered or empty calls must not run any bound valuer
        if keyvals.is_empty() || !self.inner.enabled(level) {
            return Ok(());
        }

        let mut merged = Vec::with_capacity(self.prefix.len() + keyvals.len());
        if self.has_valuer {
            merged.extend(self.prefix.iter().map(|v| match v {
                Value::Lazy(valuer) => Value::Literal(valuer.resolve(frame)),
                literal => literal.clone(),
            }));
        } else {
            merged.extend_from_slice(&self.prefix);
        }
        merged.extend_from_slice(keyvals);

        self.inner.log(frame, level, &merged)
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use crate::core::value::{FieldValue, Valuer};
    use crate::keyvals;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Captures the resolved sequence of every record
    #[derive(Default)]
    struct Capture {
        min: Option<Level>,
        records: Mutex<Vec<(Level, Vec<FieldValue>)>>,
    }

    impl Logger for Capture {
        fn enabled(&self, level: Level) -> bool {
            self.min.map_or(true, |min| level >= min)
        }

        fn log(&self, frame: &Frame<'_>, level: Level, keyvals: &[Value]) -> Result<()> {
            if !self.enabled(level) {
                return Ok(());
            }
            let resolved = keyvals.iter().map(|v| v.resolve(frame)).collect();
            self.records.lock().push((level, resolved));
            Ok(())
        }

        fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    struct Failing;

    impl Logger for Failing {
        fn log(&self, _: &Frame<'_>, _: Level, _: &[Value]) -> Result<()> {
            Err(LoggerError::other("sink gone"))
        }

        fn close(&self) -> Result<()> {
            Err(LoggerError::LoggerStopped)
        }
    }

    fn counting_valuer() -> (Valuer, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let valuer = Valuer::from_fn(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            FieldValue::from("v")
        });
        (valuer, count)
    }

    fn strings(values: &[FieldValue]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_bound_fields_come_first() {
        let capture = Arc::new(Capture::default());
        let logger = with(Arc::clone(&capture), keyvals!["k", "v"]);

        logger.log(&Frame::here(), Level::Info, &keyvals!["a", 1]).unwrap();

        let records = capture.records.lock();
        assert_eq!(strings(&records[0].1), ["k", "v", "a", "1"]);
    }

    #[test]
    fn test_nested_binders_keep_order() {
        let capture = Arc::new(Capture::default());
        let inner = with(Arc::clone(&capture), keyvals!["a", 1]);
        let outer = with(inner.clone(), keyvals!["b", 2]);
        let chained = inner.with(keyvals!["b", 2]);

        outer.log(&Frame::here(), Level::Info, &keyvals!["c", 3]).unwrap();
        chained.log(&Frame::here(), Level::Info, &keyvals!["c", 3]).unwrap();

        let records = capture.records.lock();
        assert_eq!(strings(&records[0].1), ["a", "1", "b", "2", "c", "3"]);
        assert_eq!(records[0].1, records[1].1);
    }

    #[test]
    fn test_original_logger_is_untouched() {
        let capture = Arc::new(Capture::default());
        let base = with(Arc::clone(&capture), keyvals!["base", true]);
        let _derived = base.with(keyvals!["extra", 1]);

        base.log(&Frame::here(), Level::Info, &keyvals!["x", 0]).unwrap();

        let records = capture.records.lock();
        assert_eq!(strings(&records[0].1), ["base", "true", "x", "0"]);
    }

    #[test]
    fn test_valuer_runs_once_per_log_never_at_bind() {
        let (valuer, count) = counting_valuer();
        let capture = Arc::new(Capture::default());
        let logger = with(Arc::clone(&capture), keyvals!["lazy", valuer]);
        assert_eq!(count.load(Ordering::SeqCst), 0);

        for i in 0..5 {
            logger.log(&Frame::here(), Level::Warn, &keyvals!["i", i]).unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_filtered_call_skips_valuers() {
        let (valuer, count) = counting_valuer();
        let capture = Arc::new(Capture {
            min: Some(Level::Error),
            ..Capture::default()
        });
        let logger = with(Arc::clone(&capture), keyvals!["lazy", valuer]);

        logger.log(&Frame::here(), Level::Info, &keyvals!["a", 1]).unwrap();

        assert!(!logger.enabled(Level::Warn));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(capture.records.lock().is_empty());
    }

    #[test]
    fn test_empty_call_is_noop() {
        let (valuer, count) = counting_valuer();
        let capture = Arc::new(Capture::default());
        let logger = with(Arc::clone(&capture), keyvals!["lazy", valuer]);

        logger.log(&Frame::here(), Level::Info, &[]).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(capture.records.lock().is_empty());
    }

    #[test]
    fn test_odd_prefix_is_padded() {
        let capture = Arc::new(Capture::default());
        let logger = with(Arc::clone(&capture), keyvals!["orphan"]);
        assert_eq!(logger.bound().len(), 2);

        logger.log(&Frame::here(), Level::Info, &keyvals!["a", 1]).unwrap();
        let records = capture.records.lock();
        assert_eq!(strings(&records[0].1), ["orphan", UNPAIRED_SENTINEL, "a", "1"]);
    }

    #[test]
    fn test_errors_propagate_unchanged() {
        let logger = with(Failing, keyvals!["k", "v"]);
        let err = logger
            .log(&Frame::here(), Level::Error, &keyvals!["a", 1])
            .unwrap_err();
        assert!(matches!(err, LoggerError::Other(ref m) if m == "sink gone"));
        assert!(matches!(logger.close(), Err(LoggerError::LoggerStopped)));
    }
}
