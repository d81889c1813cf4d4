//! JSON backend for structured logging
//!
//! Writes each record as a single-line JSON object (JSONL) with `level`,
//! `timestamp` and one key per field, compatible with log aggregation tools
//! like ELK or Loki. There is no template.

use super::rotating_file::RotatingFile;
use crate::core::{
    binder::{with, Binder},
    config::LoggerConfig,
    error::{LoggerError, Result},
    log_context::Frame,
    log_level::Level,
    logger::Logger,
    record::Record,
    timestamp::TimestampFormat,
    value::Value,
    valuers,
};
use parking_lot::Mutex;
use std::backtrace::Backtrace;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

pub const LEVEL_KEY: &str = "level";
pub const TIMESTAMP_KEY: &str = "timestamp";
pub const STACK_KEY: &str = "stack";

/// Structured encoder backend writing to one or more sinks
///
/// Fields are inserted after `level` and `timestamp`, so a field with the
/// same key replaces them; among fields the last one wins. Every sink is
/// flushed before `log` returns. `Fatal` is written like any other level;
/// the process is not terminated.
pub struct JsonLogger {
    sinks: Mutex<Vec<Box<dyn Write + Send>>>,
    level: Level,
    timestamp_format: TimestampFormat,
    stacktrace_level: Option<Level>,
    closed: AtomicBool,
}

impl JsonLogger {
    /// Logger without sinks; add them with [`JsonLogger::with_sink`]
    pub fn new(level: Level) -> Self {
        Self {
            sinks: Mutex::new(Vec::new()),
            level,
            timestamp_format: TimestampFormat::LocalMillis,
            stacktrace_level: None,
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn with_sink<W: Write + Send + 'static>(self, sink: W) -> Self {
        self.sinks.lock().push(Box::new(sink));
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Attach a `stack` backtrace to records at `level` and above
    #[must_use]
    pub fn with_stacktrace(mut self, level: Level) -> Self {
        self.stacktrace_level = Some(level);
        self
    }

    /// Rotating file (plus stdout when enabled) with the `caller` field bound
    /// and stack traces on `Error` and above
    ///
    /// # Errors
    ///
    /// Returns error if the log file cannot be opened
    pub fn from_config(config: &LoggerConfig) -> Result<Binder> {
        let mut logger = JsonLogger::new(config.min_level)
            .with_sink(RotatingFile::from_config(config)?)
            .with_stacktrace(Level::Error);
        if config.stdout {
            logger = logger.with_sink(std::io::stdout());
        }
        Ok(with(logger, [Value::from("caller"), Value::from(valuers::caller())]))
    }

    /// Resolve configuration from the environment and build the logger
    pub fn from_env() -> Result<Binder> {
        Self::from_config(&LoggerConfig::from_env()?)
    }

    fn encode(&self, record: &Record) -> Result<String> {
        let mut object = serde_json::Map::with_capacity(record.len() + 3);
        object.insert(LEVEL_KEY.into(), record.level().as_str().into());
        object.insert(TIMESTAMP_KEY.into(), self.timestamp_format.now()?.into());
        if self
            .stacktrace_level
            .is_some_and(|min| record.level().passes(min))
        {
            object.insert(STACK_KEY.into(), Backtrace::force_capture().to_string().into());
        }
        for field in record.fields() {
            object.insert(field.key.clone(), field.value.to_json_value());
        }

        let mut line = serde_json::to_string(&object)?;
        line.push('\n');
        Ok(line)
    }
}

impl Logger for JsonLogger {
    #[inline]
    fn enabled(&self, level: Level) -> bool {
        level.passes(self.level)
    }

    fn log(&self, frame: &Frame<'_>, level: Level, keyvals: &[Value]) -> Result<()> {
        if !level.passes(self.level) || keyvals.is_empty() {
            return Ok(());
        }
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::LoggerStopped);
        }

        let line = self.encode(&Record::resolve(frame, level, keyvals))?;

        // Every sink gets the record; the first failure is reported
        let mut first_error = None;
        for sink in self.sinks.lock().iter_mut() {
            if let Err(e) = sink.write_all(line.as_bytes()).and_then(|()| sink.flush()) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(LoggerError::io_operation(
                "writing log record",
                "sink rejected the record",
                e,
            )),
            None => Ok(()),
        }
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        for sink in self.sinks.lock().iter_mut() {
            sink.flush()?;
        }
        Ok(())
    }
}

impl Drop for JsonLogger {
    fn drop(&mut self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        for sink in self.sinks.get_mut().iter_mut() {
            if let Err(e) = sink.flush() {
                eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
            }
        }
    }
}
