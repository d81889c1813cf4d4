//! Template-driven line logger
//!
//! Renders each record through a [`Template`] into a pooled buffer and
//! writes it to any `io::Write` sink as one line.

use super::template::Template;
use crate::core::{
    binder::{with, Binder},
    buffer_pool::{BufferPool, DEFAULT_POOL_SIZE},
    config::LoggerConfig,
    error::{LoggerError, Result},
    log_context::Frame,
    log_level::Level,
    logger::Logger,
    record::{normalize_key, push_escaped, Record},
    value::{FieldValue, Value},
    valuers,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

/// Layout used when none is configured
pub const DEFAULT_TEMPLATE: &str = "{{.Timestamp}} {{.Level}} {{.Caller}} {{.Msg}}";

/// Template slot the level is always available under
const LEVEL_SLOT: &str = "Level";

/// Console/line backend
///
/// `StdLogger::new` builds the bare backend; [`StdLogger::with_defaults`]
/// (or [`new_std_logger`]) also binds the `timestamp` and `caller` valuers
/// the default template expects.
///
/// # Example
///
/// ```
/// use kv_logger::backends::StdLogger;
/// use kv_logger::core::{Helper, Level};
///
/// let logger = StdLogger::new(std::io::stdout(), Level::Info).with_defaults();
/// Helper::new(logger).info("ready");
/// ```
pub struct StdLogger {
    sink: Mutex<Box<dyn Write + Send>>,
    level: Level,
    template: Template,
    pool: BufferPool,
    append_unreferenced: bool,
    use_colors: bool,
    closed: AtomicBool,
}

/// Line logger on `w` with the default template, timestamp and caller
pub fn new_std_logger<W>(w: W, level: Level) -> Binder
where
    W: Write + Send + 'static,
{
    StdLogger::new(w, level).with_defaults()
}

impl StdLogger {
    pub fn new<W>(w: W, level: Level) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            sink: Mutex::new(Box::new(w)),
            level,
            template: Self::default_template(),
            pool: BufferPool::new(DEFAULT_POOL_SIZE),
            append_unreferenced: true,
            use_colors: false,
            closed: AtomicBool::new(false),
        }
    }

    /// Use a custom line template
    ///
    /// # Errors
    ///
    /// `TemplateError` when `source` does not parse.
    pub fn with_template(mut self, source: &str) -> Result<Self> {
        self.template = Template::parse(source)?;
        Ok(self)
    }

    /// Whether fields without a template slot are appended as `key=value`
    #[must_use]
    pub fn with_unreferenced_fields(mut self, append: bool) -> Self {
        self.append_unreferenced = append;
        self
    }

    /// Color the level slot for terminals
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use]
    pub fn with_pool_size(mut self, max_idle: usize) -> Self {
        self.pool = BufferPool::new(max_idle);
        self
    }

    /// Bind `timestamp` and `caller`, the fields the default template shows
    pub fn with_defaults(self) -> Binder {
        with(
            self,
            [
                Value::from("timestamp"),
                Value::from(valuers::timestamp()),
                Value::from("caller"),
                Value::from(valuers::caller()),
            ],
        )
    }

    /// Line logger on `w` honoring the configured level and template
    ///
    /// # Errors
    ///
    /// `TemplateError` when the configured template does not parse.
    pub fn from_config<W>(w: W, config: &LoggerConfig) -> Result<Binder>
    where
        W: Write + Send + 'static,
    {
        let mut logger = StdLogger::new(w, config.min_level);
        if let Some(source) = config.template.as_deref() {
            logger = logger.with_template(source)?;
        }
        Ok(logger.with_defaults())
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn min_level(&self) -> Level {
        self.level
    }

    fn default_template() -> Template {
        match Template::parse(DEFAULT_TEMPLATE) {
            Ok(t) => t,
            Err(e) => unreachable!("default template must parse: {}", e),
        }
    }

    fn level_text(&self, level: Level) -> String {
        #[cfg(feature = "console")]
        if self.use_colors {
            use colored::Colorize;
            return level.as_str().color(level.color_code()).to_string();
        }
        level.as_str().to_string()
    }

    /// Render `record` into `out` without the trailing newline
    fn render(&self, record: &Record, out: &mut String) {
        let level = FieldValue::String(self.level_text(record.level()));

        // Later fields overwrite earlier ones sharing a slot
        let mut slots: HashMap<std::borrow::Cow<'_, str>, &FieldValue> =
            HashMap::with_capacity(record.len() + 1);
        slots.insert(LEVEL_SLOT.into(), &level);
        for field in record.fields() {
            slots.insert(normalize_key(&field.key), &field.value);
        }

        self.template.render(out, |name| slots.get(name).copied());

        if !self.append_unreferenced {
            return;
        }
        for (idx, field) in record.fields().iter().enumerate() {
            if self.template.references(&normalize_key(&field.key)) || !record.is_last_for_slot(idx)
            {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            push_escaped(out, &field.key);
            out.push('=');
            push_logfmt_value(out, &field.value);
        }
    }
}

/// Quote values that would otherwise be ambiguous in `key=value` form
fn push_logfmt_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::String(s) if s.is_empty() || s.contains([' ', '=', '"']) => {
            out.push('"');
            push_escaped(out, &s.replace('"', "\\\""));
            out.push('"');
        }
        FieldValue::String(s) => push_escaped(out, s),
        other => out.push_str(&other.to_string()),
    }
}

impl Logger for StdLogger {
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

        let record = Record::resolve(frame, level, keyvals);

        // Guard returns the buffer to the pool on every path out of here
        let mut buf = self.pool.acquire();
        self.render(&record, &mut buf);
        buf.push('\n');

        // Flushed per record so nothing is left buffered if the process dies
        let mut sink = self.sink.lock();
        sink.write_all(buf.as_bytes())
            .and_then(|()| sink.flush())
            .map_err(|e| {
                LoggerError::io_operation("writing log record", "sink rejected the record", e)
            })?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.sink.lock().flush()?;
        Ok(())
    }
}

impl Drop for StdLogger {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::Acquire) {
            if let Err(e) = self.sink.get_mut().flush() {
                eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
            }
        }
    }
}
