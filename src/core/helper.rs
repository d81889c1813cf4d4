//! Convenience front end over a [`Logger`]
//!
//! `Helper` is where emissions usually start: it builds the [`Frame`]
//! (capturing the call site), puts the message under a key, and reports
//! backend errors on stderr for the fire-and-forget level methods.

use super::{
    error::Result,
    log_context::{Context, Frame},
    log_level::Level,
    logger::{Logger, SharedLogger},
    value::{FieldValue, Value},
};
use std::sync::Arc;

/// Key the message is stored under
pub const DEFAULT_MESSAGE_KEY: &str = "msg";

/// Leveled front end bound to one logger
///
/// # Example
///
/// ```
/// use kv_logger::core::{Discard, Helper};
/// use kv_logger::keyvals;
///
/// let log = Helper::new(Discard);
/// log.info("server started");
/// log.warnw(&keyvals!["disk_free_pct", 4]);
/// ```
#[derive(Clone)]
pub struct Helper {
    logger: SharedLogger,
    msg_key: Arc<str>,
}

impl Helper {
    pub fn new<L: Logger + 'static>(logger: L) -> Self {
        Self::from_shared(Arc::new(logger))
    }

    pub fn from_shared(logger: SharedLogger) -> Self {
        Self {
            logger,
            msg_key: Arc::from(DEFAULT_MESSAGE_KEY),
        }
    }

    #[must_use]
    pub fn with_message_key(mut self, key: &str) -> Self {
        self.msg_key = Arc::from(key);
        self
    }

    /// Helper that passes `ctx` to every valuer it triggers
    pub fn with_context<'a>(&'a self, ctx: &'a dyn Context) -> ContextHelper<'a> {
        ContextHelper { helper: self, ctx }
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.logger.enabled(level)
    }

    /// Emit raw key/values and return the backend's result
    #[track_caller]
    pub fn log(&self, level: Level, keyvals: &[Value]) -> Result<()> {
        self.emit(None, level, keyvals)
    }

    pub fn close(&self) -> Result<()> {
        self.logger.close()
    }

    #[track_caller]
    fn emit(&self, ctx: Option<&dyn Context>, level: Level, keyvals: &[Value]) -> Result<()> {
        if !self.logger.enabled(level) {
            return Ok(());
        }
        self.logger.log(&Frame::new(ctx), level, keyvals)
    }

    #[track_caller]
    fn emit_msg(&self, ctx: Option<&dyn Context>, level: Level, msg: impl Into<FieldValue>) {
        if !self.logger.enabled(level) {
            return;
        }
        let keyvals = [
            Value::from(&*self.msg_key),
            Value::Literal(msg.into()),
        ];
        report(self.logger.log(&Frame::new(ctx), level, &keyvals));
    }

    #[track_caller]
    fn emit_kv(&self, ctx: Option<&dyn Context>, level: Level, keyvals: &[Value]) {
        report(self.emit(ctx, level, keyvals));
    }
}

macro_rules! level_methods {
    ($(($msg_fn:ident, $kv_fn:ident, $level:expr)),+) => {
        $(
            #[track_caller]
            pub fn $msg_fn(&self, msg: impl Into<FieldValue>) {
                let (helper, ctx) = self.parts();
                helper.emit_msg(ctx, $level, msg);
            }

            #[track_caller]
            pub fn $kv_fn(&self, keyvals: &[Value]) {
                let (helper, ctx) = self.parts();
                helper.emit_kv(ctx, $level, keyvals);
            }
        )+
    };
}

impl Helper {
    fn parts(&self) -> (&Helper, Option<&dyn Context>) {
        (self, None)
    }

    level_methods!(
        (debug, debugw, Level::Debug),
        (info, infow, Level::Info),
        (warn, warnw, Level::Warn),
        (error, errorw, Level::Error),
        (fatal, fatalw, Level::Fatal)
    );
}

/// [`Helper`] bound to a request context
pub struct ContextHelper<'a> {
    helper: &'a Helper,
    ctx: &'a dyn Context,
}

impl<'a> ContextHelper<'a> {
    #[track_caller]
    pub fn log(&self, level: Level, keyvals: &[Value]) -> Result<()> {
        self.helper.emit(Some(self.ctx), level, keyvals)
    }

    fn parts(&self) -> (&'a Helper, Option<&'a dyn Context>) {
        (self.helper, Some(self.ctx))
    }

    level_methods!(
        (debug, debugw, Level::Debug),
        (info, infow, Level::Info),
        (warn, warnw, Level::Warn),
        (error, errorw, Level::Error),
        (fatal, fatalw, Level::Fatal)
    );
}

/// Level methods have nowhere to return an error to
fn report(result: Result<()>) {
    if let Err(e) = result {
        eprintln!("[LOGGER ERROR] Failed to emit record: {}", e);
    }
}
