//! Logging macros for key/value records.
//!
//! Each macro takes a logger and `key => value` pairs, captures the call
//! site, and evaluates to the logger's `Result<()>`. The level check runs
//! before any value expression is evaluated, so a filtered call costs no
//! allocations.
//!
//! # Examples
//!
//! ```
//! use kv_logger::backends::new_std_logger;
//! use kv_logger::core::Level;
//! use kv_logger::{info, warn};
//!
//! let logger = new_std_logger(std::io::stdout(), Level::Info);
//!
//! info!(logger, "msg" => "server started").unwrap();
//!
//! let port = 8080;
//! warn!(logger, "msg" => "port in use", "port" => port).unwrap();
//! ```

/// Log `key => value` pairs at an explicit level.
///
/// # Examples
///
/// ```
/// # use kv_logger::core::{Discard, Level};
/// use kv_logger::log;
/// log!(Discard, Level::Info, "msg" => "Simple message").unwrap();
/// log!(Discard, Level::Error, "msg" => "request failed", "status" => 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr $(, $key:expr => $value:expr)* $(,)?) => {{
        let __logger = &$logger;
        let __level: $crate::core::Level = $level;
        if $crate::core::Logger::enabled(__logger, __level) {
            $crate::core::Logger::log(
                __logger,
                &$crate::core::Frame::here(),
                __level,
                &[$($crate::core::Value::from($key), $crate::core::Value::from($value)),*],
            )
        } else {
            ::std::result::Result::<(), $crate::core::LoggerError>::Ok(())
        }
    }};
}

/// Log at debug level.
///
/// # Examples
///
/// ```
/// # use kv_logger::core::Discard;
/// use kv_logger::debug;
/// debug!(Discard, "msg" => "cache miss", "key" => "user:42").unwrap();
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::core::Level::Debug $(, $key => $value)*)
    };
}

/// Log at info level.
///
/// # Examples
///
/// ```
/// # use kv_logger::core::Discard;
/// use kv_logger::info;
/// info!(Discard, "msg" => "Processing items", "count" => 100).unwrap();
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::core::Level::Info $(, $key => $value)*)
    };
}

/// Log at warn level.
///
/// # Examples
///
/// ```
/// # use kv_logger::core::Discard;
/// use kv_logger::warn;
/// warn!(Discard, "msg" => "Retry attempt", "attempt" => 3, "max" => 5).unwrap();
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::core::Level::Warn $(, $key => $value)*)
    };
}

/// Log at error level.
///
/// # Examples
///
/// ```
/// # use kv_logger::core::Discard;
/// use kv_logger::error;
/// error!(Discard, "msg" => "Failed to connect to database").unwrap();
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::core::Level::Error $(, $key => $value)*)
    };
}

/// Log at fatal level. The process keeps running.
///
/// # Examples
///
/// ```
/// # use kv_logger::core::Discard;
/// use kv_logger::fatal;
/// fatal!(Discard, "msg" => "Unable to recover", "reason" => "disk full").unwrap();
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($logger, $crate::core::Level::Fatal $(, $key => $value)*)
    };
}
