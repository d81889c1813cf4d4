//! Reference valuers
//!
//! Every valuer here is cheap, side-effect free and never panics. Context
//! lookups fall back to an empty string when the frame carries no context or
//! the key is absent.

use super::log_context::Frame;
use super::timestamp::TimestampFormat;
use super::value::{FieldValue, Valuer};
use std::panic::Location;

/// Context key holding the request id
pub const REQUEST_ID_KEY: &str = "X-Request-Id";
/// Context key holding the B3 trace id
pub const TRACE_ID_KEY: &str = "X-B3-Traceid";
/// Context key holding the B3 span id
pub const SPAN_ID_KEY: &str = "X-B3-Spanid";

/// Current time in ISO 8601, read when the record is emitted
pub fn timestamp() -> Valuer {
    timestamp_with_format(TimestampFormat::Iso8601)
}

/// Current time in `format`; an unrenderable layout yields an empty string
pub fn timestamp_with_format(format: TimestampFormat) -> Valuer {
    Valuer::from_fn(move |_| {
        format
            .now()
            .map(FieldValue::String)
            .unwrap_or_else(|_| FieldValue::empty())
    })
}

/// `dir/file.rs:line` of the code that started the emission
pub fn caller() -> Valuer {
    Valuer::from_fn(|frame| FieldValue::String(short_caller(frame.location())))
}

/// Trim a location to its last directory and file name
pub fn short_caller(location: &Location<'_>) -> String {
    let file = location.file();
    let mut parts = file.rsplitn(3, ['/', '\\']);
    let name = parts.next().unwrap_or(file);
    let short = match parts.next() {
        Some(dir) => format!("{}/{}", dir, name),
        None => name.to_string(),
    };
    format!("{}:{}", short, location.line())
}

/// Value stored under `key` in the frame's context, or an empty string
pub fn context_value(key: impl Into<String>) -> Valuer {
    let key = key.into();
    Valuer::from_fn(move |frame: &Frame<'_>| frame.lookup(&key).unwrap_or_else(FieldValue::empty))
}

pub fn request_id() -> Valuer {
    context_value(REQUEST_ID_KEY)
}

pub fn request_id_with_name(name: impl Into<String>) -> Valuer {
    context_value(name)
}

pub fn trace_id() -> Valuer {
    context_value(TRACE_ID_KEY)
}

pub fn trace_id_with_name(name: impl Into<String>) -> Valuer {
    context_value(name)
}

pub fn span_id() -> Valuer {
    context_value(SPAN_ID_KEY)
}

pub fn span_id_with_name(name: impl Into<String>) -> Valuer {
    context_value(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_context::Metadata;

    #[test]
    fn test_context_lookups() {
        let md = Metadata::new()
            .with_field(REQUEST_ID_KEY, "req-1")
            .with_field(TRACE_ID_KEY, "trace-1")
            .with_field(SPAN_ID_KEY, "span-1")
            .with_field("tenant", "acme");
        let frame = Frame::new(Some(&md));

        assert_eq!(request_id().resolve(&frame), FieldValue::from("req-1"));
        assert_eq!(trace_id().resolve(&frame), FieldValue::from("trace-1"));
        assert_eq!(span_id().resolve(&frame), FieldValue::from("span-1"));
        assert_eq!(
            request_id_with_name("tenant").resolve(&frame),
            FieldValue::from("acme")
        );
    }

    #[test]
    fn test_lookups_without_context_are_empty() {
        let frame = Frame::here();
        assert_eq!(request_id().resolve(&frame), FieldValue::empty());
        assert_eq!(trace_id_with_name("x").resolve(&frame), FieldValue::empty());
        assert_eq!(span_id().resolve(&frame), FieldValue::empty());
    }

    #[test]
    fn test_missing_key_is_empty() {
        let md = Metadata::new().with_field("other", 1);
        let frame = Frame::new(Some(&md));
        assert_eq!(trace_id().resolve(&frame), FieldValue::empty());
    }

    #[test]
    fn test_caller_points_at_frame_site() {
        let line = line!() + 1;
        let frame = Frame::here();
        let rendered = caller().resolve(&frame).to_string();
        assert_eq!(rendered, format!("core/valuers.rs:{}", line));
    }

    #[test]
    fn test_bad_timestamp_layout_resolves_empty() {
        let valuer = timestamp_with_format(TimestampFormat::Custom("%Q".into()));
        let resolved =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| valuer.resolve(&Frame::here())));
        assert_eq!(resolved.ok(), Some(FieldValue::empty()));
    }

    #[test]
    fn test_timestamp_is_read_at_resolution() {
        let valuer = timestamp_with_format(TimestampFormat::UnixMillis);
        let first: i64 = valuer.resolve(&Frame::here()).to_string().parse().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second: i64 = valuer.resolve(&Frame::here()).to_string().parse().unwrap();
        assert!(second > first);
    }
}
