//! Field values and deferred (lazily resolved) values
//!
//! A record is a flat sequence of [`Value`]s. Each one is either a literal
//! [`FieldValue`] or a [`Valuer`] that is resolved against the emission
//! [`Frame`] right before the record is rendered.

use super::log_context::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Concrete, serializable value of a structured logging field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Empty string, the innocuous default for valuers that find nothing
    #[must_use]
    pub fn empty() -> Self {
        FieldValue::String(String::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Uint(u) => serde_json::Value::Number((*u).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Uint(u) => write!(f, "{}", u),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => f.write_str("null"),
        }
    }
}

macro_rules! impl_from_for_field_value {
    ($variant:ident as $target:ty: $($t:ty),+) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    FieldValue::$variant(v as $target)
                }
            }
        )+
    };
}

impl_from_for_field_value!(Int as i64: i8, i16, i32, i64, isize);
impl_from_for_field_value!(Uint as u64: u8, u16, u32, u64, usize);
impl_from_for_field_value!(Float as f64: f32, f64);

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

impl From<char> for FieldValue {
    fn from(c: char) -> Self {
        FieldValue::String(c.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

type ResolveFn = dyn Fn(&Frame<'_>) -> FieldValue + Send + Sync;

/// A deferred field value computed from the emission frame
///
/// Valuers are invoked on every emitted record, never when they are bound,
/// and must not panic: when the frame has nothing to offer they return a
/// documented default (usually [`FieldValue::empty`]).
///
/// # Example
///
/// ```
/// use kv_logger::core::{FieldValue, Frame, Valuer};
///
/// let answer = Valuer::from_fn(|_frame| FieldValue::Int(42));
/// assert_eq!(answer.resolve(&Frame::here()), FieldValue::Int(42));
/// ```
#[derive(Clone)]
pub struct Valuer(Arc<ResolveFn>);

impl Valuer {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Frame<'_>) -> FieldValue + Send + Sync + 'static,
    {
        Valuer(Arc::new(f))
    }

    #[inline]
    pub fn resolve(&self, frame: &Frame<'_>) -> FieldValue {
        (self.0)(frame)
    }
}

impl fmt::Debug for Valuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Valuer(..)")
    }
}

/// One element of a flat key/value sequence: a literal or a deferred value
#[derive(Debug, Clone)]
pub enum Value {
    Literal(FieldValue),
    Lazy(Valuer),
}

impl Value {
    pub fn is_lazy(&self) -> bool {
        matches!(self, Value::Lazy(_))
    }

    /// Resolve against the frame; literals are returned verbatim
    pub fn resolve(&self, frame: &Frame<'_>) -> FieldValue {
        match self {
            Value::Literal(v) => v.clone(),
            Value::Lazy(valuer) => valuer.resolve(frame),
        }
    }

    /// Borrow the literal, resolving only when the value is lazy
    pub fn resolve_cow<'v>(&'v self, frame: &Frame<'_>) -> std::borrow::Cow<'v, FieldValue> {
        match self {
            Value::Literal(v) => std::borrow::Cow::Borrowed(v),
            Value::Lazy(valuer) => std::borrow::Cow::Owned(valuer.resolve(frame)),
        }
    }
}

impl From<Valuer> for Value {
    fn from(v: Valuer) -> Self {
        Value::Lazy(v)
    }
}

impl From<FieldValue> for Value {
    fn from(v: FieldValue) -> Self {
        Value::Literal(v)
    }
}

macro_rules! impl_from_for_value {
    ($($t:ty),+) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Literal(FieldValue::from(v))
                }
            }
        )+
    };
}

impl_from_for_value!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, char, String, &str,
    &String
);

impl<T: Into<FieldValue>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Literal(v.into())
    }
}

/// Build a `Vec<Value>` from heterogeneous literals and valuers
///
/// ```
/// use kv_logger::keyvals;
///
/// let kv = keyvals!["user", "ada", "attempts", 3];
/// assert_eq!(kv.len(), 4);
/// ```
#[macro_export]
macro_rules! keyvals {
    ($($v:expr),* $(,)?) => {
        vec![$($crate::core::Value::from($v)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::from(42_i32), FieldValue::Int(42));
        assert_eq!(FieldValue::from(7_usize), FieldValue::Uint(7));
        assert_eq!(FieldValue::from("x"), FieldValue::String("x".into()));
        assert_eq!(FieldValue::from(None::<i32>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(true)), FieldValue::Bool(true));
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::from(-3).to_string(), "-3");
        assert_eq!(FieldValue::from(1.5).to_string(), "1.5");
        assert_eq!(FieldValue::Null.to_string(), "null");
        assert_eq!(FieldValue::empty().to_string(), "");
    }

    #[test]
    fn test_field_value_json() {
        assert_eq!(FieldValue::from(42).to_json_value(), serde_json::json!(42));
        assert_eq!(FieldValue::from(f64::NAN).to_json_value(), serde_json::Value::Null);
        assert_eq!(
            serde_json::to_string(&FieldValue::from("api")).unwrap(),
            "\"api\""
        );
    }

    #[test]
    fn test_literal_resolves_verbatim() {
        let v = Value::from("hello");
        assert!(!v.is_lazy());
        assert_eq!(v.resolve(&Frame::here()), FieldValue::from("hello"));
    }

    #[test]
    fn test_lazy_resolves_on_every_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let v = Value::from(Valuer::from_fn(move |_| {
            FieldValue::from(counter.fetch_add(1, Ordering::SeqCst) + 1)
        }));

        assert!(v.is_lazy());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(v.resolve(&Frame::here()), FieldValue::Uint(1));
        assert_eq!(v.resolve(&Frame::here()), FieldValue::Uint(2));
    }

    #[test]
    fn test_keyvals_macro() {
        let kv = keyvals!["a", 1, "b", Valuer::from_fn(|_| FieldValue::Null)];
        assert_eq!(kv.len(), 4);
        assert!(kv[3].is_lazy());
    }
}
