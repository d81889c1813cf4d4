//! Ambient context for lazily resolved fields
//!
//! This module provides:
//! - `Context`: read-only key lookup that valuers resolve request-scoped data from
//! - `Metadata`: a map-backed `Context` carried by callers (request id, trace id, ...)
//! - `Frame`: the per-emission input handed to every valuer

use super::value::FieldValue;
use std::collections::HashMap;
use std::fmt;
use std::panic::Location;

/// Read-only key/value carrier supplied by the caller at each emission
///
/// The logger never mutates a context; it only looks keys up on behalf of
/// valuers. A missing key is `None`, never an error.
pub trait Context {
    fn value(&self, key: &str) -> Option<FieldValue>;
}

impl Context for HashMap<String, FieldValue> {
    fn value(&self, key: &str) -> Option<FieldValue> {
        self.get(key).cloned()
    }
}

impl<C: Context + ?Sized> Context for &C {
    fn value(&self, key: &str) -> Option<FieldValue> {
        (**self).value(key)
    }
}

/// Map-backed request context
///
/// # Example
///
/// ```
/// use kv_logger::core::{Context, Metadata};
///
/// let md = Metadata::new()
///     .with_field("X-Request-Id", "req-7")
///     .with_field("X-B3-Traceid", "4bf92f35");
///
/// assert_eq!(md.value("X-Request-Id").map(|v| v.to_string()), Some("req-7".into()));
/// assert!(md.value("missing").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    fields: HashMap<String, FieldValue>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder style)
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Context for Metadata {
    fn value(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).cloned()
    }
}

impl<K, V> FromIterator<(K, V)> for Metadata
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Everything a valuer may look at while resolving a field
///
/// A frame is built once at the public entry point of an emission. The
/// call-site location is captured there with `#[track_caller]`, so any number
/// of binders between the caller and the backend leave it untouched.
#[derive(Clone, Copy)]
pub struct Frame<'a> {
    context: Option<&'a dyn Context>,
    location: &'static Location<'static>,
}

impl<'a> Frame<'a> {
    #[track_caller]
    pub fn new(context: Option<&'a dyn Context>) -> Self {
        Self {
            context,
            location: Location::caller(),
        }
    }

    /// Frame without any ambient context
    #[track_caller]
    pub fn here() -> Self {
        Self::new(None)
    }

    /// Frame with an explicit location, for callers that forward a site they captured earlier
    pub fn at(context: Option<&'a dyn Context>, location: &'static Location<'static>) -> Self {
        Self { context, location }
    }

    pub fn context(&self) -> Option<&'a dyn Context> {
        self.context
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Look a key up in the ambient context, if any
    pub fn lookup(&self, key: &str) -> Option<FieldValue> {
        self.context.and_then(|ctx| ctx.value(key))
    }
}

impl fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("has_context", &self.context.is_some())
            .field("location", &self.location)
            .finish()
    }
}
