//! Record encoding discipline
//!
//! Turns a flat `[k0, v0, k1, v1, ...]` sequence into resolved pairs:
//! valuers are resolved against the frame, an odd trailing key is paired
//! with [`UNPAIRED_SENTINEL`], and keys are rendered to strings.

use super::log_context::Frame;
use super::log_level::Level;
use super::value::{FieldValue, Value};
use std::borrow::Cow;

/// Value given to a dangling key in an odd-length field list
pub const UNPAIRED_SENTINEL: &str = "KEYVALS UNPAIRED";

/// One resolved key/value pair
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

/// A fully resolved record, ready for a renderer
#[derive(Debug, Clone)]
pub struct Record {
    level: Level,
    fields: Vec<Field>,
    repaired: bool,
}

impl Record {
    /// Resolve a flat key/value sequence
    ///
    /// Non-string keys are rendered with `Display`. Lazy keys are resolved
    /// like lazy values.
    pub fn resolve(frame: &Frame<'_>, level: Level, keyvals: &[Value]) -> Self {
        let repaired = !is_paired(keyvals);
        let mut fields = Vec::with_capacity(keyvals.len() / 2 + 1);

        for pair in keyvals.chunks(2) {
            let key = match pair[0].resolve_cow(frame).as_ref() {
                FieldValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            let value = match pair.get(1) {
                Some(v) => v.resolve(frame),
                None => FieldValue::from(UNPAIRED_SENTINEL),
            };
            fields.push(Field { key, value });
        }

        Self {
            level,
            fields,
            repaired,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether the sentinel had to be added
    pub fn was_repaired(&self) -> bool {
        self.repaired
    }

    /// Value of `key`; with duplicates, the last one in sequence order wins
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.key == key)
            .map(|f| &f.value)
    }

    /// Whether the field at `index` is the last one whose key normalizes to the same slot
    ///
    /// `false` when `index` is out of range.
    pub fn is_last_for_slot(&self, index: usize) -> bool {
        let Some(field) = self.fields.get(index) else {
            return false;
        };
        let slot = normalize_key(&field.key);
        !self.fields[index + 1..]
            .iter()
            .any(|f| normalize_key(&f.key) == slot)
    }
}

/// Whether a field list is already even
#[inline]
pub fn is_paired(keyvals: &[Value]) -> bool {
    keyvals.len() % 2 == 0
}

/// Capitalize the first character of a key, the way template slots are named
///
/// `msg` and `Msg` normalize to the same slot; the later field wins.
pub fn normalize_key(key: &str) -> Cow<'_, str> {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_lowercase() => {
            let mut out = String::with_capacity(key.len());
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            Cow::Owned(out)
        }
        _ => Cow::Borrowed(key),
    }
}

/// Append `s`, escaping characters that would break a line-oriented record
///
/// Prevents a value from injecting fake records into the sink.
pub fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::Valuer;
    use crate::keyvals;

    #[test]
    fn test_even_list_is_not_repaired() {
        let kv = keyvals!["a", 1, "b", "two"];
        let record = Record::resolve(&Frame::here(), Level::Info, &kv);
        assert!(!record.was_repaired());
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("b"), Some(&FieldValue::from("two")));
    }

    #[test]
    fn test_odd_list_gets_sentinel() {
        let kv = keyvals!["a", 1, "dangling"];
        let record = Record::resolve(&Frame::here(), Level::Info, &kv);
        assert!(record.was_repaired());
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("dangling"), Some(&FieldValue::from(UNPAIRED_SENTINEL)));
    }

    #[test]
    fn test_lazy_values_are_resolved() {
        let kv = keyvals!["n", Valuer::from_fn(|_| FieldValue::Int(9))];
        let record = Record::resolve(&Frame::here(), Level::Debug, &kv);
        assert_eq!(record.get("n"), Some(&FieldValue::Int(9)));
    }

    #[test]
    fn test_non_string_keys_are_displayed() {
        let kv = keyvals![7, "seven"];
        let record = Record::resolve(&Frame::here(), Level::Info, &kv);
        assert_eq!(record.fields()[0].key, "7");
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let kv = keyvals!["k", 1, "k", 2];
        let record = Record::resolve(&Frame::here(), Level::Info, &kv);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("k"), Some(&FieldValue::Int(2)));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("msg"), "Msg");
        assert_eq!(normalize_key("Msg"), "Msg");
        assert_eq!(normalize_key("émoi"), "Émoi");
        assert_eq!(normalize_key("_id"), "_id");
        assert_eq!(normalize_key(""), "");
        assert!(matches!(normalize_key("Level"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_slot_collision_is_detected() {
        let kv = keyvals!["msg", "first", "Msg", "second", "other", 1];
        let record = Record::resolve(&Frame::here(), Level::Info, &kv);
        assert!(!record.is_last_for_slot(0));
        assert!(record.is_last_for_slot(1));
        assert!(record.is_last_for_slot(2));
    }

    #[test]
    fn test_slot_index_out_of_range() {
        let record = Record::resolve(&Frame::here(), Level::Info, &keyvals!["k", 1]);
        assert!(!record.is_last_for_slot(1));
        assert!(!record.is_last_for_slot(usize::MAX));

        let empty = Record::resolve(&Frame::here(), Level::Info, &[]);
        assert!(!empty.is_last_for_slot(0));
    }

    #[test]
    fn test_push_escaped() {
        let mut out = String::new();
        push_escaped(&mut out, "line1\nINFO fake\tx\r");
        assert_eq!(out, "line1\\nINFO fake\\tx\\r");
    }
}
