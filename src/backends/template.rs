//! Line templates for the console backend
//!
//! A template is literal text with `{{.Name}}` slots, e.g.
//! `{{.Timestamp}} {{.Level}} {{.Caller}} {{.Msg}}`. Slots name record keys
//! after [`normalize_key`](crate::core::record::normalize_key); a slot with
//! no matching field renders as nothing.

use crate::core::error::{LoggerError, Result};
use crate::core::record::push_escaped;
use crate::core::value::FieldValue;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(String),
}

/// A parsed line template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template
    ///
    /// # Errors
    ///
    /// `TemplateError` for an unclosed `{{` or an action that is not a
    /// plain `.Name` reference.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Text(rest[..open].to_string()));
            }
            let action_start = offset + open;
            let after_open = &rest[open + 2..];
            let close = after_open
                .find("}}")
                .ok_or_else(|| LoggerError::template(action_start, "unclosed action"))?;

            let action = after_open[..close].trim();
            let name = action
                .strip_prefix('.')
                .map(str::trim)
                .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_alphanumeric() || c == '_'))
                .ok_or_else(|| {
                    LoggerError::template(
                        action_start,
                        format!("expected a field reference like {{{{.Name}}}}, got '{}'", action),
                    )
                })?;
            segments.push(Segment::Slot(name.to_string()));

            let consumed = open + 2 + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Slot names in order of appearance
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    pub fn references(&self, slot: &str) -> bool {
        self.slots().any(|name| name == slot)
    }

    /// Render into `out`; slot values are escaped, literal text is not
    pub fn render<'v, F>(&self, out: &mut String, mut lookup: F)
    where
        F: FnMut(&str) -> Option<&'v FieldValue>,
    {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(name) => match lookup(name) {
                    Some(FieldValue::String(s)) => push_escaped(out, s),
                    Some(other) => push_escaped(out, &other.to_string()),
                    None => {}
                },
            }
        }
    }
}

impl std::str::FromStr for Template {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Template::parse(s)
    }
}
