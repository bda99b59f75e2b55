//! Field values, raw input parsing, and edit errors shared by every form.

use jiff::civil::Date;

use super::AttachmentHandle;

/// A field's current value, as seen by validation and payload compaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Date(Option<Date>),

    /// A fixed choice, carried as its wire string.
    Choice(Option<&'static str>),

    Flag(bool),
    Files(Vec<AttachmentHandle>),
}

impl FieldValue {
    /// Whether the field holds nothing worth sending.
    ///
    /// Whitespace-only text counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Date(d) => d.is_none(),
            Self::Choice(c) => c.is_none(),
            Self::Flag(on) => !on,
            Self::Files(files) => files.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Choice(c) => *c,
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<Date> {
        match self {
            Self::Date(d) => *d,
            _ => None,
        }
    }

    pub fn file_count(&self) -> usize {
        match self {
            Self::Files(files) => files.len(),
            _ => 0,
        }
    }
}

/// A field key paired with its current value.
pub type Entry = (&'static str, FieldValue);

/// Why an edit was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field `{0}` is not part of the selected branch")]
    InactiveField(String),

    #[error("field `{0}` is locked while the report is anonymous")]
    Locked(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("no attachment at position {0}")]
    NoAttachment(usize),

    #[error("{0} is already attached")]
    DuplicateAttachment(String),

    #[error("this form does not take attachments in its current branch")]
    NoAttachments,
}

impl EditError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// The error for a key that is not assignable in the active branch.
    ///
    /// Keys the form knows about are reported as inactive, anything else as unknown.
    pub(crate) fn not_assignable(known: &[&str], key: &str) -> Self {
        if known.contains(&key) {
            Self::InactiveField(key.to_string())
        } else {
            Self::UnknownField(key.to_string())
        }
    }
}

/// A closed set of options, selected by wire string.
pub trait Choice: Copy + PartialEq + 'static {
    /// The field key this choice is assigned through.
    const FIELD: &'static str;

    /// Every option with its wire string.
    const VALUES: &'static [(&'static str, Self)];

    fn wire(self) -> &'static str {
        Self::VALUES
            .iter()
            .find(|(_, v)| *v == self)
            .map_or("", |(wire, _)| wire)
    }
}

/// Parse a choice from raw input. Empty input clears the selection.
pub fn parse_choice<T: Choice>(raw: &str) -> Result<Option<T>, EditError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    T::VALUES
        .iter()
        .find(|(wire, _)| *wire == raw)
        .map(|(_, v)| Some(*v))
        .ok_or_else(|| {
            let wires = T::VALUES.iter().map(|(w, _)| *w);
            EditError::invalid(T::FIELD, expected_one_of(wires))
        })
}

pub(crate) fn expected_one_of<'a>(wires: impl Iterator<Item = &'a str>) -> String {
    format!("expected one of: {}", wires.collect::<Vec<_>>().join(", "))
}

/// Parse a `YYYY-MM-DD` date from raw input. Empty input clears the field.
pub fn parse_date_input(field: &str, raw: &str) -> Result<Option<Date>, EditError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<Date>()
        .map(Some)
        .map_err(|e| EditError::invalid(field, format!("expected YYYY-MM-DD ({e})")))
}

/// Parse a yes/no input.
pub fn parse_flag(field: &str, raw: &str) -> Result<bool, EditError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "ya" | "yes" | "on" | "1" => Ok(true),
        "false" | "tidak" | "no" | "off" | "0" | "" => Ok(false),
        _ => Err(EditError::invalid(field, "expected true or false")),
    }
}

/// Read a date out of a stored ISO-8601 string.
///
/// Accepts a plain date or a full timestamp (its date part is taken as written).
/// Anything else yields `None`.
pub fn parse_iso_date(raw: &str) -> Option<Date> {
    let day = raw.trim().split('T').next()?;
    day.parse::<Date>().ok()
}

/// Serde adapter for optional dates in persisted drafts.
///
/// Dates are written as `YYYY-MM-DD`. On read, values that fail to parse are
/// dropped instead of failing the whole draft.
pub mod lenient_date {
    use jiff::civil::Date;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_some(&d.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Date>, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(super::parse_iso_date))
    }
}
