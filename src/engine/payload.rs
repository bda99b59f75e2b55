//! Compacted submission payloads.

use serde_json::{Map, Value};

use crate::model::{AttachmentHandle, Entry, FieldValue};

/// A payload value, already in wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadValue {
    Text(String),
    Files(Vec<AttachmentHandle>),
}

/// The non-empty fields of the active branch, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    entries: Vec<(&'static str, PayloadValue)>,
}

impl Payload {
    /// Drop empty values and render the rest as wire strings.
    ///
    /// Dates become `YYYY-MM-DD`, choices their wire value, a set flag `"true"`.
    pub fn compact(entries: Vec<Entry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .filter_map(|(key, value)| {
                let value = match value {
                    FieldValue::Text(s) => PayloadValue::Text(s.trim().to_string()),
                    FieldValue::Date(d) => PayloadValue::Text(d?.to_string()),
                    FieldValue::Choice(c) => PayloadValue::Text(c?.to_string()),
                    FieldValue::Flag(_) => PayloadValue::Text("true".to_string()),
                    FieldValue::Files(files) => PayloadValue::Files(files),
                };
                Some((key, value))
            })
            .collect();
        Self { entries }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[(&'static str, PayloadValue)] {
        &self.entries
    }

    #[cfg(test)]
    pub fn keys(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(k, _)| *k).collect()
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    #[cfg(test)]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            PayloadValue::Text(s) => Some(s),
            PayloadValue::Files(_) => None,
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().filter_map(|(k, v)| match v {
            PayloadValue::Text(s) => Some((*k, s.as_str())),
            PayloadValue::Files(_) => None,
        })
    }

    pub fn files(&self) -> impl Iterator<Item = (&'static str, &[AttachmentHandle])> {
        self.entries.iter().filter_map(|(k, v)| match v {
            PayloadValue::Files(files) => Some((*k, files.as_slice())),
            PayloadValue::Text(_) => None,
        })
    }

    /// Text fields as a JSON object. Attachments are left to the caller.
    pub fn text_object(&self) -> Map<String, Value> {
        self.texts()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }
}
