//! Declarative validation rules attached to form fields.

use super::ReferenceList;

/// A single check on a field's value.
///
/// Format rules only look at non-empty values; emptiness is `Required`'s job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,

    /// Indonesian mobile number.
    Phone,

    Email,

    /// Email must belong to the configured provider.
    EmailDomain,

    /// At least this many attachments.
    MinFiles(usize),

    /// Digits only, e.g. an estimated value in rupiah.
    Digits,

    /// A date no later than today.
    NotInFuture,

    /// A date no earlier than the date held by the named field.
    NotBefore(&'static str),

    /// One of the ids in a loaded reference list.
    OneOf(ReferenceList),
}

/// The rules for one field, with the label used in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub label: &'static str,
    pub rules: Vec<Rule>,
}

impl FieldRule {
    pub fn new(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            rules: Vec::new(),
        }
    }

    pub fn required(field: &'static str, label: &'static str) -> Self {
        Self::new(field, label).with(Rule::Required)
    }

    #[must_use]
    pub fn with(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}
