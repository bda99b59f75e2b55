//! Rule evaluation over a form's current entries.

use std::sync::LazyLock;

use jiff::civil::Date;
use regex::Regex;
use serde::Serialize;

use crate::model::{Entry, FieldRule, FieldValue, ReferenceData, Rule};

/// Indonesian mobile numbers: `+62`, `62` or `0`, then `8` and 8 to 12 more digits.
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+62|62|0)8[1-9][0-9]{7,11}$").expect("phone pattern is valid")
});

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// A failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// What rules are checked against besides the entries themselves.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub email_domain: &'a str,
    pub today: Date,
    pub options: &'a ReferenceData,
}

/// Evaluate every rule and collect one error per failing field.
///
/// A rule naming a field with no entry sees an empty value.
pub fn validate(entries: &[Entry], rules: &[FieldRule], ctx: &Context<'_>) -> Vec<FieldError> {
    let blank = FieldValue::Text(String::new());
    rules
        .iter()
        .filter_map(|rule| {
            let value = lookup(entries, rule.field).unwrap_or(&blank);
            rule.rules
                .iter()
                .find_map(|r| check(r, rule.label, value, entries, ctx))
                .map(|message| FieldError {
                    field: rule.field,
                    message,
                })
        })
        .collect()
}

fn lookup<'e>(entries: &'e [Entry], field: &str) -> Option<&'e FieldValue> {
    entries.iter().find(|(k, _)| *k == field).map(|(_, v)| v)
}

fn check(
    rule: &Rule,
    label: &str,
    value: &FieldValue,
    entries: &[Entry],
    ctx: &Context<'_>,
) -> Option<String> {
    match rule {
        Rule::Required => value.is_empty().then(|| format!("{label} is required")),
        Rule::MinFiles(n) => (value.file_count() < *n).then(|| match n {
            1 => format!("{label} needs at least one file"),
            n => format!("{label} needs at least {n} files"),
        }),
        // Format rules leave empty values to `Required`.
        _ if value.is_empty() => None,
        Rule::Phone => {
            let text = value.as_text().unwrap_or_default();
            let number: String = text.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
            (!PHONE.is_match(&number))
                .then(|| format!("{label} must be an Indonesian mobile number, e.g. 081234567890"))
        }
        Rule::Email => {
            let text = value.as_text().unwrap_or_default().trim();
            (!EMAIL.is_match(text)).then(|| format!("{label} must be a valid email address"))
        }
        Rule::EmailDomain => {
            let text = value.as_text().unwrap_or_default().trim();
            let domain = text.rsplit_once('@').map(|(_, d)| d);
            (!domain.is_some_and(|d| d.eq_ignore_ascii_case(ctx.email_domain)))
                .then(|| format!("{label} must be an @{} address", ctx.email_domain))
        }
        Rule::Digits => {
            let text = value.as_text().unwrap_or_default().trim();
            (!text.chars().all(|c| c.is_ascii_digit()))
                .then(|| format!("{label} must contain digits only"))
        }
        Rule::NotInFuture => value
            .as_date()
            .filter(|d| *d > ctx.today)
            .map(|_| format!("{label} cannot be in the future")),
        Rule::NotBefore(other) => {
            let earliest = lookup(entries, other).and_then(FieldValue::as_date)?;
            value
                .as_date()
                .filter(|d| *d < earliest)
                .map(|_| format!("{label} cannot be before {other}"))
        }
        Rule::OneOf(list) => {
            let options = ctx.options.options(*list);
            let id = value.as_text().unwrap_or_default().trim();
            // Nothing loaded means nothing to check against.
            (!options.is_empty() && !options.iter().any(|o| o.id == id))
                .then(|| format!("{label} must be one of the listed {}", list.label()))
        }
    }
}
