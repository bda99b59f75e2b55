//! Output formatting for CLI display.

use serde_json::Value;

use crate::dashboard::PageView;
use crate::engine::FieldError;
use crate::model::{AttachmentHandle, Entry, FieldValue, ReportKind};

/// Widest a table cell may get before it is cut.
const CELL_WIDTH: usize = 40;

pub(super) fn format_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Field listing for `form show`. Attachments are listed separately.
pub(super) fn format_entries(entries: &[Entry]) -> String {
    entries
        .iter()
        .filter_map(|(key, value)| {
            let shown = match value {
                FieldValue::Text(s) if s.is_empty() => "-".to_string(),
                FieldValue::Text(s) => s.clone(),
                FieldValue::Date(d) => d.map_or_else(|| "-".to_string(), |d| d.to_string()),
                FieldValue::Choice(c) => c.unwrap_or("-").to_string(),
                FieldValue::Flag(_) | FieldValue::Files(_) => return None,
            };
            Some(format!("  {key}: {shown}"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn format_attachments(attachments: &[AttachmentHandle]) -> String {
    attachments
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let state = match h.server_id() {
                Some(id) => format!("uploaded as {id}"),
                None => "local".to_string(),
            };
            format!("  {}. {} ({state})", i + 1, h.name())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary cards: one `label: value` line per leaf, nested keys joined by dots.
pub(super) fn format_summary(summary: &Value) -> String {
    let mut lines = Vec::new();
    flatten("", summary, &mut lines);
    if lines.is_empty() {
        return "No summary data".to_string();
    }
    lines.join("\n")
}

fn flatten(prefix: &str, value: &Value, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&path, inner, lines);
            }
        }
        Value::Null => {}
        other if prefix.is_empty() => lines.push(cell(other)),
        other => lines.push(format!("{prefix}: {}", cell(other))),
    }
}

/// A report list as an aligned table with a page footer.
pub(super) fn format_table(kind: ReportKind, view: &PageView) -> String {
    let columns = kind.columns();
    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| columns.iter().map(|c| cell(&row[*c])).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain([c.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = columns.iter().map(|c| (*c).to_string()).collect();
    let mut out = vec![line(&header)];
    if rows.is_empty() {
        out.push("(no reports)".to_string());
    }
    out.extend(rows.iter().map(|r| line(r)));
    out.push(format_footer(view));
    out.join("\n")
}

pub(super) fn format_footer(view: &PageView) -> String {
    let nav = |enabled: bool, label: &str| {
        if enabled {
            format!("[{label}]")
        } else {
            format!("({label})")
        }
    };
    format!(
        "Page {} of {}, {} report(s)  {} {}",
        view.page,
        view.total_pages,
        view.total,
        nav(view.has_prev, "prev"),
        nav(view.has_next, "next"),
    )
}

/// One cell of output. Strings print bare; long values are cut.
fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.replace('\n', " "),
        other => other.to_string(),
    };
    if text.chars().count() > CELL_WIDTH {
        let cut: String = text.chars().take(CELL_WIDTH - 1).collect();
        format!("{cut}…")
    } else {
        text
    }
}
