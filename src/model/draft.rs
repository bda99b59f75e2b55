//! Report drafts: the in-progress submission and its reporter.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Form, FormKind};

/// Fixed reporter name used while a report is anonymous.
pub const ANONYMOUS_NAME: &str = "Anonim";

/// An in-progress submission.
///
/// Missing fields in a stored draft fall back to their defaults, so a record
/// written by an older build still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportDraft {
    pub id: Uuid,
    pub started_at: Timestamp,
    pub reporter: Reporter,
    pub form: Form,

    /// Whether the reporter has tried to submit at least once.
    pub submit_attempted: bool,
}

impl Default for ReportDraft {
    fn default() -> Self {
        Self::new(FormKind::Laporan)
    }
}

impl ReportDraft {
    pub fn new(kind: FormKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Timestamp::now(),
            reporter: Reporter::default(),
            form: Form::blank(kind),
            submit_attempted: false,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.form.kind()
    }
}

/// Who is reporting. Shared by every form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reporter {
    pub nama: String,
    pub no_telepon: String,
    pub email: String,
    pub anonim: bool,

    /// The name typed before the report went anonymous.
    pub stashed_nama: Option<String>,
}

impl Reporter {
    /// Go anonymous: the name becomes the sentinel and the typed name is stashed.
    pub fn hide(&mut self) {
        if self.anonim {
            return;
        }
        let typed = std::mem::replace(&mut self.nama, ANONYMOUS_NAME.to_string());
        self.stashed_nama = Some(typed).filter(|n| !n.is_empty());
        self.anonim = true;
    }

    /// Stop being anonymous. The name field comes back empty.
    pub fn reveal(&mut self) {
        if !self.anonim {
            return;
        }
        self.anonim = false;
        self.nama.clear();
    }

    /// Put the stashed name back. Returns whether there was one.
    pub fn restore_name(&mut self) -> bool {
        if self.anonim {
            return false;
        }
        match self.stashed_nama.take() {
            Some(name) => {
                self.nama = name;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hiding_forces_sentinel_and_revealing_empties() {
        let mut reporter = Reporter {
            nama: "Budi".into(),
            ..Reporter::default()
        };

        reporter.hide();
        assert_eq!(reporter.nama, ANONYMOUS_NAME);
        assert_eq!(reporter.stashed_nama.as_deref(), Some("Budi"));

        reporter.reveal();
        assert_eq!(reporter.nama, "");
        assert!(!reporter.anonim);

        assert!(reporter.restore_name());
        assert_eq!(reporter.nama, "Budi");
        assert!(!reporter.restore_name());
    }

    #[test]
    fn hiding_twice_keeps_first_stash() {
        let mut reporter = Reporter {
            nama: "Budi".into(),
            ..Reporter::default()
        };
        reporter.hide();
        reporter.hide();
        assert_eq!(reporter.stashed_nama.as_deref(), Some("Budi"));
    }

    #[test]
    fn partial_record_fills_defaults() {
        let draft: ReportDraft =
            serde_json::from_str(r#"{"reporter": {"nama": "Sari"}, "form": {"form": "dumas"}}"#)
                .unwrap();

        assert_eq!(draft.reporter.nama, "Sari");
        assert_eq!(draft.kind(), FormKind::Dumas);
        assert!(!draft.submit_attempted);
    }
}
