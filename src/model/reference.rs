//! Reference option lists served by the backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An immutable `(id, label)` pair from a backend option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOption")]
pub struct ReferenceOption {
    pub id: String,
    pub label: String,
}

/// Wire shape: numeric or string ids, and a label under one of several names.
#[derive(Deserialize)]
struct RawOption {
    id: Value,
    #[serde(alias = "nama", alias = "name", default)]
    label: String,
}

impl From<RawOption> for ReferenceOption {
    fn from(raw: RawOption) -> Self {
        let id = match raw.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Self {
            id,
            label: raw.label,
        }
    }
}

/// Which option list a field draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceList {
    /// Work units (skill programmes).
    ProgramKeahlian,

    /// Conflict-of-interest types.
    JenisBenturan,
}

impl ReferenceList {
    pub const ALL: [Self; 2] = [Self::ProgramKeahlian, Self::JenisBenturan];

    /// The backend path serving this list.
    pub fn path(self) -> &'static str {
        match self {
            Self::ProgramKeahlian => "/api/ref/program-keahlian",
            Self::JenisBenturan => "/api/ref/jenis-benturan",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ProgramKeahlian => "work units",
            Self::JenisBenturan => "conflict types",
        }
    }
}

/// Both option lists, as loaded for one mount.
///
/// A list that failed to load is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceData {
    pub program_keahlian: Vec<ReferenceOption>,
    pub jenis_benturan: Vec<ReferenceOption>,
}

impl ReferenceData {
    pub fn options(&self, list: ReferenceList) -> &[ReferenceOption] {
        match list {
            ReferenceList::ProgramKeahlian => &self.program_keahlian,
            ReferenceList::JenisBenturan => &self.jenis_benturan,
        }
    }

    pub fn set(&mut self, list: ReferenceList, options: Vec<ReferenceOption>) {
        match list {
            ReferenceList::ProgramKeahlian => self.program_keahlian = options,
            ReferenceList::JenisBenturan => self.jenis_benturan = options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_accept_numeric_ids_and_label_aliases() {
        let options: Vec<ReferenceOption> = serde_json::from_str(
            r#"[
                {"id": 3, "nama": "Teknik Mesin"},
                {"id": "tkj", "label": "TKJ"},
                {"id": 9, "name": "Akuntansi"}
            ]"#,
        )
        .unwrap();

        assert_eq!(options[0].id, "3");
        assert_eq!(options[0].label, "Teknik Mesin");
        assert_eq!(options[1].id, "tkj");
        assert_eq!(options[1].label, "TKJ");
        assert_eq!(options[2].label, "Akuntansi");
    }

    #[test]
    fn lists_are_independent() {
        let mut data = ReferenceData::default();
        data.set(
            ReferenceList::JenisBenturan,
            vec![ReferenceOption {
                id: "1".into(),
                label: "Hubungan keluarga".into(),
            }],
        );

        assert!(data.options(ReferenceList::ProgramKeahlian).is_empty());
        assert_eq!(data.options(ReferenceList::JenisBenturan).len(), 1);
    }
}
