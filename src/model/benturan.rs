//! The conflict-of-interest report form.
//!
//! A reporter either declares their own conflict (`mandiri`) or reports
//! someone else's (`pihak-lain`).

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::field::{Choice, lenient_date, parse_choice, parse_date_input};
use super::{
    AttachmentHandle, EditError, Entry, FieldRule, FieldValue, Fields, ReferenceList, Rule,
};

const KEYS: &[&str] = &[
    "jenis_benturan",
    "unit_kerja",
    "tanggal_kejadian",
    "uraian",
    "jenis_pelaporan",
    "jabatan",
    "langkah_pengendalian",
    "nama_terlapor",
    "jabatan_terlapor",
    "lampiran",
];

/// A conflict-of-interest report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Benturan {
    /// Conflict type id, from the reference list.
    pub jenis_benturan: String,

    pub unit_kerja: String,
    #[serde(with = "lenient_date")]
    pub tanggal_kejadian: Option<Date>,
    pub uraian: String,
    pub pelaporan: Option<Pelaporan>,

    /// Branches switched away from, never validated or submitted.
    pub parked: Vec<Pelaporan>,

    pub lampiran: Vec<AttachmentHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JenisPelaporan {
    Mandiri,
    PihakLain,
}

impl Choice for JenisPelaporan {
    const FIELD: &'static str = "jenis_pelaporan";
    const VALUES: &'static [(&'static str, Self)] =
        &[("mandiri", Self::Mandiri), ("pihak-lain", Self::PihakLain)];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Pelaporan {
    /// Self-declared conflict.
    Mandiri {
        #[serde(default)]
        jabatan: String,
        #[serde(default)]
        langkah_pengendalian: String,
    },

    /// Conflict held by someone else.
    PihakLain {
        #[serde(default)]
        nama_terlapor: String,
        #[serde(default)]
        jabatan_terlapor: String,
    },
}

impl Pelaporan {
    fn blank(kind: JenisPelaporan) -> Self {
        match kind {
            JenisPelaporan::Mandiri => Self::Mandiri {
                jabatan: String::new(),
                langkah_pengendalian: String::new(),
            },
            JenisPelaporan::PihakLain => Self::PihakLain {
                nama_terlapor: String::new(),
                jabatan_terlapor: String::new(),
            },
        }
    }

    pub fn kind(&self) -> JenisPelaporan {
        match self {
            Self::Mandiri { .. } => JenisPelaporan::Mandiri,
            Self::PihakLain { .. } => JenisPelaporan::PihakLain,
        }
    }
}

impl Benturan {
    pub fn selected(&self) -> Option<JenisPelaporan> {
        self.pelaporan.as_ref().map(Pelaporan::kind)
    }

    /// Activate a reporting mode, parking the current one.
    pub fn select(&mut self, kind: Option<JenisPelaporan>) {
        if self.selected() == kind {
            return;
        }
        if let Some(current) = self.pelaporan.take() {
            self.parked.retain(|p| p.kind() != current.kind());
            self.parked.push(current);
        }
        let next = kind.map(|k| match self.parked.iter().position(|p| p.kind() == k) {
            Some(i) => self.parked.remove(i),
            None => Pelaporan::blank(k),
        });
        self.pelaporan = next;
    }
}

impl Fields for Benturan {
    fn entries(&self) -> Vec<Entry> {
        let mut entries = vec![
            ("jenis_benturan", FieldValue::Text(self.jenis_benturan.clone())),
            ("unit_kerja", FieldValue::Text(self.unit_kerja.clone())),
            ("tanggal_kejadian", FieldValue::Date(self.tanggal_kejadian)),
            ("uraian", FieldValue::Text(self.uraian.clone())),
            (
                "jenis_pelaporan",
                FieldValue::Choice(self.selected().map(Choice::wire)),
            ),
        ];
        match &self.pelaporan {
            Some(Pelaporan::Mandiri {
                jabatan,
                langkah_pengendalian,
            }) => entries.extend([
                ("jabatan", FieldValue::Text(jabatan.clone())),
                (
                    "langkah_pengendalian",
                    FieldValue::Text(langkah_pengendalian.clone()),
                ),
            ]),
            Some(Pelaporan::PihakLain {
                nama_terlapor,
                jabatan_terlapor,
            }) => entries.extend([
                ("nama_terlapor", FieldValue::Text(nama_terlapor.clone())),
                ("jabatan_terlapor", FieldValue::Text(jabatan_terlapor.clone())),
            ]),
            None => {}
        }
        entries.push(("lampiran", FieldValue::Files(self.lampiran.clone())));
        entries
    }

    fn rules(&self) -> Vec<FieldRule> {
        let mut rules = vec![
            FieldRule::required("jenis_benturan", "Conflict type")
                .with(Rule::OneOf(ReferenceList::JenisBenturan)),
            FieldRule::new("unit_kerja", "Work unit")
                .with(Rule::OneOf(ReferenceList::ProgramKeahlian)),
            FieldRule::required("tanggal_kejadian", "Incident date").with(Rule::NotInFuture),
            FieldRule::required("uraian", "Description"),
            FieldRule::required("jenis_pelaporan", "Reporting mode"),
        ];
        match &self.pelaporan {
            Some(Pelaporan::Mandiri { .. }) => rules.extend([
                FieldRule::required("jabatan", "Position"),
                FieldRule::required("langkah_pengendalian", "Mitigation steps"),
            ]),
            Some(Pelaporan::PihakLain { .. }) => rules.extend([
                FieldRule::required("nama_terlapor", "Reported person"),
                FieldRule::required("jabatan_terlapor", "Reported person's position"),
            ]),
            None => {}
        }
        rules
    }

    fn assign(&mut self, key: &str, raw: &str) -> Result<(), EditError> {
        let text = || raw.to_string();
        match key {
            "jenis_benturan" => self.jenis_benturan = raw.trim().to_string(),
            "unit_kerja" => self.unit_kerja = raw.trim().to_string(),
            "tanggal_kejadian" => self.tanggal_kejadian = parse_date_input(key, raw)?,
            "uraian" => self.uraian = text(),
            "jenis_pelaporan" => self.select(parse_choice(raw)?),
            "lampiran" => {
                return Err(EditError::invalid(key, "add files with `lapor form attach`"));
            }
            _ => match (&mut self.pelaporan, key) {
                (Some(Pelaporan::Mandiri { jabatan, .. }), "jabatan") => *jabatan = text(),
                (
                    Some(Pelaporan::Mandiri {
                        langkah_pengendalian,
                        ..
                    }),
                    "langkah_pengendalian",
                ) => *langkah_pengendalian = text(),
                (Some(Pelaporan::PihakLain { nama_terlapor, .. }), "nama_terlapor") => {
                    *nama_terlapor = text();
                }
                (
                    Some(Pelaporan::PihakLain {
                        jabatan_terlapor, ..
                    }),
                    "jabatan_terlapor",
                ) => *jabatan_terlapor = text(),
                _ => return Err(EditError::not_assignable(KEYS, key)),
            },
        }
        Ok(())
    }

    fn selection(&self) -> Vec<&'static str> {
        self.selected().map(Choice::wire).into_iter().collect()
    }

    fn attachments(&self) -> Option<&Vec<AttachmentHandle>> {
        Some(&self.lampiran)
    }

    fn attachments_mut(&mut self) -> Option<&mut Vec<AttachmentHandle>> {
        Some(&mut self.lampiran)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_fields_follow_selection() {
        let mut form = Benturan::default();
        form.assign("jenis_pelaporan", "pihak-lain").unwrap();
        form.assign("nama_terlapor", "Pak Joko").unwrap();
        assert_eq!(
            form.assign("langkah_pengendalian", "mundur dari panitia")
                .unwrap_err(),
            EditError::InactiveField("langkah_pengendalian".into())
        );

        form.assign("jenis_pelaporan", "mandiri").unwrap();
        let keys: Vec<_> = form.entries().into_iter().map(|(k, _)| k).collect();
        assert!(keys.contains(&"langkah_pengendalian"));
        assert!(!keys.contains(&"nama_terlapor"));
    }

    #[test]
    fn conflict_type_draws_from_reference_list() {
        let rule = Benturan::default()
            .rules()
            .into_iter()
            .find(|r| r.field == "jenis_benturan")
            .unwrap();
        assert!(rule.rules.contains(&Rule::OneOf(ReferenceList::JenisBenturan)));
    }
}
