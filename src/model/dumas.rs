//! The general public complaint form.
//!
//! Single branch. Photo evidence is inlined into the JSON body at submission.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::field::{lenient_date, parse_date_input};
use super::{AttachmentHandle, EditError, Entry, FieldRule, FieldValue, Fields, Rule};

const KEYS: &[&str] = &[
    "judul",
    "lokasi_kejadian",
    "tanggal_kejadian",
    "pihak_terlapor",
    "kronologi",
    "bukti_foto",
];

/// A general public complaint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dumas {
    pub judul: String,
    pub lokasi_kejadian: String,
    #[serde(with = "lenient_date")]
    pub tanggal_kejadian: Option<Date>,
    pub pihak_terlapor: String,
    pub kronologi: String,
    pub bukti_foto: Vec<AttachmentHandle>,
}

impl Fields for Dumas {
    fn entries(&self) -> Vec<Entry> {
        vec![
            ("judul", FieldValue::Text(self.judul.clone())),
            ("lokasi_kejadian", FieldValue::Text(self.lokasi_kejadian.clone())),
            ("tanggal_kejadian", FieldValue::Date(self.tanggal_kejadian)),
            ("pihak_terlapor", FieldValue::Text(self.pihak_terlapor.clone())),
            ("kronologi", FieldValue::Text(self.kronologi.clone())),
            ("bukti_foto", FieldValue::Files(self.bukti_foto.clone())),
        ]
    }

    fn rules(&self) -> Vec<FieldRule> {
        vec![
            FieldRule::required("judul", "Subject"),
            FieldRule::required("lokasi_kejadian", "Incident location"),
            FieldRule::required("tanggal_kejadian", "Incident date").with(Rule::NotInFuture),
            FieldRule::required("kronologi", "Chronology"),
            FieldRule::new("bukti_foto", "Photo evidence").with(Rule::MinFiles(1)),
        ]
    }

    fn assign(&mut self, key: &str, raw: &str) -> Result<(), EditError> {
        match key {
            "judul" => self.judul = raw.to_string(),
            "lokasi_kejadian" => self.lokasi_kejadian = raw.to_string(),
            "tanggal_kejadian" => self.tanggal_kejadian = parse_date_input(key, raw)?,
            "pihak_terlapor" => self.pihak_terlapor = raw.to_string(),
            "kronologi" => self.kronologi = raw.to_string(),
            "bukti_foto" => {
                return Err(EditError::invalid(key, "add files with `lapor form attach`"));
            }
            _ => return Err(EditError::not_assignable(KEYS, key)),
        }
        Ok(())
    }

    fn selection(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn attachments(&self) -> Option<&Vec<AttachmentHandle>> {
        Some(&self.bukti_foto)
    }

    fn attachments_mut(&mut self) -> Option<&mut Vec<AttachmentHandle>> {
        Some(&mut self.bukti_foto)
    }
}
