//! The gratification report form: a gift received or a gift refused.
//!
//! `jenis_laporan` picks the branch; inside either branch `bentuk` (the form
//! the gift took) is a further choice, and `lainnya` ("other") carries its own
//! description field.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::field::{Choice, expected_one_of, lenient_date, parse_choice, parse_date_input};
use super::{
    AttachmentHandle, EditError, Entry, FieldRule, FieldValue, Fields, ReferenceList, Rule,
};

const KEYS: &[&str] = &[
    "unit_kerja",
    "jabatan",
    "jenis_laporan",
    "pemberi",
    "hubungan_pemberi",
    "bentuk",
    "keterangan_bentuk",
    "nilai_taksiran",
    "tanggal_penerimaan",
    "tempat_penerimaan",
    "kronologi",
    "tanggal_penolakan",
    "alasan_penolakan",
    "lampiran",
];

fn unassignable(key: &str) -> EditError {
    EditError::not_assignable(KEYS, key)
}

/// A gratification report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gratifikasi {
    pub unit_kerja: String,
    pub jabatan: String,
    pub jenis: Option<JenisGratifikasi>,

    /// Branches switched away from, never validated or submitted.
    pub parked: Vec<JenisGratifikasi>,

    pub lampiran: Vec<AttachmentHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JenisLaporan {
    Penerimaan,
    Penolakan,
}

impl Choice for JenisLaporan {
    const FIELD: &'static str = "jenis_laporan";
    const VALUES: &'static [(&'static str, Self)] = &[
        ("penerimaan", Self::Penerimaan),
        ("penolakan", Self::Penolakan),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JenisGratifikasi {
    /// The gift was accepted.
    Penerimaan(Penerimaan),

    /// The gift was refused.
    Penolakan(Penolakan),
}

impl JenisGratifikasi {
    fn blank(kind: JenisLaporan) -> Self {
        match kind {
            JenisLaporan::Penerimaan => Self::Penerimaan(Penerimaan::default()),
            JenisLaporan::Penolakan => Self::Penolakan(Penolakan::default()),
        }
    }

    pub fn kind(&self) -> JenisLaporan {
        match self {
            Self::Penerimaan(_) => JenisLaporan::Penerimaan,
            Self::Penolakan(_) => JenisLaporan::Penolakan,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Penerimaan {
    pub pemberi: String,
    pub hubungan_pemberi: String,
    pub bentuk: Option<Bentuk>,
    pub nilai_taksiran: String,
    #[serde(with = "lenient_date")]
    pub tanggal_penerimaan: Option<Date>,
    pub tempat_penerimaan: String,
    pub kronologi: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Penolakan {
    pub pemberi: String,
    pub bentuk: Option<Bentuk>,
    pub nilai_taksiran: String,
    #[serde(with = "lenient_date")]
    pub tanggal_penolakan: Option<Date>,
    pub alasan_penolakan: String,
}

/// What form the gift took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Bentuk {
    Uang,
    Barang,
    Fasilitas,
    Lainnya {
        #[serde(default)]
        keterangan: String,
    },
}

impl Bentuk {
    const WIRES: [&'static str; 4] = ["uang", "barang", "fasilitas", "lainnya"];

    fn wire(&self) -> &'static str {
        match self {
            Self::Uang => "uang",
            Self::Barang => "barang",
            Self::Fasilitas => "fasilitas",
            Self::Lainnya { .. } => "lainnya",
        }
    }

    /// Switch the gift form. A different form drops the "other" description.
    fn select(slot: &mut Option<Self>, raw: &str) -> Result<(), EditError> {
        let raw = raw.trim();
        if slot.as_ref().map(Self::wire) == Some(raw) {
            return Ok(());
        }
        *slot = match raw {
            "" => None,
            "uang" => Some(Self::Uang),
            "barang" => Some(Self::Barang),
            "fasilitas" => Some(Self::Fasilitas),
            "lainnya" => Some(Self::Lainnya {
                keterangan: String::new(),
            }),
            _ => {
                return Err(EditError::invalid(
                    "bentuk",
                    expected_one_of(Self::WIRES.into_iter()),
                ));
            }
        };
        Ok(())
    }

    fn entries(slot: Option<&Self>) -> Vec<Entry> {
        let mut entries = vec![("bentuk", FieldValue::Choice(slot.map(Self::wire)))];
        if let Some(Self::Lainnya { keterangan }) = slot {
            entries.push(("keterangan_bentuk", FieldValue::Text(keterangan.clone())));
        }
        entries
    }

    fn rules(slot: Option<&Self>) -> Vec<FieldRule> {
        let mut rules = vec![FieldRule::required("bentuk", "Gift form")];
        if let Some(Self::Lainnya { .. }) = slot {
            rules.push(FieldRule::required("keterangan_bentuk", "Gift description"));
        }
        rules
    }

    fn assign_description(slot: &mut Option<Self>, raw: &str) -> Result<(), EditError> {
        match slot {
            Some(Self::Lainnya { keterangan }) => {
                *keterangan = raw.to_string();
                Ok(())
            }
            _ => Err(EditError::InactiveField("keterangan_bentuk".into())),
        }
    }
}

impl Gratifikasi {
    pub fn selected(&self) -> Option<JenisLaporan> {
        self.jenis.as_ref().map(JenisGratifikasi::kind)
    }

    /// Activate a report type, parking the current one.
    pub fn select(&mut self, kind: Option<JenisLaporan>) {
        if self.selected() == kind {
            return;
        }
        if let Some(current) = self.jenis.take() {
            self.parked.retain(|p| p.kind() != current.kind());
            self.parked.push(current);
        }
        let next = kind.map(|k| match self.parked.iter().position(|p| p.kind() == k) {
            Some(i) => self.parked.remove(i),
            None => JenisGratifikasi::blank(k),
        });
        self.jenis = next;
    }
}

impl Fields for Gratifikasi {
    fn entries(&self) -> Vec<Entry> {
        let mut entries = vec![
            ("unit_kerja", FieldValue::Text(self.unit_kerja.clone())),
            ("jabatan", FieldValue::Text(self.jabatan.clone())),
            (
                "jenis_laporan",
                FieldValue::Choice(self.selected().map(Choice::wire)),
            ),
        ];
        match &self.jenis {
            Some(JenisGratifikasi::Penerimaan(p)) => {
                entries.extend([
                    ("pemberi", FieldValue::Text(p.pemberi.clone())),
                    ("hubungan_pemberi", FieldValue::Text(p.hubungan_pemberi.clone())),
                ]);
                entries.extend(Bentuk::entries(p.bentuk.as_ref()));
                entries.extend([
                    ("nilai_taksiran", FieldValue::Text(p.nilai_taksiran.clone())),
                    ("tanggal_penerimaan", FieldValue::Date(p.tanggal_penerimaan)),
                    ("tempat_penerimaan", FieldValue::Text(p.tempat_penerimaan.clone())),
                    ("kronologi", FieldValue::Text(p.kronologi.clone())),
                ]);
            }
            Some(JenisGratifikasi::Penolakan(p)) => {
                entries.push(("pemberi", FieldValue::Text(p.pemberi.clone())));
                entries.extend(Bentuk::entries(p.bentuk.as_ref()));
                entries.extend([
                    ("nilai_taksiran", FieldValue::Text(p.nilai_taksiran.clone())),
                    ("tanggal_penolakan", FieldValue::Date(p.tanggal_penolakan)),
                    ("alasan_penolakan", FieldValue::Text(p.alasan_penolakan.clone())),
                ]);
            }
            None => {}
        }
        entries.push(("lampiran", FieldValue::Files(self.lampiran.clone())));
        entries
    }

    fn rules(&self) -> Vec<FieldRule> {
        let mut rules = vec![
            FieldRule::required("unit_kerja", "Work unit")
                .with(Rule::OneOf(ReferenceList::ProgramKeahlian)),
            FieldRule::required("jabatan", "Position"),
            FieldRule::required("jenis_laporan", "Report type"),
        ];
        match &self.jenis {
            Some(JenisGratifikasi::Penerimaan(p)) => {
                rules.push(FieldRule::required("pemberi", "Giver"));
                rules.push(FieldRule::required("hubungan_pemberi", "Relationship to giver"));
                rules.extend(Bentuk::rules(p.bentuk.as_ref()));
                rules.extend([
                    FieldRule::required("nilai_taksiran", "Estimated value").with(Rule::Digits),
                    FieldRule::required("tanggal_penerimaan", "Date received")
                        .with(Rule::NotInFuture),
                    FieldRule::required("kronologi", "Chronology"),
                ]);
            }
            Some(JenisGratifikasi::Penolakan(p)) => {
                rules.push(FieldRule::required("pemberi", "Giver"));
                rules.extend(Bentuk::rules(p.bentuk.as_ref()));
                rules.extend([
                    FieldRule::required("nilai_taksiran", "Estimated value").with(Rule::Digits),
                    FieldRule::required("tanggal_penolakan", "Date refused")
                        .with(Rule::NotInFuture),
                    FieldRule::required("alasan_penolakan", "Reason for refusal"),
                ]);
            }
            None => {}
        }
        rules
    }

    fn assign(&mut self, key: &str, raw: &str) -> Result<(), EditError> {
        let text = || raw.to_string();
        match key {
            "unit_kerja" => self.unit_kerja = raw.trim().to_string(),
            "jabatan" => self.jabatan = text(),
            "jenis_laporan" => self.select(parse_choice(raw)?),
            "lampiran" => {
                return Err(EditError::invalid(key, "add files with `lapor form attach`"));
            }
            _ => match (&mut self.jenis, key) {
                (Some(JenisGratifikasi::Penerimaan(p)), "pemberi") => p.pemberi = text(),
                (Some(JenisGratifikasi::Penerimaan(p)), "hubungan_pemberi") => {
                    p.hubungan_pemberi = text();
                }
                (Some(JenisGratifikasi::Penerimaan(p)), "bentuk") => {
                    Bentuk::select(&mut p.bentuk, raw)?;
                }
                (Some(JenisGratifikasi::Penerimaan(p)), "keterangan_bentuk") => {
                    Bentuk::assign_description(&mut p.bentuk, raw)?;
                }
                (Some(JenisGratifikasi::Penerimaan(p)), "nilai_taksiran") => {
                    p.nilai_taksiran = raw.trim().to_string();
                }
                (Some(JenisGratifikasi::Penerimaan(p)), "tanggal_penerimaan") => {
                    p.tanggal_penerimaan = parse_date_input(key, raw)?;
                }
                (Some(JenisGratifikasi::Penerimaan(p)), "tempat_penerimaan") => {
                    p.tempat_penerimaan = text();
                }
                (Some(JenisGratifikasi::Penerimaan(p)), "kronologi") => p.kronologi = text(),
                (Some(JenisGratifikasi::Penolakan(p)), "pemberi") => p.pemberi = text(),
                (Some(JenisGratifikasi::Penolakan(p)), "bentuk") => {
                    Bentuk::select(&mut p.bentuk, raw)?;
                }
                (Some(JenisGratifikasi::Penolakan(p)), "keterangan_bentuk") => {
                    Bentuk::assign_description(&mut p.bentuk, raw)?;
                }
                (Some(JenisGratifikasi::Penolakan(p)), "nilai_taksiran") => {
                    p.nilai_taksiran = raw.trim().to_string();
                }
                (Some(JenisGratifikasi::Penolakan(p)), "tanggal_penolakan") => {
                    p.tanggal_penolakan = parse_date_input(key, raw)?;
                }
                (Some(JenisGratifikasi::Penolakan(p)), "alasan_penolakan") => {
                    p.alasan_penolakan = text();
                }
                _ => return Err(unassignable(key)),
            },
        }
        Ok(())
    }

    fn selection(&self) -> Vec<&'static str> {
        let mut chain = Vec::new();
        if let Some(jenis) = &self.jenis {
            chain.push(jenis.kind().wire());
            let bentuk = match jenis {
                JenisGratifikasi::Penerimaan(p) => p.bentuk.as_ref(),
                JenisGratifikasi::Penolakan(p) => p.bentuk.as_ref(),
            };
            if let Some(b) = bentuk {
                chain.push(b.wire());
            }
        }
        chain
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

    fn keys(form: &Gratifikasi) -> Vec<&'static str> {
        form.entries().into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn penolakan_has_no_receipt_fields() {
        let mut form = Gratifikasi::default();
        form.assign("jenis_laporan", "penolakan").unwrap();

        let keys = keys(&form);
        assert!(keys.contains(&"alasan_penolakan"));
        assert!(!keys.contains(&"tanggal_penerimaan"));
        assert_eq!(
            form.assign("tempat_penerimaan", "Kantor").unwrap_err(),
            EditError::InactiveField("tempat_penerimaan".into())
        );
    }

    #[test]
    fn other_gift_form_carries_description() {
        let mut form = Gratifikasi::default();
        form.assign("jenis_laporan", "penerimaan").unwrap();
        assert_eq!(
            form.assign("keterangan_bentuk", "voucher").unwrap_err(),
            EditError::InactiveField("keterangan_bentuk".into())
        );

        form.assign("bentuk", "lainnya").unwrap();
        form.assign("keterangan_bentuk", "voucher belanja").unwrap();
        assert!(keys(&form).contains(&"keterangan_bentuk"));
        assert_eq!(form.selection(), vec!["penerimaan", "lainnya"]);

        form.assign("bentuk", "uang").unwrap();
        assert!(!keys(&form).contains(&"keterangan_bentuk"));

        form.assign("bentuk", "lainnya").unwrap();
        assert!(
            form.entries()
                .contains(&("keterangan_bentuk", FieldValue::Text(String::new())))
        );
    }

    #[test]
    fn unknown_gift_form_is_rejected() {
        let mut form = Gratifikasi::default();
        form.assign("jenis_laporan", "penerimaan").unwrap();
        assert!(matches!(
            form.assign("bentuk", "saham"),
            Err(EditError::InvalidValue { .. })
        ));
    }

    #[test]
    fn switching_type_parks_previous() {
        let mut form = Gratifikasi::default();
        form.assign("jenis_laporan", "penerimaan").unwrap();
        form.assign("pemberi", "PT Maju").unwrap();
        form.assign("jenis_laporan", "penolakan").unwrap();

        assert!(
            form.entries()
                .contains(&("pemberi", FieldValue::Text(String::new())))
        );

        form.assign("jenis_laporan", "penerimaan").unwrap();
        assert!(
            form.entries()
                .contains(&("pemberi", FieldValue::Text("PT Maju".into())))
        );
    }

    #[test]
    fn bentuk_round_trips_through_json() {
        let mut form = Gratifikasi::default();
        form.assign("jenis_laporan", "penerimaan").unwrap();
        form.assign("bentuk", "lainnya").unwrap();
        form.assign("keterangan_bentuk", "tiket konser").unwrap();

        let json = serde_json::to_string(&form).unwrap();
        let back: Gratifikasi = serde_json::from_str(&json).unwrap();
        assert_eq!(back, form);
    }
}
