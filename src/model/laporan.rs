//! The school service form: complaints, information requests, and suggestions.
//!
//! Three levels of choice shape the form:
//!
//! ```text
//! klasifikasi ─┬─ pengaduan ──── jenis_pengaduan ─┬─ diklat
//!              │                                  ├─ pkl
//!              │                                  ├─ fasilitas ── kategori_fasilitas
//!              │                                  └─ pelayanan
//!              ├─ permintaan-informasi
//!              └─ saran
//! ```
//!
//! Switching classification parks the old branch; switching complaint type
//! starts the new type from blank.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::field::{Choice, lenient_date, parse_choice, parse_date_input};
use super::{
    AttachmentHandle, EditError, Entry, FieldRule, FieldValue, Fields, ReferenceList, Rule,
};

/// Every key this form knows, across all branches.
const KEYS: &[&str] = &[
    "program_keahlian",
    "klasifikasi",
    "jenis_pengaduan",
    "lampiran",
    "nama_diklat",
    "tanggal_diklat",
    "uraian",
    "tempat_pkl",
    "tanggal_mulai",
    "tanggal_selesai",
    "kategori_fasilitas",
    "lokasi",
    "unit_layanan",
    "tanggal_kejadian",
    "rincian_informasi",
    "tujuan_penggunaan",
    "cara_memperoleh",
    "isi_saran",
];

fn unassignable(key: &str) -> EditError {
    EditError::not_assignable(KEYS, key)
}

/// The school service form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Laporan {
    /// Work unit the report concerns, from the reference list.
    pub program_keahlian: String,

    pub klasifikasi: Option<Klasifikasi>,

    /// Branches the reporter switched away from.
    /// Kept so switching back shows their own input; never validated or submitted.
    pub parked: Vec<Klasifikasi>,
}

/// Top-level classification, as selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KlasifikasiKind {
    Pengaduan,
    PermintaanInformasi,
    Saran,
}

impl Choice for KlasifikasiKind {
    const FIELD: &'static str = "klasifikasi";
    const VALUES: &'static [(&'static str, Self)] = &[
        ("pengaduan", Self::Pengaduan),
        ("permintaan-informasi", Self::PermintaanInformasi),
        ("saran", Self::Saran),
    ];
}

/// Top-level classification with its branch fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Klasifikasi {
    Pengaduan(Pengaduan),
    PermintaanInformasi(PermintaanInformasi),
    Saran(Saran),
}

impl Klasifikasi {
    fn blank(kind: KlasifikasiKind) -> Self {
        match kind {
            KlasifikasiKind::Pengaduan => Self::Pengaduan(Pengaduan::default()),
            KlasifikasiKind::PermintaanInformasi => {
                Self::PermintaanInformasi(PermintaanInformasi::default())
            }
            KlasifikasiKind::Saran => Self::Saran(Saran::default()),
        }
    }

    pub fn kind(&self) -> KlasifikasiKind {
        match self {
            Self::Pengaduan(_) => KlasifikasiKind::Pengaduan,
            Self::PermintaanInformasi(_) => KlasifikasiKind::PermintaanInformasi,
            Self::Saran(_) => KlasifikasiKind::Saran,
        }
    }

    fn entries(&self) -> Vec<Entry> {
        match self {
            Self::Pengaduan(p) => p.entries(),
            Self::PermintaanInformasi(p) => p.entries(),
            Self::Saran(s) => vec![("isi_saran", FieldValue::Text(s.isi_saran.clone()))],
        }
    }

    fn rules(&self) -> Vec<FieldRule> {
        match self {
            Self::Pengaduan(p) => p.rules(),
            Self::PermintaanInformasi(_) => vec![
                FieldRule::required("rincian_informasi", "Requested information"),
                FieldRule::required("tujuan_penggunaan", "Purpose"),
                FieldRule::required("cara_memperoleh", "Delivery method"),
            ],
            Self::Saran(_) => vec![FieldRule::required("isi_saran", "Suggestion")],
        }
    }

    fn assign(&mut self, key: &str, raw: &str) -> Result<(), EditError> {
        match self {
            Self::Pengaduan(p) => p.assign(key, raw),
            Self::PermintaanInformasi(p) => p.assign(key, raw),
            Self::Saran(s) => match key {
                "isi_saran" => {
                    s.isi_saran = raw.to_string();
                    Ok(())
                }
                _ => Err(unassignable(key)),
            },
        }
    }
}

impl Laporan {
    pub fn classification(&self) -> Option<KlasifikasiKind> {
        self.klasifikasi.as_ref().map(Klasifikasi::kind)
    }

    /// Activate a classification, parking the current one.
    ///
    /// A previously parked branch of the chosen kind comes back as it was left.
    pub fn select(&mut self, kind: Option<KlasifikasiKind>) {
        if self.classification() == kind {
            return;
        }
        if let Some(current) = self.klasifikasi.take() {
            self.parked.retain(|p| p.kind() != current.kind());
            self.parked.push(current);
        }
        let next = kind.map(|k| match self.parked.iter().position(|p| p.kind() == k) {
            Some(i) => self.parked.remove(i),
            None => Klasifikasi::blank(k),
        });
        self.klasifikasi = next;
    }
}

impl Fields for Laporan {
    fn entries(&self) -> Vec<Entry> {
        let mut entries = vec![(
            "program_keahlian",
            FieldValue::Text(self.program_keahlian.clone()),
        )];
        if let Some(k) = &self.klasifikasi {
            entries.extend(k.entries());
        }
        entries
    }

    fn rules(&self) -> Vec<FieldRule> {
        let mut rules = vec![
            FieldRule::new("program_keahlian", "Work unit")
                .with(Rule::OneOf(ReferenceList::ProgramKeahlian)),
        ];
        // The classification is encoded in the endpoint, never in an entry,
        // so its rule only exists while nothing is selected.
        match &self.klasifikasi {
            Some(k) => rules.extend(k.rules()),
            None => rules.push(FieldRule::required("klasifikasi", "Classification")),
        }
        rules
    }

    fn assign(&mut self, key: &str, raw: &str) -> Result<(), EditError> {
        match key {
            "program_keahlian" => self.program_keahlian = raw.trim().to_string(),
            "klasifikasi" => self.select(parse_choice(raw)?),
            _ => {
                return match self.klasifikasi.as_mut() {
                    Some(k) => k.assign(key, raw),
                    None => Err(unassignable(key)),
                };
            }
        }
        Ok(())
    }

    fn selection(&self) -> Vec<&'static str> {
        let mut chain = Vec::new();
        if let Some(k) = &self.klasifikasi {
            chain.push(k.kind().wire());
            if let Klasifikasi::Pengaduan(p) = k
                && let Some(jenis) = &p.jenis
            {
                chain.push(jenis.kind().wire());
                if let JenisPengaduan::Fasilitas(f) = jenis
                    && let Some(kategori) = f.kategori
                {
                    chain.push(kategori.wire());
                }
            }
        }
        chain
    }

    fn attachments(&self) -> Option<&Vec<AttachmentHandle>> {
        match &self.klasifikasi {
            Some(Klasifikasi::Pengaduan(p)) => Some(&p.lampiran),
            _ => None,
        }
    }

    fn attachments_mut(&mut self) -> Option<&mut Vec<AttachmentHandle>> {
        match &mut self.klasifikasi {
            Some(Klasifikasi::Pengaduan(p)) => Some(&mut p.lampiran),
            _ => None,
        }
    }
}

// ── Pengaduan ──

/// A complaint: one complaint type plus evidence files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pengaduan {
    pub jenis: Option<JenisPengaduan>,
    pub lampiran: Vec<AttachmentHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JenisKind {
    Diklat,
    Pkl,
    Fasilitas,
    Pelayanan,
}

impl Choice for JenisKind {
    const FIELD: &'static str = "jenis_pengaduan";
    const VALUES: &'static [(&'static str, Self)] = &[
        ("diklat", Self::Diklat),
        ("pkl", Self::Pkl),
        ("fasilitas", Self::Fasilitas),
        ("pelayanan", Self::Pelayanan),
    ];
}

/// Complaint type with its own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JenisPengaduan {
    /// Training programme.
    Diklat(Diklat),

    /// Industrial placement.
    Pkl(Pkl),

    /// School facilities.
    Fasilitas(Fasilitas),

    /// Administrative service.
    Pelayanan(Pelayanan),
}

impl JenisPengaduan {
    fn blank(kind: JenisKind) -> Self {
        match kind {
            JenisKind::Diklat => Self::Diklat(Diklat::default()),
            JenisKind::Pkl => Self::Pkl(Pkl::default()),
            JenisKind::Fasilitas => Self::Fasilitas(Fasilitas::default()),
            JenisKind::Pelayanan => Self::Pelayanan(Pelayanan::default()),
        }
    }

    pub fn kind(&self) -> JenisKind {
        match self {
            Self::Diklat(_) => JenisKind::Diklat,
            Self::Pkl(_) => JenisKind::Pkl,
            Self::Fasilitas(_) => JenisKind::Fasilitas,
            Self::Pelayanan(_) => JenisKind::Pelayanan,
        }
    }
}

impl Pengaduan {
    /// Switch complaint type. A different type starts blank.
    pub fn select(&mut self, kind: Option<JenisKind>) {
        if self.jenis.as_ref().map(JenisPengaduan::kind) != kind {
            self.jenis = kind.map(JenisPengaduan::blank);
        }
    }

    fn entries(&self) -> Vec<Entry> {
        let mut entries = vec![(
            "jenis_pengaduan",
            FieldValue::Choice(self.jenis.as_ref().map(|j| j.kind().wire())),
        )];
        match &self.jenis {
            Some(JenisPengaduan::Diklat(d)) => entries.extend([
                ("nama_diklat", FieldValue::Text(d.nama_diklat.clone())),
                ("tanggal_diklat", FieldValue::Date(d.tanggal_diklat)),
                ("uraian", FieldValue::Text(d.uraian.clone())),
            ]),
            Some(JenisPengaduan::Pkl(p)) => entries.extend([
                ("tempat_pkl", FieldValue::Text(p.tempat_pkl.clone())),
                ("tanggal_mulai", FieldValue::Date(p.tanggal_mulai)),
                ("tanggal_selesai", FieldValue::Date(p.tanggal_selesai)),
                ("uraian", FieldValue::Text(p.uraian.clone())),
            ]),
            Some(JenisPengaduan::Fasilitas(f)) => entries.extend([
                (
                    "kategori_fasilitas",
                    FieldValue::Choice(f.kategori.map(Choice::wire)),
                ),
                ("lokasi", FieldValue::Text(f.lokasi.clone())),
                ("uraian", FieldValue::Text(f.uraian.clone())),
            ]),
            Some(JenisPengaduan::Pelayanan(p)) => entries.extend([
                ("unit_layanan", FieldValue::Text(p.unit_layanan.clone())),
                ("tanggal_kejadian", FieldValue::Date(p.tanggal_kejadian)),
                ("uraian", FieldValue::Text(p.uraian.clone())),
            ]),
            None => {}
        }
        entries.push(("lampiran", FieldValue::Files(self.lampiran.clone())));
        entries
    }

    fn rules(&self) -> Vec<FieldRule> {
        let mut rules = vec![FieldRule::required("jenis_pengaduan", "Complaint type")];
        match &self.jenis {
            Some(JenisPengaduan::Diklat(_)) => rules.extend([
                FieldRule::required("nama_diklat", "Training name"),
                FieldRule::required("tanggal_diklat", "Training date").with(Rule::NotInFuture),
                FieldRule::required("uraian", "Description"),
            ]),
            Some(JenisPengaduan::Pkl(_)) => rules.extend([
                FieldRule::required("tempat_pkl", "Placement site"),
                FieldRule::required("tanggal_mulai", "Start date"),
                FieldRule::required("tanggal_selesai", "End date")
                    .with(Rule::NotBefore("tanggal_mulai")),
                FieldRule::required("uraian", "Description"),
            ]),
            Some(JenisPengaduan::Fasilitas(_)) => rules.extend([
                FieldRule::required("kategori_fasilitas", "Facility category"),
                FieldRule::required("lokasi", "Location"),
                FieldRule::required("uraian", "Description"),
            ]),
            Some(JenisPengaduan::Pelayanan(_)) => rules.extend([
                FieldRule::required("unit_layanan", "Service unit"),
                FieldRule::required("tanggal_kejadian", "Incident date").with(Rule::NotInFuture),
                FieldRule::required("uraian", "Description"),
            ]),
            None => {}
        }
        rules.push(FieldRule::new("lampiran", "Evidence").with(Rule::MinFiles(1)));
        rules
    }

    fn assign(&mut self, key: &str, raw: &str) -> Result<(), EditError> {
        if key == "jenis_pengaduan" {
            self.select(parse_choice(raw)?);
            return Ok(());
        }
        if key == "lampiran" {
            return Err(EditError::invalid(key, "add files with `lapor form attach`"));
        }
        let text = || raw.to_string();
        match (&mut self.jenis, key) {
            (Some(JenisPengaduan::Diklat(d)), "nama_diklat") => d.nama_diklat = text(),
            (Some(JenisPengaduan::Diklat(d)), "tanggal_diklat") => {
                d.tanggal_diklat = parse_date_input(key, raw)?;
            }
            (Some(JenisPengaduan::Diklat(d)), "uraian") => d.uraian = text(),
            (Some(JenisPengaduan::Pkl(p)), "tempat_pkl") => p.tempat_pkl = text(),
            (Some(JenisPengaduan::Pkl(p)), "tanggal_mulai") => {
                p.tanggal_mulai = parse_date_input(key, raw)?;
            }
            (Some(JenisPengaduan::Pkl(p)), "tanggal_selesai") => {
                p.tanggal_selesai = parse_date_input(key, raw)?;
            }
            (Some(JenisPengaduan::Pkl(p)), "uraian") => p.uraian = text(),
            (Some(JenisPengaduan::Fasilitas(f)), "kategori_fasilitas") => {
                f.kategori = parse_choice(raw)?;
            }
            (Some(JenisPengaduan::Fasilitas(f)), "lokasi") => f.lokasi = text(),
            (Some(JenisPengaduan::Fasilitas(f)), "uraian") => f.uraian = text(),
            (Some(JenisPengaduan::Pelayanan(p)), "unit_layanan") => p.unit_layanan = text(),
            (Some(JenisPengaduan::Pelayanan(p)), "tanggal_kejadian") => {
                p.tanggal_kejadian = parse_date_input(key, raw)?;
            }
            (Some(JenisPengaduan::Pelayanan(p)), "uraian") => p.uraian = text(),
            _ => return Err(unassignable(key)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Diklat {
    pub nama_diklat: String,
    #[serde(with = "lenient_date")]
    pub tanggal_diklat: Option<Date>,
    pub uraian: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pkl {
    pub tempat_pkl: String,
    #[serde(with = "lenient_date")]
    pub tanggal_mulai: Option<Date>,
    #[serde(with = "lenient_date")]
    pub tanggal_selesai: Option<Date>,
    pub uraian: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fasilitas {
    pub kategori: Option<KategoriFasilitas>,
    pub lokasi: String,
    pub uraian: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KategoriFasilitas {
    RuangKelas,
    Laboratorium,
    SaranaUmum,
}

impl Choice for KategoriFasilitas {
    const FIELD: &'static str = "kategori_fasilitas";
    const VALUES: &'static [(&'static str, Self)] = &[
        ("ruang-kelas", Self::RuangKelas),
        ("laboratorium", Self::Laboratorium),
        ("sarana-umum", Self::SaranaUmum),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pelayanan {
    pub unit_layanan: String,
    #[serde(with = "lenient_date")]
    pub tanggal_kejadian: Option<Date>,
    pub uraian: String,
}

// ── Permintaan informasi ──

/// A request for public information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermintaanInformasi {
    pub rincian_informasi: String,
    pub tujuan_penggunaan: String,
    pub cara_memperoleh: Option<CaraMemperoleh>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaraMemperoleh {
    Melihat,
    Softcopy,
    Hardcopy,
}

impl Choice for CaraMemperoleh {
    const FIELD: &'static str = "cara_memperoleh";
    const VALUES: &'static [(&'static str, Self)] = &[
        ("melihat", Self::Melihat),
        ("softcopy", Self::Softcopy),
        ("hardcopy", Self::Hardcopy),
    ];
}

impl PermintaanInformasi {
    fn entries(&self) -> Vec<Entry> {
        vec![
            (
                "rincian_informasi",
                FieldValue::Text(self.rincian_informasi.clone()),
            ),
            (
                "tujuan_penggunaan",
                FieldValue::Text(self.tujuan_penggunaan.clone()),
            ),
            (
                "cara_memperoleh",
                FieldValue::Choice(self.cara_memperoleh.map(Choice::wire)),
            ),
        ]
    }

    fn assign(&mut self, key: &str, raw: &str) -> Result<(), EditError> {
        match key {
            "rincian_informasi" => self.rincian_informasi = raw.to_string(),
            "tujuan_penggunaan" => self.tujuan_penggunaan = raw.to_string(),
            "cara_memperoleh" => self.cara_memperoleh = parse_choice(raw)?,
            _ => return Err(unassignable(key)),
        }
        Ok(())
    }
}

// ── Saran ──

/// A suggestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Saran {
    pub isi_saran: String,
}
