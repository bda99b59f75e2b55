//! Form: the central enum for what a reporter can fill in.

use serde::{Deserialize, Serialize};

use super::{
    AttachmentHandle, Benturan, Dumas, EditError, Entry, FieldRule, Gratifikasi, Laporan,
    laporan::KlasifikasiKind,
};

/// Field access shared by every form variant.
///
/// Only the active branch is visible: entries, rules, and attachments of
/// parked or unselected branches never show up here.
pub trait Fields {
    /// Every field of the active branch, in payload order.
    fn entries(&self) -> Vec<Entry>;

    /// Validation rules for the active branch.
    fn rules(&self) -> Vec<FieldRule>;

    /// Applies raw input to a field of the active branch.
    ///
    /// Selector fields switch branches as a side effect.
    fn assign(&mut self, key: &str, raw: &str) -> Result<(), EditError>;

    /// The chain of selected branch names, outermost first.
    fn selection(&self) -> Vec<&'static str>;

    /// The active branch's attachment list, if it takes files.
    fn attachments(&self) -> Option<&Vec<AttachmentHandle>>;

    fn attachments_mut(&mut self) -> Option<&mut Vec<AttachmentHandle>>;
}

/// Which form a draft belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    /// School service form: complaint, information request, suggestion.
    Laporan,

    /// General public complaint.
    Dumas,

    /// Gratification report.
    Gratifikasi,

    /// Conflict-of-interest report.
    Benturan,
}

impl FormKind {
    pub const ALL: [Self; 4] = [Self::Laporan, Self::Dumas, Self::Gratifikasi, Self::Benturan];

    pub fn name(self) -> &'static str {
        match self {
            Self::Laporan => "laporan",
            Self::Dumas => "dumas",
            Self::Gratifikasi => "gratifikasi",
            Self::Benturan => "benturan",
        }
    }

    /// The page the form lives on.
    pub fn route(self) -> &'static str {
        match self {
            Self::Laporan => "/aksi",
            Self::Dumas => "/eksternal",
            Self::Gratifikasi => "/konfes",
            Self::Benturan => "/konfes/benturan-kepentingan",
        }
    }

    pub fn from_route(route: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.route() == route)
    }

    /// How attachments travel to the backend.
    pub fn convention(self) -> Convention {
        match self {
            Self::Dumas => Convention::InlineBase64,
            Self::Laporan | Self::Gratifikasi | Self::Benturan => Convention::Multipart,
        }
    }

    /// Internal forms only accept addresses at the configured email provider.
    pub fn restricts_email_domain(self) -> bool {
        matches!(self, Self::Gratifikasi | Self::Benturan)
    }
}

/// The two submission conventions the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Multipart text fields; attachments uploaded first and sent as identifiers.
    Multipart,

    /// One JSON body with attachments inlined as base64 strings.
    InlineBase64,
}

/// A form and all of its branch state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "kebab-case")]
pub enum Form {
    Laporan(Laporan),
    Dumas(Dumas),
    Gratifikasi(Gratifikasi),
    Benturan(Benturan),
}

impl Default for Form {
    fn default() -> Self {
        Self::Laporan(Laporan::default())
    }
}

impl Form {
    pub fn blank(kind: FormKind) -> Self {
        match kind {
            FormKind::Laporan => Self::Laporan(Laporan::default()),
            FormKind::Dumas => Self::Dumas(Dumas::default()),
            FormKind::Gratifikasi => Self::Gratifikasi(Gratifikasi::default()),
            FormKind::Benturan => Self::Benturan(Benturan::default()),
        }
    }

    pub fn kind(&self) -> FormKind {
        match self {
            Self::Laporan(_) => FormKind::Laporan,
            Self::Dumas(_) => FormKind::Dumas,
            Self::Gratifikasi(_) => FormKind::Gratifikasi,
            Self::Benturan(_) => FormKind::Benturan,
        }
    }

    /// The submission endpoint for the active branch.
    ///
    /// `None` while the school form has no classification selected.
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            Self::Laporan(l) => l.classification().map(|k| match k {
                KlasifikasiKind::Pengaduan => "/api/laporan/pengaduan",
                KlasifikasiKind::PermintaanInformasi => "/api/laporan/permintaan-informasi",
                KlasifikasiKind::Saran => "/api/laporan/saran",
            }),
            Self::Dumas(_) => Some("/api/laporan/dumas"),
            Self::Gratifikasi(_) => Some("/api/laporan/gratifikasi"),
            Self::Benturan(_) => Some("/api/laporan/benturan-kepentingan"),
        }
    }

    pub fn fields(&self) -> &dyn Fields {
        match self {
            Self::Laporan(f) => f,
            Self::Dumas(f) => f,
            Self::Gratifikasi(f) => f,
            Self::Benturan(f) => f,
        }
    }

    pub fn fields_mut(&mut self) -> &mut dyn Fields {
        match self {
            Self::Laporan(f) => f,
            Self::Dumas(f) => f,
            Self::Gratifikasi(f) => f,
            Self::Benturan(f) => f,
        }
    }
}
