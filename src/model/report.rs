//! Submitted reports as the dashboard sees them.

use serde::Deserialize;
use serde_json::Value;

/// Report collections exposed to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Dumas,
    Saran,
    Gratifikasi,
    BenturanKepentingan,
    PermintaanInformasi,
}

impl ReportKind {
    /// Path segment under `/api/v1/`.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Dumas => "dumas",
            Self::Saran => "saran",
            Self::Gratifikasi => "gratifikasi",
            Self::BenturanKepentingan => "benturan-kepentingan",
            Self::PermintaanInformasi => "permintaan-informasi",
        }
    }

    /// Columns shown in list tables, first match wins per row.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Dumas => &["id", "judul", "nama", "tanggal_kejadian", "status"],
            Self::Saran => &["id", "nama", "isi_saran", "status"],
            Self::Gratifikasi => &["id", "nama", "jenis_laporan", "pemberi", "status"],
            Self::BenturanKepentingan => &["id", "nama", "jenis_benturan", "status"],
            Self::PermintaanInformasi => &["id", "nama", "rincian_informasi", "status"],
        }
    }
}

/// One page of a report list, as the backend returns it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportPage {
    pub data: Vec<Value>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: u32,
    pub total_pages: u32,
    pub page: Option<u32>,
}

/// What to ask a list endpoint for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
}

impl ListQuery {
    /// Query-string pairs. An empty search is left out.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = self.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            pairs.push(("search", search.to_string()));
        }
        pairs
    }
}
