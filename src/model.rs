//! Core data model for lapor.
//!
//! Forms are tagged unions: one variant per form, and inside each form one
//! variant per branch, each carrying only its own fields. A field that belongs
//! to an unselected branch cannot reach validation or a payload.

mod attachment;
mod benturan;
mod draft;
mod dumas;
pub mod field;
mod form;
mod gratifikasi;
pub mod laporan;
mod reference;
mod report;
mod rule;
mod session;

pub use attachment::AttachmentHandle;
pub use benturan::Benturan;
#[cfg(test)]
pub use draft::ANONYMOUS_NAME;
pub use draft::ReportDraft;
pub use dumas::Dumas;
pub use field::{EditError, Entry, FieldValue};
pub use form::{Convention, Fields, Form, FormKind};
pub use gratifikasi::Gratifikasi;
pub use laporan::Laporan;
pub use reference::{ReferenceData, ReferenceList, ReferenceOption};
#[cfg(test)]
pub use report::Pagination;
pub use report::{ListQuery, ReportKind, ReportPage};
pub use rule::{FieldRule, Rule};
pub use session::{Session, Tokens};
