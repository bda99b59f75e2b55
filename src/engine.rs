//! The form engine: edits, anonymity, attachments, validation, payloads.
//!
//! An engine owns one [`ReportDraft`] and writes it to its [`DraftStore`]
//! after every change. Store failures are logged and never surface to the
//! reporter; the engine itself cannot fail.

mod payload;
mod validate;

use jiff::{Zoned, civil::Date};
use tracing::{debug, warn};

use crate::model::{
    AttachmentHandle, EditError, Entry, FieldRule, FieldValue, FormKind, ReferenceData,
    ReportDraft, Rule, field::parse_flag,
};
use crate::storage::DraftStore;

pub use payload::Payload;
pub use validate::{Context, FieldError, validate};

/// Settings validation depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Provider the internal forms accept email addresses from.
    pub email_domain: String,
    pub today: Date,
}

impl Policy {
    pub fn new(email_domain: impl Into<String>) -> Self {
        Self {
            email_domain: email_domain.into(),
            today: Zoned::now().date(),
        }
    }
}

/// A draft being edited, bound to the store that keeps it.
pub struct FormEngine<'s> {
    draft: ReportDraft,
    store: &'s dyn DraftStore,
    policy: Policy,
    options: ReferenceData,
}

impl<'s> FormEngine<'s> {
    /// Starts a blank draft of the given form, replacing whatever was stored.
    pub fn start(kind: FormKind, store: &'s dyn DraftStore, policy: Policy) -> Self {
        let engine = Self::from_draft(ReportDraft::new(kind), store, policy);
        engine.persist();
        engine
    }

    /// Resumes the stored draft, if there is a readable one.
    pub fn mount(store: &'s dyn DraftStore, policy: Policy) -> Option<Self> {
        match store.load() {
            Ok(Some(draft)) => {
                debug!(id = %draft.id, form = draft.kind().name(), "resumed draft");
                Some(Self::from_draft(draft, store, policy))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "stored draft is unreadable, starting blank");
                None
            }
        }
    }

    pub fn from_draft(draft: ReportDraft, store: &'s dyn DraftStore, policy: Policy) -> Self {
        Self {
            draft,
            store,
            policy,
            options: ReferenceData::default(),
        }
    }

    /// Reference lists used for membership checks.
    #[must_use]
    pub fn with_options(mut self, options: ReferenceData) -> Self {
        self.options = options;
        self
    }

    pub fn draft(&self) -> &ReportDraft {
        &self.draft
    }

    pub fn kind(&self) -> FormKind {
        self.draft.kind()
    }

    // ── Editing ──

    /// Applies raw input to a reporter or form field.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), EditError> {
        if key == "anonim" {
            let on = parse_flag(key, raw)?;
            self.set_anonymous(on);
            return Ok(());
        }
        let reporter = &mut self.draft.reporter;
        match key {
            "nama" if reporter.anonim => return Err(EditError::Locked(key.to_string())),
            "nama" => reporter.nama = raw.trim().to_string(),
            "no_telepon" => reporter.no_telepon = raw.trim().to_string(),
            "email" => reporter.email = raw.trim().to_string(),
            _ => self.draft.form.fields_mut().assign(key, raw)?,
        }
        self.persist();
        Ok(())
    }

    /// Turns anonymity on or off.
    ///
    /// On: the name becomes the sentinel and is locked. Off: the name is
    /// emptied; the earlier name stays available through [`Self::restore_name`].
    pub fn set_anonymous(&mut self, on: bool) {
        if on {
            self.draft.reporter.hide();
        } else {
            self.draft.reporter.reveal();
        }
        self.persist();
    }

    /// Brings back the name typed before the report went anonymous.
    pub fn restore_name(&mut self) -> bool {
        let restored = self.draft.reporter.restore_name();
        if restored {
            self.persist();
        }
        restored
    }

    // ── Attachments ──

    /// Attachments of the active branch. Empty when it takes none.
    pub fn attachments(&self) -> &[AttachmentHandle] {
        self.draft
            .form
            .fields()
            .attachments()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn attach(&mut self, handle: AttachmentHandle) -> Result<(), EditError> {
        let list = self
            .draft
            .form
            .fields_mut()
            .attachments_mut()
            .ok_or(EditError::NoAttachments)?;
        if list.iter().any(|h| h.digest() == handle.digest()) {
            return Err(EditError::DuplicateAttachment(handle.name().to_string()));
        }
        list.push(handle);
        self.persist();
        Ok(())
    }

    /// Removes the attachment at `index` and hands it back.
    pub fn detach(&mut self, index: usize) -> Result<AttachmentHandle, EditError> {
        let list = self
            .draft
            .form
            .fields_mut()
            .attachments_mut()
            .ok_or(EditError::NoAttachments)?;
        if index >= list.len() {
            return Err(EditError::NoAttachment(index));
        }
        let handle = list.remove(index);
        self.persist();
        Ok(handle)
    }

    /// Records the server identifier for a local attachment.
    ///
    /// Returns false when no local attachment has that digest.
    pub fn mark_uploaded(&mut self, digest: &str, id: &str) -> bool {
        let Some(list) = self.draft.form.fields_mut().attachments_mut() else {
            return false;
        };
        let Some(slot) = list.iter_mut().find(|h| h.is_local() && h.digest() == digest) else {
            return false;
        };
        *slot = slot.uploaded(id);
        self.persist();
        true
    }

    // ── Validation ──

    /// Reporter fields followed by the active branch's fields.
    pub fn entries(&self) -> Vec<Entry> {
        let reporter = &self.draft.reporter;
        let mut entries = vec![
            ("nama", FieldValue::Text(reporter.nama.clone())),
            ("no_telepon", FieldValue::Text(reporter.no_telepon.clone())),
            ("email", FieldValue::Text(reporter.email.clone())),
            ("anonim", FieldValue::Flag(reporter.anonim)),
        ];
        entries.extend(self.draft.form.fields().entries());
        entries
    }

    pub fn rules(&self) -> Vec<FieldRule> {
        let mut email = FieldRule::required("email", "Email").with(Rule::Email);
        if self.kind().restricts_email_domain() {
            email = email.with(Rule::EmailDomain);
        }
        let mut rules = vec![
            FieldRule::required("nama", "Name"),
            FieldRule::required("no_telepon", "Phone number").with(Rule::Phone),
            email,
        ];
        rules.extend(self.draft.form.fields().rules());
        rules
    }

    /// Every current field error.
    pub fn errors(&self) -> Vec<FieldError> {
        let ctx = Context {
            email_domain: &self.policy.email_domain,
            today: self.policy.today,
            options: &self.options,
        };
        validate(&self.entries(), &self.rules(), &ctx)
    }

    /// Whether the error summary is shown: only after a submit attempt, and
    /// only while errors remain.
    pub fn shows_error_summary(&self) -> bool {
        self.draft.submit_attempted && !self.errors().is_empty()
    }

    /// Records a submit attempt and returns the payload if the draft is valid.
    pub fn attempt_submit(&mut self) -> Result<Payload, Vec<FieldError>> {
        if !self.draft.submit_attempted {
            self.draft.submit_attempted = true;
            self.persist();
        }
        let errors = self.errors();
        if errors.is_empty() {
            Ok(self.payload())
        } else {
            Err(errors)
        }
    }

    /// The compacted payload, valid or not.
    pub fn payload(&self) -> Payload {
        Payload::compact(self.entries())
    }

    // ── Persistence ──

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.draft) {
            warn!(error = %e, "failed to save draft");
        }
    }

    /// Finishes a submitted draft: removes it from the store.
    pub fn complete(self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to clear submitted draft");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use jiff::civil::date;

    use crate::model::{ANONYMOUS_NAME, ReferenceList, ReferenceOption};
    use crate::storage::{DRAFT_KEY, MemoryDraftStore, PATH_KEY};

    fn policy() -> Policy {
        Policy {
            email_domain: "gmail.com".into(),
            today: date(2025, 6, 1),
        }
    }

    fn fill_reporter(engine: &mut FormEngine<'_>) {
        engine.set("nama", "Budi Santoso").unwrap();
        engine.set("no_telepon", "081234567890").unwrap();
        engine.set("email", "budi@gmail.com").unwrap();
    }

    fn local(name: &str, digest: &str) -> AttachmentHandle {
        AttachmentHandle::Local {
            path: PathBuf::from(format!("/tmp/{name}")),
            name: name.into(),
            digest: digest.into(),
        }
    }

    #[test]
    fn minimal_saran_payload() {
        let store = MemoryDraftStore::new();
        let mut engine = FormEngine::start(FormKind::Laporan, &store, policy());
        fill_reporter(&mut engine);
        engine.set("klasifikasi", "saran").unwrap();
        engine.set("isi_saran", "Tambah jam buka perpustakaan").unwrap();

        let payload = engine.attempt_submit().unwrap();
        assert_eq!(payload.keys(), vec!["nama", "no_telepon", "email", "isi_saran"]);
        assert_eq!(engine.draft().form.endpoint(), Some("/api/laporan/saran"));
    }

    #[test]
    fn only_active_branch_reaches_payload() {
        let store = MemoryDraftStore::new();
        let mut engine = FormEngine::start(FormKind::Laporan, &store, policy());
        fill_reporter(&mut engine);

        engine.set("klasifikasi", "pengaduan").unwrap();
        engine.set("jenis_pengaduan", "diklat").unwrap();
        engine.set("nama_diklat", "K3 Listrik").unwrap();

        // A → B → A
        engine.set("klasifikasi", "saran").unwrap();
        engine.set("isi_saran", "Perbanyak praktik").unwrap();
        engine.set("klasifikasi", "pengaduan").unwrap();

        let payload = engine.payload();
        assert_eq!(payload.text("nama_diklat"), Some("K3 Listrik"));
        assert!(payload.get("isi_saran").is_none());

        engine.set("klasifikasi", "saran").unwrap();
        let payload = engine.payload();
        assert_eq!(payload.text("isi_saran"), Some("Perbanyak praktik"));
        assert!(payload.get("nama_diklat").is_none());
        assert!(payload.get("jenis_pengaduan").is_none());
    }

    #[test]
    fn inactive_field_edit_is_rejected() {
        let store = MemoryDraftStore::new();
        let mut engine = FormEngine::start(FormKind::Laporan, &store, policy());
        engine.set("klasifikasi", "saran").unwrap();

        let err = engine.set("rincian_informasi", "anggaran").unwrap_err();
        assert_eq!(err, EditError::InactiveField("rincian_informasi".into()));
    }

    #[test]
    fn anonymous_forces_sentinel_and_locks_name() {
        let store = MemoryDraftStore::new();
        let mut engine = FormEngine::start(FormKind::Dumas, &store, policy());
        engine.set("nama", "Budi").unwrap();

        engine.set("anonim", "true").unwrap();
        assert_eq!(engine.draft().reporter.nama, ANONYMOUS_NAME);
        assert_eq!(engine.set("nama", "Sari"), Err(EditError::Locked("nama".into())));
        assert_eq!(engine.payload().text("nama"), Some(ANONYMOUS_NAME));

        engine.set_anonymous(false);
        assert_eq!(engine.draft().reporter.nama, "");
        assert!(engine.errors().iter().any(|e| e.field == "nama"));

        assert!(engine.restore_name());
        assert_eq!(engine.draft().reporter.nama, "Budi");
    }

    #[test]
    fn error_summary_waits_for_first_attempt() {
        let store = MemoryDraftStore::new();
        let mut engine = FormEngine::start(FormKind::Laporan, &store, policy());
        assert!(!engine.errors().is_empty());
        assert!(!engine.shows_error_summary());

        let errors = engine.attempt_submit().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["nama", "no_telepon", "email", "klasifikasi"]);
        assert!(engine.shows_error_summary());

        fill_reporter(&mut engine);
        engine.set("klasifikasi", "saran").unwrap();
        engine.set("isi_saran", "Kantin lebih bersih").unwrap();
        assert!(!engine.shows_error_summary());
    }

    #[test]
    fn internal_forms_restrict_email_domain() {
        let store = MemoryDraftStore::new();
        let mut engine = FormEngine::start(FormKind::Gratifikasi, &store, policy());
        engine.set("email", "guru@sekolah.sch.id").unwrap();
        assert!(engine.errors().iter().any(|e| e.field == "email"));

        let mut engine = FormEngine::start(FormKind::Dumas, &store, policy());
        engine.set("email", "warga@yahoo.co.id").unwrap();
        assert!(!engine.errors().iter().any(|e| e.field == "email"));
    }

    #[test]
    fn reference_lists_feed_validation() {
        let store = MemoryDraftStore::new();
        let mut options = ReferenceData::default();
        options.set(
            ReferenceList::JenisBenturan,
            vec![ReferenceOption {
                id: "2".into(),
                label: "Hubungan keluarga".into(),
            }],
        );
        let mut engine =
            FormEngine::start(FormKind::Benturan, &store, policy()).with_options(options);

        engine.set("jenis_benturan", "7").unwrap();
        assert!(engine.errors().iter().any(|e| e.field == "jenis_benturan"));

        engine.set("jenis_benturan", "2").unwrap();
        assert!(!engine.errors().iter().any(|e| e.field == "jenis_benturan"));
    }

    #[test]
    fn every_edit_is_saved() {
        let store = MemoryDraftStore::new();
        let mut engine = FormEngine::start(FormKind::Dumas, &store, policy());
        engine.set("judul", "Lampu jalan mati").unwrap();

        assert_eq!(store.get(PATH_KEY).unwrap().as_deref(), Some("/eksternal"));
        let stored = store.load().unwrap().unwrap();
        assert_eq!(&stored, engine.draft());

        let resumed = FormEngine::mount(&store, policy()).unwrap();
        assert_eq!(resumed.payload().text("judul"), Some("Lampu jalan mati"));
    }

    #[test]
    fn unreadable_draft_mounts_nothing() {
        let store = MemoryDraftStore::new();
        store.put(DRAFT_KEY, "{").unwrap();
        assert!(FormEngine::mount(&store, policy()).is_none());
    }

    #[test]
    fn attachments_follow_the_branch() {
        let store = MemoryDraftStore::new();
        let mut engine = FormEngine::start(FormKind::Laporan, &store, policy());
        assert_eq!(engine.attach(local("a.jpg", "d1")), Err(EditError::NoAttachments));

        engine.set("klasifikasi", "pengaduan").unwrap();
        engine.attach(local("a.jpg", "d1")).unwrap();
        assert_eq!(
            engine.attach(local("copy.jpg", "d1")),
            Err(EditError::DuplicateAttachment("copy.jpg".into()))
        );
        engine.attach(local("b.jpg", "d2")).unwrap();

        assert!(engine.mark_uploaded("d2", "srv-2"));
        assert!(!engine.mark_uploaded("d2", "srv-3"));
        assert_eq!(engine.attachments()[1].server_id(), Some("srv-2"));

        let removed = engine.detach(0).unwrap();
        assert_eq!(removed.name(), "a.jpg");
        assert_eq!(engine.detach(5), Err(EditError::NoAttachment(5)));
        assert_eq!(engine.attachments().len(), 1);
    }

    #[test]
    fn complete_clears_both_keys() {
        let store = MemoryDraftStore::new();
        let engine = FormEngine::start(FormKind::Dumas, &store, policy());
        assert!(store.contains(DRAFT_KEY));

        engine.complete();
        assert!(!store.contains(DRAFT_KEY));
        assert!(!store.contains(PATH_KEY));
    }
}
