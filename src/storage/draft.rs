//! Draft storage: the in-progress report, one record per key.
//!
//! The store itself only moves strings. Turning them into a [`ReportDraft`]
//! happens in the provided methods, so every backend shares the same format.
//! There is no locking: two processes editing at once means the last write wins.

use std::{fs, io};
#[cfg(test)]
use std::{cell::RefCell, collections::BTreeMap};

use crate::model::ReportDraft;

use super::{Result, Storage, remove_if_present};

/// Key holding the serialized draft.
pub const DRAFT_KEY: &str = "lapor.formDraft";

/// Key holding the route of the form the draft belongs to.
pub const PATH_KEY: &str = "lapor.lastFormPath";

/// Where drafts are kept between runs.
pub trait DraftStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;

    /// Loads the saved draft, if any.
    ///
    /// Dates that no longer parse are dropped; anything missing takes its default.
    fn load(&self) -> Result<Option<ReportDraft>> {
        match self.get(DRAFT_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Saves the whole draft along with its form route.
    fn save(&self, draft: &ReportDraft) -> Result<()> {
        let json = serde_json::to_string(draft)?;
        self.put(DRAFT_KEY, &json)?;
        self.put(PATH_KEY, draft.kind().route())
    }

    /// Removes both the draft and its route.
    fn clear(&self) -> Result<()> {
        self.delete(DRAFT_KEY)?;
        self.delete(PATH_KEY)
    }

    /// The route of the form last edited.
    fn last_form_path(&self) -> Result<Option<String>> {
        self.get(PATH_KEY)
    }
}

impl DraftStore for Storage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.key_path(key), value)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        remove_if_present(&self.key_path(key))
    }
}

/// In-memory store for engine and dispatch tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    entries: RefCell<BTreeMap<String, String>>,
}

#[cfg(test)]
impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

#[cfg(test)]
impl DraftStore for MemoryDraftStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::model::{Fields, FormKind};
    use crate::storage::StorageError;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("lapor")).unwrap();
        (dir, storage)
    }

    fn sample_draft() -> ReportDraft {
        let mut draft = ReportDraft::new(FormKind::Laporan);
        draft.reporter.nama = "Budi".into();
        draft.form.fields_mut().assign("klasifikasi", "pengaduan").unwrap();
        draft.form.fields_mut().assign("jenis_pengaduan", "pelayanan").unwrap();
        draft
            .form
            .fields_mut()
            .assign("tanggal_kejadian", "2024-12-31")
            .unwrap();
        draft
    }

    #[test]
    fn load_empty_store() {
        let (_dir, storage) = test_storage();
        assert!(storage.load().unwrap().is_none());
        assert!(storage.last_form_path().unwrap().is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let (_dir, storage) = test_storage();
        let draft = sample_draft();

        storage.save(&draft).unwrap();
        let loaded = storage.load().unwrap().unwrap();

        assert_eq!(loaded, draft);
        assert_eq!(storage.last_form_path().unwrap().as_deref(), Some("/aksi"));
    }

    #[test]
    fn clear_removes_both_keys() {
        let (_dir, storage) = test_storage();
        storage.save(&sample_draft()).unwrap();

        storage.clear().unwrap();
        assert!(storage.get(DRAFT_KEY).unwrap().is_none());
        assert!(storage.get(PATH_KEY).unwrap().is_none());

        // Idempotent.
        storage.clear().unwrap();
    }

    #[test]
    fn corrupt_record_is_an_error() {
        let (_dir, storage) = test_storage();
        storage.put(DRAFT_KEY, "{not json").unwrap();

        let err = storage.load().unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }

    #[test]
    fn last_write_wins_between_writers() {
        // Two processes sharing a root do not coordinate.
        let (dir, first) = test_storage();
        let second = Storage::new(dir.path().join("lapor")).unwrap();

        let mut a = sample_draft();
        a.reporter.nama = "Dari proses A".into();
        let mut b = ReportDraft::new(FormKind::Dumas);
        b.reporter.nama = "Dari proses B".into();

        first.save(&a).unwrap();
        second.save(&b).unwrap();

        let loaded = first.load().unwrap().unwrap();
        assert_eq!(loaded.reporter.nama, "Dari proses B");
        assert_eq!(first.last_form_path().unwrap().as_deref(), Some("/eksternal"));
    }

    #[test]
    fn memory_store_behaves_like_files() {
        let store = MemoryDraftStore::new();
        let draft = sample_draft();

        store.save(&draft).unwrap();
        assert!(store.contains(DRAFT_KEY));
        assert_eq!(store.load().unwrap().unwrap(), draft);

        store.clear().unwrap();
        assert!(!store.contains(DRAFT_KEY));
        assert!(!store.contains(PATH_KEY));
    }
}
