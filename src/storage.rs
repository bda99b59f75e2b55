//! Local persistence: the form draft and the dashboard session.
//!
//! Everything lives under one root directory:
//!
//! ```text
//! <root>/
//!   drafts/
//!     lapor.formDraft       # Serialized report draft (JSON)
//!     lapor.lastFormPath    # Route of the form the draft belongs to
//!   session.json            # Dashboard tokens
//! ```
//!
//! The draft keys mirror browser local storage: one opaque value per key.

mod draft;
mod session;

use std::{fs, io, path::PathBuf};

pub use draft::DraftStore;
#[cfg(test)]
pub use draft::{DRAFT_KEY, MemoryDraftStore, PATH_KEY};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Local file-based storage.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("drafts"))?;
        Ok(Self { root })
    }

    /// Returns the default storage root: `~/.lapor/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".lapor"))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join("drafts").join(key)
    }

    fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }
}

/// Remove a file, treating "already gone" as success.
fn remove_if_present(path: &std::path::Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
