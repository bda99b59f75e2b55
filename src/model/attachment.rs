//! Attachment handles: files the reporter has added to a form.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A file the reporter has added.
///
/// Starts as a local file. Forms that upload ahead of submission swap it for
/// the identifier the server issued; the digest travels along so the same
/// file cannot be attached twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AttachmentHandle {
    /// Not yet uploaded.
    Local {
        path: PathBuf,
        name: String,
        digest: String,
    },

    /// Accepted by the upload endpoint.
    Uploaded {
        id: String,
        name: String,
        digest: String,
    },
}

impl AttachmentHandle {
    /// Reads the file once to fingerprint it.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::Local {
            path: path.to_path_buf(),
            name,
            digest: hex::encode(Sha256::digest(&bytes)),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Local { name, .. } | Self::Uploaded { name, .. } => name,
        }
    }

    pub fn digest(&self) -> &str {
        match self {
            Self::Local { digest, .. } | Self::Uploaded { digest, .. } => digest,
        }
    }

    /// The server-issued identifier, once uploaded.
    pub fn server_id(&self) -> Option<&str> {
        match self {
            Self::Uploaded { id, .. } => Some(id),
            Self::Local { .. } => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }

    /// The uploaded form of this handle.
    pub fn uploaded(&self, id: impl Into<String>) -> Self {
        Self::Uploaded {
            id: id.into(),
            name: self.name().to_string(),
            digest: self.digest().to_string(),
        }
    }
}
