//! Session storage: the signed-in dashboard user.

use std::{fs, io};

use crate::model::Session;

use super::{Result, Storage, remove_if_present};

impl Storage {
    /// Loads the saved session, if any.
    pub fn load_session(&self) -> Result<Option<Session>> {
        match fs::read_to_string(self.session_path()) {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        fs::write(self.session_path(), json)?;
        Ok(())
    }

    /// Removes the saved session. Idempotent.
    pub fn clear_session(&self) -> Result<()> {
        remove_if_present(&self.session_path())
    }
}
