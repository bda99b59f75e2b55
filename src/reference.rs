//! Reference data loading.
//!
//! Each list is fetched on its own. A list that fails comes back empty with a
//! notice for the user; the other list is unaffected, and membership checks
//! against an empty list are skipped.

use tracing::warn;

use crate::api::ApiClient;
use crate::model::{ReferenceData, ReferenceList};

/// The lists that loaded, plus one notice per list that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loaded {
    pub data: ReferenceData,
    pub notices: Vec<String>,
}

/// Fetch every reference list.
pub fn load(api: &ApiClient) -> Loaded {
    load_lists(api, &ReferenceList::ALL)
}

/// Fetch the given lists.
pub fn load_lists(api: &ApiClient, lists: &[ReferenceList]) -> Loaded {
    let mut loaded = Loaded::default();
    for &list in lists {
        match api.reference(list) {
            Ok(options) => loaded.data.set(list, options),
            Err(e) => {
                warn!(list = list.path(), error = %e, "failed to load reference list");
                loaded
                    .notices
                    .push(format!("Could not load {}: {e}", list.label()));
            }
        }
    }
    loaded
}
