//! Persisted collapsed/expanded state keyed by stable keys.
//!
//! The store is a plain JSON document, `{"collapsedByFile": {path: [key, ...]}}`, so a host
//! can keep it next to its other settings. Keys rather than heading ids are stored so that
//! renaming a heading does not expand it again.

use crate::error::Error;
use crate::heading::HeadingNode;
use crate::stable_key::StableKeyIndex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Collapsed node keys per document path.
pub struct CollapsedStore {
    #[serde(default)]
    /// Document path to the stable keys of its collapsed headings.
    pub collapsed_by_file: BTreeMap<String, BTreeSet<String>>,
}

impl CollapsedStore {
    /// Load a store from disk; a missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::StateParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the store as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Mark a heading collapsed or expanded in `document`.
    ///
    /// Returns false if the heading id is not part of `headings`.
    pub fn set_collapsed(
        &mut self,
        document: &str,
        headings: &[HeadingNode],
        id: &str,
        collapsed: bool,
    ) -> bool {
        let keys = StableKeyIndex::new(headings);
        let Some(key) = keys.key(id) else {
            return false;
        };
        if collapsed {
            self.collapsed_by_file
                .entry(document.to_string())
                .or_default()
                .insert(key.to_string());
        } else if let Some(set) = self.collapsed_by_file.get_mut(document) {
            set.remove(key);
            if set.is_empty() {
                self.collapsed_by_file.remove(document);
            }
        }
        true
    }

    #[must_use]
    /// Current heading ids whose stored keys are collapsed, in document order.
    pub fn collapsed_ids(&self, document: &str, headings: &[HeadingNode]) -> Vec<String> {
        let Some(set) = self.collapsed_by_file.get(document) else {
            return Vec::new();
        };
        let keys = StableKeyIndex::new(headings);
        headings
            .iter()
            .filter(|h| keys.key(&h.id).is_some_and(|k| set.contains(k)))
            .map(|h| h.id.clone())
            .collect()
    }

    /// Move a document's entry after it was renamed.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(set) = self.collapsed_by_file.remove(from) {
            self.collapsed_by_file.insert(to.to_string(), set);
        }
    }

    /// Drop a document's entry.
    pub fn forget(&mut self, document: &str) {
        self.collapsed_by_file.remove(document);
    }
}

#[cfg(test)]
#[path = "tests/state.rs"]
mod tests;
