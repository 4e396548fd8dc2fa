// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Durable flag store.
//!
//! Flags are named booleans that survive across hook invocations. Every change
//! is written through to a JSON state document before the call returns, so a
//! crash right after `set` never loses a milestone. Setting a flag that is
//! already set and clearing one that is absent are no-ops and touch nothing on
//! disk.
//!
//! The same document remembers the content hashes observed by
//! `when_file_changed` conditions and the last seen charm configuration hash.

use crate::constants::{STATE_DIR_NAME, STATE_FILE_NAME};
use crate::errors::StateError;
use crate::io::{atomic_write, read_optional};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk representation of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    /// Flags currently set
    #[serde(default)]
    pub flags: BTreeSet<String>,

    /// Path → content hash observed by the last successful dispatch pass
    #[serde(default)]
    pub file_hashes: BTreeMap<String, String>,

    /// Hash of the charm configuration seen by the last successful pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    /// OpenStack release whose packages are installed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_release: Option<String>,

    /// When the document was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Flag store backed by a state file, or purely in memory.
#[derive(Debug, Clone, Default)]
pub struct FlagStore {
    path: Option<PathBuf>,
    doc: StateDocument,
}

/// Default state file location beneath a charm directory.
#[must_use]
pub fn default_state_path(charm_dir: &Path) -> PathBuf {
    charm_dir.join(STATE_DIR_NAME).join(STATE_FILE_NAME)
}

impl FlagStore {
    /// Create an empty store that never touches disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store persisted at `path`.
    ///
    /// A missing file yields an empty store. A file that exists but does not
    /// decode is an error: silently resetting would re-run every milestone.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Read`] or [`StateError::Corrupt`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let doc = match read_optional(&path).map_err(|source| StateError::Read {
            path: path.clone(),
            source,
        })? {
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| StateError::Corrupt {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
            None => StateDocument::default(),
        };

        debug!(
            path = %path.display(),
            flags = doc.flags.len(),
            "Loaded flag store"
        );

        Ok(Self {
            path: Some(path),
            doc,
        })
    }

    /// Path of the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Set a flag. Returns `true` if the flag was not set before.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Write`] if the change cannot be persisted; the
    /// in-memory view is rolled back in that case.
    pub fn set(&mut self, name: &str) -> Result<bool, StateError> {
        if !self.doc.flags.insert(name.to_string()) {
            return Ok(false);
        }
        if let Err(e) = self.persist() {
            self.doc.flags.remove(name);
            return Err(e);
        }
        debug!(flag = name, "Set flag");
        Ok(true)
    }

    /// Clear a flag. Returns `true` if the flag was set before.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Write`] if the change cannot be persisted; the
    /// in-memory view is rolled back in that case.
    pub fn clear(&mut self, name: &str) -> Result<bool, StateError> {
        if !self.doc.flags.remove(name) {
            return Ok(false);
        }
        if let Err(e) = self.persist() {
            self.doc.flags.insert(name.to_string());
            return Err(e);
        }
        debug!(flag = name, "Cleared flag");
        Ok(true)
    }

    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.doc.flags.contains(name)
    }

    /// All flags currently set, sorted.
    #[must_use]
    pub fn flags(&self) -> &BTreeSet<String> {
        &self.doc.flags
    }

    /// Hash recorded for `path` by the last successful pass.
    #[must_use]
    pub fn file_hash(&self, path: &str) -> Option<&str> {
        self.doc.file_hashes.get(path).map(String::as_str)
    }

    /// Merge newly observed file hashes into the document.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Write`] if the document cannot be persisted.
    pub fn record_file_hashes(
        &mut self,
        hashes: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), StateError> {
        let mut changed = false;
        for (path, hash) in hashes {
            if self.doc.file_hashes.get(&path) != Some(&hash) {
                self.doc.file_hashes.insert(path, hash);
                changed = true;
            }
        }
        if changed {
            self.persist()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn config_hash(&self) -> Option<&str> {
        self.doc.config_hash.as_deref()
    }

    /// Remember the configuration hash seen by a successful pass.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Write`] if the document cannot be persisted.
    pub fn record_config_hash(&mut self, hash: &str) -> Result<(), StateError> {
        if self.doc.config_hash.as_deref() == Some(hash) {
            return Ok(());
        }
        self.doc.config_hash = Some(hash.to_string());
        self.persist()
    }

    #[must_use]
    pub fn installed_release(&self) -> Option<&str> {
        self.doc.installed_release.as_deref()
    }

    /// Remember which release's packages are installed.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Write`] if the document cannot be persisted.
    pub fn record_installed_release(&mut self, release: &str) -> Result<(), StateError> {
        if self.doc.installed_release.as_deref() == Some(release) {
            return Ok(());
        }
        self.doc.installed_release = Some(release.to_string());
        self.persist()
    }

    /// Read-only view of the whole document.
    #[must_use]
    pub fn document(&self) -> &StateDocument {
        &self.doc
    }

    fn persist(&mut self) -> Result<(), StateError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        self.doc.updated_at = Some(Utc::now());
        let bytes = serde_json::to_vec_pretty(&self.doc).map_err(|e| StateError::Write {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        atomic_write(path, &bytes, crate::constants::SECRET_FILE_MODE).map_err(|source| {
            StateError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

#[cfg(test)]
#[path = "flags_tests.rs"]
mod flags_tests;
