//! Per-folder metadata store.
//!
//! Maps each identity to the user's tags and comment. One store exists per
//! scanned root folder and lives in a hidden JSON file at that root:
//!
//! ```json
//! {
//!   "Entries": {
//!     "0025-...": { "Tags": ["shiny"], "Comment": "traded from Ana" }
//!   }
//! }
//! ```

use crate::config::{StoreConfig, TagConfig};
use crate::error::Result;
use crate::identity::Identity;
use crate::metadata::atomic::{atomic_read_json, atomic_write_json};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// User-authored metadata for one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntityMetadata {
    /// Case preserved, deduplicated, order-insignificant.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub comment: String,
}

impl EntityMetadata {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.comment.is_empty()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Add a tag. Returns `false` if it was already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Replace all tags with those parsed from a comma-separated line.
    pub fn set_tags_from_text(&mut self, text: &str) {
        self.tags = parse_tags(text);
    }

    /// Tags joined for single-line editing.
    pub fn tags_text(&self) -> String {
        self.tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Case-insensitive substring match over tags and comment.
    ///
    /// `query` must already be lowercase.
    fn matches(&self, query: &str) -> bool {
        self.tags.iter().any(|t| t.to_lowercase().contains(query))
            || self.comment.to_lowercase().contains(query)
    }
}

/// Split a comma-separated tag line, trimming and dropping empty entries.
pub fn parse_tags(text: &str) -> BTreeSet<String> {
    text.split(TagConfig::SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Identity-keyed metadata for one root folder.
///
/// The store is the single owner of persisted metadata. It is loaded once per
/// folder session, mutated in place and written back with [`save`](Self::save).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetadataStore {
    #[serde(default)]
    entries: BTreeMap<Identity, EntityMetadata>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location of the metadata file for `folder`.
    pub fn metadata_path(folder: &Path) -> PathBuf {
        folder.join(StoreConfig::METADATA_FILE_NAME)
    }

    /// Load the store for `folder`.
    ///
    /// A missing or unparsable file yields an empty store.
    pub fn load(folder: &Path) -> Self {
        match Self::try_load(folder) {
            Ok(store) => store,
            Err(e) => {
                warn!(
                    "Ignoring unreadable metadata in {}: {}",
                    folder.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Load the store for `folder`, reporting parse and read failures.
    pub fn try_load(folder: &Path) -> Result<Self> {
        let path = Self::metadata_path(folder);
        let store = atomic_read_json::<Self>(&path)?.unwrap_or_default();
        debug!("Loaded {} metadata entries from {}", store.len(), path.display());
        Ok(store)
    }

    /// Rewrite the whole metadata file for `folder`.
    ///
    /// Last writer wins: concurrent sessions on the same folder overwrite
    /// each other.
    pub fn save(&self, folder: &Path) -> Result<()> {
        let path = Self::metadata_path(folder);
        atomic_write_json(&path, self, StoreConfig::KEEP_BACKUP)?;
        info!("Saved {} metadata entries to {}", self.len(), path.display());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn get(&self, identity: &str) -> Option<&EntityMetadata> {
        self.entries.get(identity)
    }

    /// Fetch the record for `identity`, creating an empty one if needed.
    pub fn get_or_create(&mut self, identity: &Identity) -> &mut EntityMetadata {
        self.entries.entry(identity.clone()).or_default()
    }

    /// Remove the record for `identity`.
    pub fn delete(&mut self, identity: &str) -> Option<EntityMetadata> {
        self.entries.remove(identity)
    }

    /// Move the record at `old` to `new`.
    ///
    /// The value is preserved verbatim and replaces any record already at
    /// `new`. Returns `false` (and changes nothing) if `old` has no record.
    pub fn rename(&mut self, old: &Identity, new: &Identity) -> bool {
        if old == new {
            return self.contains(old.as_str());
        }
        let Some(metadata) = self.entries.remove(old.as_str()) else {
            return false;
        };
        if let Some(previous) = self.entries.insert(new.clone(), metadata) {
            if !previous.is_empty() {
                warn!("Replaced existing metadata at {} while renaming {}", new, old);
            }
        }
        debug!("Renamed metadata {} -> {}", old, new);
        true
    }

    /// Copy the record at `source` to `target` unless `target` already has one.
    ///
    /// Returns `true` if a record was written.
    pub fn duplicate(&mut self, source: &Identity, target: &Identity) -> bool {
        if self.contains(target.as_str()) {
            return false;
        }
        let metadata = self.entries.get(source.as_str()).cloned().unwrap_or_default();
        self.entries.insert(target.clone(), metadata);
        true
    }

    /// Add `tag` to the record for `identity`, creating the record if needed.
    ///
    /// Returns `false` if the tag was already present.
    pub fn add_tag(&mut self, identity: &Identity, tag: &str) -> bool {
        self.get_or_create(identity).add_tag(tag)
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identity, &EntityMetadata)> {
        self.entries.iter()
    }

    /// Identities matching `query` in a tag or the comment, case-insensitively.
    ///
    /// An empty query matches every entry.
    pub fn search(&self, query: &str) -> Vec<&Identity> {
        let query = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|(_, meta)| query.is_empty() || meta.matches(&query))
            .map(|(id, _)| id)
            .collect()
    }
}
