//! Stable identities for extracted entities.
//!
//! An identity is `<stage marker>-<lineage key>`:
//! - the stage marker is the species code (plus a non-zero form) and changes
//!   when the entity transforms
//! - the lineage key concatenates the attributes that survive a transformation:
//!   personality value, individual values, trainer ids and trainer name
//!
//! Position is never part of an identity, so moving an entity to another box,
//! slot or container leaves its identity untouched.

mod derive;

pub use derive::{derive_identity, lineage_key, stage_marker};

use crate::config::{CloneConfig, IdentityConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::LazyLock;

/// Matches identities produced by clone resolution: `X(2)`, `X(cloned-unresolved)`.
static CLONE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(.+?)(?:\((\d+)\)|{})$",
        regex::escape(CloneConfig::UNRESOLVED_SUFFIX)
    ))
    .unwrap()
});

/// Tracking key of an entity.
///
/// Opaque apart from [`stage_marker`](Self::stage_marker) and
/// [`lineage_key`](Self::lineage_key), which split on the first separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Join a stage marker and a lineage key.
    pub fn from_parts(stage_marker: &str, lineage_key: &str) -> Self {
        Self(format!(
            "{}{}{}",
            stage_marker,
            IdentityConfig::SEPARATOR,
            lineage_key
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(stage marker, lineage key)`.
    ///
    /// Returns `None` for a malformed identity without a separator.
    pub fn split(&self) -> Option<(&str, &str)> {
        self.0.split_once(IdentityConfig::SEPARATOR)
    }

    /// Stage marker, or `""` for a malformed identity.
    pub fn stage_marker(&self) -> &str {
        self.split().map(|(stage, _)| stage).unwrap_or("")
    }

    /// Lineage key, or `""` for a malformed identity.
    pub fn lineage_key(&self) -> &str {
        self.split().map(|(_, lineage)| lineage).unwrap_or("")
    }

    /// Identity of the `index`-th kept member of a clone group.
    pub fn with_clone_index(&self, index: usize) -> Self {
        Self(format!("{}({})", self.0, index))
    }

    /// Placeholder for a clone group where no member was kept.
    pub fn unresolved_clone(&self) -> Self {
        Self(format!("{}{}", self.0, CloneConfig::UNRESOLVED_SUFFIX))
    }

    /// The identity a clone-resolution identity was derived from.
    ///
    /// `None` when this identity carries no clone suffix.
    pub fn clone_base(&self) -> Option<Identity> {
        CLONE_SUFFIX
            .captures(&self.0)
            .and_then(|caps| caps.get(1))
            .map(|base| Identity(base.as_str().to_string()))
    }

    /// Suffix number of an `X(n)` identity.
    ///
    /// `None` for the unresolved placeholder and for plain identities.
    pub fn clone_index(&self) -> Option<usize> {
        CLONE_SUFFIX
            .captures(&self.0)
            .and_then(|caps| caps.get(2))
            .and_then(|n| n.as_str().parse().ok())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split() {
        let id = Identity::from("0025-A");
        assert_eq!(id.stage_marker(), "0025");
        assert_eq!(id.lineage_key(), "A");
        assert_eq!(Identity::from_parts("0025", "A"), id);
    }

    #[test]
    fn test_malformed_identity_degrades_to_empty_parts() {
        let id = Identity::from("no_separator_here");
        assert!(id.split().is_none());
        assert_eq!(id.stage_marker(), "");
        assert_eq!(id.lineage_key(), "");
    }

    #[test]
    fn test_split_uses_first_separator() {
        let id = Identity::from("0004-XYZ(cloned-unresolved)");
        assert_eq!(id.stage_marker(), "0004");
        assert_eq!(id.lineage_key(), "XYZ(cloned-unresolved)");
    }

    #[test]
    fn test_clone_suffixes() {
        let id = Identity::from("0004-XYZ");
        assert_eq!(id.with_clone_index(2).as_str(), "0004-XYZ(2)");
        assert_eq!(id.unresolved_clone().as_str(), "0004-XYZ(cloned-unresolved)");

        assert_eq!(id.with_clone_index(3).clone_base(), Some(id.clone()));
        assert_eq!(id.unresolved_clone().clone_base(), Some(id.clone()));
        assert_eq!(id.clone_base(), None);
        assert_eq!(Identity::from("(2)").clone_base(), None);
    }

    #[test]
    fn test_clone_index() {
        let id = Identity::from("0004-XYZ");
        assert_eq!(id.with_clone_index(3).clone_index(), Some(3));
        assert_eq!(id.with_clone_index(2).with_clone_index(4).clone_index(), Some(4));
        assert_eq!(id.unresolved_clone().clone_index(), None);
        assert_eq!(id.clone_index(), None);
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = Identity::from("0025-A");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0025-A\"");
    }
}
