//! Entity records extracted from save containers.
//!
//! An [`EntityRecord`] is one occurrence of a trackable entity found in one
//! container during one scan. Records are ephemeral: the scan pipeline derives
//! an [`Identity`](crate::identity::Identity) from them and only the identity
//! outlives the scan.

mod extractor;

pub use extractor::{
    discover_containers, extract_all, is_record_dump, is_save_container, ContainerFailure,
    EntityExtractor, ExtractionReport, JsonDumpExtractor,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage area holding an entity inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "index")]
pub enum Bucket {
    /// The primary roster carried by the player.
    Roster,
    /// A numbered storage box (zero-based).
    Box(u16),
}

/// Where an entity sits inside its container.
///
/// Position never participates in identity derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub bucket: Bucket,
    /// Zero-based slot within the bucket.
    pub slot: u16,
}

impl Position {
    pub fn roster(slot: u16) -> Self {
        Self {
            bucket: Bucket::Roster,
            slot,
        }
    }

    pub fn boxed(index: u16, slot: u16) -> Self {
        Self {
            bucket: Bucket::Box(index),
            slot,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bucket {
            Bucket::Roster => write!(f, "Roster, Slot {}", self.slot + 1),
            Bucket::Box(index) => write!(f, "Box {}, Slot {}", index + 1, self.slot + 1),
        }
    }
}

/// One entity occurrence as reported by an [`EntityExtractor`].
///
/// Every attribute except the position is optional: container formats differ
/// in what they store, and a missing attribute must never block a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    /// Species code. `0` or absent marks an empty slot.
    #[serde(default)]
    pub species: Option<u16>,
    /// Alternate form number; `0` is the base form.
    #[serde(default)]
    pub form: Option<u8>,
    /// Personality value, fixed at creation.
    #[serde(default)]
    pub personality: Option<u32>,
    /// Individual values in stat order (HP, Atk, Def, SpA, SpD, Spe).
    #[serde(default)]
    pub ivs: Option<[u8; 6]>,
    /// 16-bit trainer id of the original trainer.
    #[serde(default)]
    pub trainer_id: Option<u16>,
    /// 16-bit secret id of the original trainer.
    #[serde(default)]
    pub secret_id: Option<u16>,
    /// Original trainer name.
    #[serde(default)]
    pub trainer_name: Option<String>,
    /// Display nickname. Informational only.
    #[serde(default)]
    pub nickname: Option<String>,
    pub position: Position,
    /// File name of the container the record came from.
    #[serde(default)]
    pub container: String,
}

impl EntityRecord {
    /// Create a record with only a species and a position set.
    pub fn new(species: u16, position: Position) -> Self {
        Self {
            species: Some(species),
            form: None,
            personality: None,
            ivs: None,
            trainer_id: None,
            secret_id: None,
            trainer_name: None,
            nickname: None,
            position,
            container: String::new(),
        }
    }

    pub fn with_form(mut self, form: u8) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_personality(mut self, personality: u32) -> Self {
        self.personality = Some(personality);
        self
    }

    pub fn with_ivs(mut self, ivs: [u8; 6]) -> Self {
        self.ivs = Some(ivs);
        self
    }

    pub fn with_trainer(mut self, trainer_id: u16, secret_id: u16, name: impl Into<String>) -> Self {
        self.trainer_id = Some(trainer_id);
        self.secret_id = Some(secret_id);
        self.trainer_name = Some(name.into());
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    /// Whether the slot holds no entity at all.
    pub fn is_empty_slot(&self) -> bool {
        matches!(self.species, None | Some(0))
    }

    /// Short human description, e.g. `Species 25 - Pika (Box 1, Slot 3)`.
    pub fn describe(&self) -> String {
        let species = self
            .species
            .map(|s| s.to_string())
            .unwrap_or_else(|| "?".to_string());
        let nickname = self.nickname.as_deref().unwrap_or("?");
        format!("Species {} - {} ({})", species, nickname, self.position)
    }
}
