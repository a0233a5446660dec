//! Metadata persistence.
//!
//! This module provides:
//! - Atomic JSON file operations
//! - The per-folder [`MetadataStore`] of tags and comments

mod atomic;
mod store;

pub use atomic::{atomic_read_json, atomic_write_json};
pub use store::{parse_tags, EntityMetadata, MetadataStore};
