//! Identity derivation from entity attributes.
//!
//! Every field is written at a fixed width so adjacent fields of the lineage
//! key cannot bleed into each other. An absent attribute is filled to its
//! width instead of failing.

use super::Identity;
use crate::config::IdentityConfig;
use crate::entity::EntityRecord;
use std::fmt::Write;

/// Width of a zero-padded `u32` personality value.
const PERSONALITY_WIDTH: usize = 10;
/// Width of one individual value.
const IV_WIDTH: usize = 2;
/// Width of a zero-padded `u16` (trainer ids, name code units).
const U16_WIDTH: usize = 5;
/// Filler for an absent lineage attribute.
const MISSING: char = '_';

/// Derive the identity of a record.
///
/// Deterministic and total. The record's position and container are ignored.
pub fn derive_identity(record: &EntityRecord) -> Identity {
    Identity::from_parts(&stage_marker(record), &lineage_key(record))
}

/// Species code padded to [`IdentityConfig::STAGE_WIDTH`], plus `_<form>`
/// for non-base forms.
pub fn stage_marker(record: &EntityRecord) -> String {
    let mut marker = format!(
        "{:0width$}",
        record.species.unwrap_or(0),
        width = IdentityConfig::STAGE_WIDTH
    );
    if let Some(form) = record.form.filter(|f| *f != 0) {
        marker.push(IdentityConfig::FORM_SEPARATOR);
        marker.push_str(&form.to_string());
    }
    marker
}

/// Attributes that survive a transformation, concatenated.
///
/// An absent attribute is written as [`MISSING`] at the field's width so the
/// fields after it keep their offsets. A record without any of these
/// attributes has an empty lineage key.
pub fn lineage_key(record: &EntityRecord) -> String {
    let trainer_name = record.trainer_name.as_deref().filter(|n| !n.is_empty());
    if record.personality.is_none()
        && record.ivs.is_none()
        && record.trainer_id.is_none()
        && record.secret_id.is_none()
        && trainer_name.is_none()
    {
        return String::new();
    }

    let mut key = String::new();
    push_field(&mut key, record.personality, PERSONALITY_WIDTH);
    match record.ivs {
        Some(ivs) => {
            for iv in ivs {
                push_field(&mut key, Some(iv), IV_WIDTH);
            }
        }
        None => push_missing(&mut key, IV_WIDTH * 6),
    }
    push_field(&mut key, record.trainer_id, U16_WIDTH);
    push_field(&mut key, record.secret_id, U16_WIDTH);

    // Last field, so its variable length shifts nothing.
    for unit in trainer_name.unwrap_or_default().encode_utf16() {
        push_field(&mut key, Some(unit), U16_WIDTH);
    }

    key
}

fn push_field<T: std::fmt::Display>(key: &mut String, value: Option<T>, width: usize) {
    match value {
        // write! into a String cannot fail
        Some(value) => {
            let _ = write!(key, "{:0width$}", value, width = width);
        }
        None => push_missing(key, width),
    }
}

fn push_missing(key: &mut String, width: usize) {
    key.extend(std::iter::repeat(MISSING).take(width));
}
