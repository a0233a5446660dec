//! Centralized configuration for boxtrack.
//!
//! Reserved names, separators and file locations shared by the scan pipeline,
//! the metadata store and the entity storage buckets.

/// Metadata file persistence.
pub struct StoreConfig;

impl StoreConfig {
    /// Hidden file at the root of every scanned folder.
    pub const METADATA_FILE_NAME: &'static str = ".boxtrack.meta.json";
    /// Copy the previous file to `.bak` before each overwrite.
    pub const KEEP_BACKUP: bool = true;
}

/// Tag handling.
pub struct TagConfig;

impl TagConfig {
    /// Marks a record whose entity was not found in the latest scan.
    pub const REMOVED_SENTINEL: &'static str = "removed";
    /// Separator used when tags are edited as a single line of text.
    pub const SEPARATOR: char = ',';
}

/// Identity string layout.
pub struct IdentityConfig;

impl IdentityConfig {
    /// Splits the stage marker from the lineage key.
    pub const SEPARATOR: char = '-';
    /// Zero-padded width of the species part of the stage marker.
    pub const STAGE_WIDTH: usize = 4;
    /// Joins a non-zero form number to the species code.
    pub const FORM_SEPARATOR: char = '_';
}

/// Clone group resolution.
pub struct CloneConfig;

impl CloneConfig {
    /// Suffix of the placeholder created when no clone member is kept.
    pub const UNRESOLVED_SUFFIX: &'static str = "(cloned-unresolved)";
    /// Positional index given to the second kept member; the first reuses
    /// the original identity.
    pub const FIRST_SUFFIX_INDEX: usize = 2;
}

/// Container discovery.
pub struct ScanConfig;

impl ScanConfig {
    /// Container files carry an extension starting with this prefix
    /// (`.pk3`, `.pk8`, `.pkm`, ...).
    pub const CONTAINER_EXTENSION_PREFIX: &'static str = "pk";
    /// Extension of record dumps read by the bundled JSON extractor.
    pub const DUMP_EXTENSION: &'static str = "json";
}

/// Shared directory names.
pub struct PathsConfig;

impl PathsConfig {
    /// Directory holding one subdirectory per identity.
    pub const ENTITY_STORAGE_DIR_NAME: &'static str = "entities";
}
