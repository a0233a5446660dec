//! boxtrack core - identity tracking for entities stored in save containers.
//!
//! This crate tracks entities found inside save files across repeated scans
//! of a folder. It derives a position-independent identity for each entity,
//! classifies a new scan against the identities already known, detects
//! transformations and duplicates, and migrates the user's tags and comments
//! when an identity changes.
//!
//! Parsing the save formats is left to an [`EntityExtractor`]; presenting the
//! review and collecting decisions is left to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use boxtrack_core::{is_record_dump, JsonDumpExtractor, ReconcileDecisions, ScanSession};
//!
//! fn main() -> boxtrack_core::Result<()> {
//!     let mut session = ScanSession::open("/path/to/saves")?;
//!     let containers = session.discover(is_record_dump)?;
//!     let report = session.scan(&JsonDumpExtractor, &containers);
//!
//!     println!("{}", session.review(&report.classification));
//!
//!     let decisions = ReconcileDecisions::accept_all(&report.classification);
//!     let outcome = session.reconcile(&report.classification, &decisions, None)?;
//!     println!("{} identities to review", outcome.highlighted.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod reconcile;
pub mod scan;
pub mod storage;

mod session;

pub use entity::{
    discover_containers, extract_all, is_record_dump, is_save_container, Bucket,
    ContainerFailure, EntityExtractor, EntityRecord, ExtractionReport, JsonDumpExtractor,
    Position,
};
pub use error::{BoxtrackError, Result};
pub use identity::{derive_identity, Identity};
pub use metadata::{parse_tags, EntityMetadata, MetadataStore};
pub use reconcile::{
    apply, CloneResolution, ReconcileDecisions, ReconcileOutcome, ReviewSection, ReviewSummary,
};
pub use scan::{classify, correlate, diff, CloneGroup, EvolutionCandidate, ScanClassification};
pub use session::{ScanReport, ScanSession};
pub use storage::EntityStorage;
