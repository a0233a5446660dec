//! Reconciliation of a classified scan with the metadata store.
//!
//! The decision step sits between classification and application: the caller
//! shows a [`ReviewSummary`], collects a [`ReconcileDecisions`] value, and
//! hands it to [`apply`]. Nothing here reads user input.

mod applier;
mod decisions;
mod review;

pub use applier::{apply, CloneResolution, ReconcileOutcome};
pub use decisions::ReconcileDecisions;
pub use review::{ReviewSection, ReviewSummary};
