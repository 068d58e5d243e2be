//! # Stratus Catalog
//!
//! The in-process index of known objects across providers. Read-mostly;
//! bulk-rewritten per provider on refresh; single-entry updated when a
//! migration lands.
//!
//! Each provider gets its own partition behind its own lock, so a refresh of
//! one provider never blocks reads of another, and readers always see a
//! whole old or whole new snapshot of a partition — never a torn mixture.

pub mod catalog;
pub mod error;

pub use catalog::{CatalogFilter, ObjectCatalog, RefreshSummary, TierBucket};
pub use error::{CatalogError, CatalogResult};
