//! # Stratus Core
//!
//! Domain model shared by every Stratus crate: providers, storage tiers,
//! object identities, catalog entries, placement recommendations, and the
//! error taxonomy that crosses component boundaries.
//!
//! Nothing in this crate performs I/O. Components own their state (the
//! catalog owns entries, the migration engine owns jobs) and exchange these
//! types by value.

pub mod error;
pub mod object;
pub mod provider;
pub mod tier;

pub use error::{CoreError, CoreResult, ErrorKind};
pub use object::{
    AccessStats, CatalogEntry, ObjectKey, ObjectRef, Rationale, RationaleTag, Recommendation,
    RecommendationPriority,
};
pub use provider::Provider;
pub use tier::Tier;
