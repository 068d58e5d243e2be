//! # Stratus Placement
//!
//! Everything that decides where an object should live: the per-provider
//! price table, the fixed feature schema and learned access predictor, and
//! the deterministic placement classifier that combines them into at most
//! one recommendation per catalog entry.

pub mod classifier;
pub mod cost;
pub mod error;
pub mod features;
pub mod predictor;

pub use classifier::{ClassifierConfig, PlacementClassifier};
pub use cost::{CostModel, PriceTable, TierPrices};
pub use error::{PlacementError, PlacementResult};
pub use features::{ContentHint, FeatureVector, FEATURE_DIM};
pub use predictor::AccessPredictor;
