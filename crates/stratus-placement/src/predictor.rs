//! Learned access predictor.
//!
//! The model artifact is a linear layer over the fixed feature schema,
//! trained offline and loaded at startup. Reload swaps the whole `Arc`:
//! concurrent inference sees the old model or the new one, never a partial
//! load. When the artifact is missing the predictor reports unavailable and
//! the classifier falls back to its rule surrogate.

use crate::error::{PlacementError, PlacementResult};
use crate::features::{FeatureVector, FEATURE_DIM};
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    weights: Vec<f64>,
    bias: f64,
}

#[derive(Debug)]
struct Model {
    weights: [f64; FEATURE_DIM],
    bias: f64,
}

impl Model {
    fn infer(&self, features: &FeatureVector) -> f64 {
        let dot: f64 = self
            .weights
            .iter()
            .zip(features.as_slice())
            .map(|(w, x)| w * x)
            .sum();
        (dot + self.bias).max(0.0)
    }
}

/// Inference over the fixed feature vector.
pub struct AccessPredictor {
    model: RwLock<Option<Arc<Model>>>,
    path: Option<PathBuf>,
}

impl AccessPredictor {
    /// A predictor with no model; always unavailable.
    pub fn disabled() -> Self {
        Self {
            model: RwLock::new(None),
            path: None,
        }
    }

    /// Load the artifact at `path`. A missing or invalid artifact leaves the
    /// predictor unavailable rather than failing startup.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let predictor = Self {
            model: RwLock::new(None),
            path: Some(path.into()),
        };
        if let Err(err) = predictor.reload() {
            warn!("access predictor unavailable: {}", err);
        }
        predictor
    }

    /// A predictor with an in-memory model, for tests and embedding.
    pub fn with_weights(weights: [f64; FEATURE_DIM], bias: f64) -> Self {
        Self {
            model: RwLock::new(Some(Arc::new(Model { weights, bias }))),
            path: None,
        }
    }

    /// Re-read the artifact and atomically swap the model in.
    pub fn reload(&self) -> PlacementResult<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| PlacementError::ArtifactIo("no artifact path configured".into()))?;
        let model = Arc::new(load_artifact(path)?);
        *self.model.write() = Some(model);
        info!("access predictor model loaded from {}", path.display());
        Ok(())
    }

    /// Whether a model is loaded. Reported to health.
    pub fn is_available(&self) -> bool {
        self.model.read().is_some()
    }

    /// Predicted access count for the next window, or `None` when no model
    /// is loaded. Pure in the feature vector for a fixed model; no I/O.
    pub fn predict(&self, features: &FeatureVector) -> Option<f64> {
        let model = self.model.read().clone()?;
        Some(model.infer(features))
    }
}

fn load_artifact(path: &Path) -> PlacementResult<Model> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| PlacementError::ArtifactIo(format!("{}: {}", path.display(), err)))?;
    let artifact: ModelArtifact = serde_json::from_str(&raw)
        .map_err(|err| PlacementError::ArtifactInvalid(err.to_string()))?;

    if artifact.weights.len() != FEATURE_DIM {
        return Err(PlacementError::ArtifactInvalid(format!(
            "expected {} weights, artifact has {}",
            FEATURE_DIM,
            artifact.weights.len()
        )));
    }

    let mut weights = [0.0f64; FEATURE_DIM];
    weights.copy_from_slice(&artifact.weights);
    Ok(Model {
        weights,
        bias: artifact.bias,
    })
}
