//! Persisted model artifact.
//!
//! The scaler and the forest are one unit: a vector normalized by one
//! scaler must never be scored by a forest fitted against another. They are
//! therefore persisted together in a single JSON file, written atomically
//! (temp file + rename) so readers never observe a half-written pair.
//! Retraining replaces the artifact wholesale.

use crate::features::FeatureVector;
use crate::model::forest::IsolationForest;
use crate::model::scaler::StandardScaler;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Artifact format version; bumped on incompatible layout changes.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Errors from loading or saving a model artifact.
#[derive(Debug)]
pub enum ModelError {
    /// No artifact exists at the path. Callers surface this as
    /// "model not trained".
    NotFound(PathBuf),
    Io(std::io::Error),
    Malformed(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::NotFound(path) => write!(f, "no model artifact at {}", path.display()),
            ModelError::Io(e) => write!(f, "model artifact IO error: {e}"),
            ModelError::Malformed(e) => write!(f, "malformed model artifact: {e}"),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Io(e)
    }
}

/// A trained baseline model: paired normalizer + outlier ensemble, plus the
/// dimensionality contract and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub format_version: u32,
    /// Identity of this training run; changes on every retrain.
    pub model_id: Uuid,
    /// Feature dimensionality the pair was fitted for.
    pub dim: usize,
    /// Contamination prior used to fix the decision threshold.
    pub contamination: f64,
    /// Scores strictly above this classify as anomalous.
    pub threshold: f64,
    pub trained_at: DateTime<Utc>,
    /// Hostname of the machine that trained this baseline.
    pub host: String,
    pub scaler: StandardScaler,
    pub forest: IsolationForest,
}

impl Model {
    /// Score one feature vector: `(anomaly_score, is_normal)`.
    pub fn classify(&self, vector: &FeatureVector) -> (f64, bool) {
        let scaled = self.scaler.transform(vector);
        let score = self.forest.score(&scaled);
        (score, score <= self.threshold)
    }

    /// Whether an artifact exists at `path`.
    pub fn is_present(path: &Path) -> bool {
        path.is_file()
    }

    /// Load an artifact read-only.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let model: Model =
            serde_json::from_str(&content).map_err(|e| ModelError::Malformed(e.to_string()))?;
        if model.format_version != MODEL_FORMAT_VERSION {
            return Err(ModelError::Malformed(format!(
                "unsupported artifact version {}",
                model.format_version
            )));
        }
        Ok(model)
    }

    /// Atomically write the artifact: serialize to a sibling temp file,
    /// then rename over the destination.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self).map_err(|e| ModelError::Malformed(e.to_string()))?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// Hostname for artifact provenance.
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
