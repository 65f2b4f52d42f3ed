//! Baseline training.
//!
//! Consumes a closed, fully-past span of the event log and fits a paired
//! scaler + isolation forest over its windows. Empty windows are part of the
//! training matrix: the model has to know what "nothing happening" looks
//! like, because inference will see it too.

use crate::config::Config;
use crate::features::{extract_features, partition, FeatureVector, FEATURE_DIM};
use crate::model::{
    local_hostname, score_threshold, IsolationForest, Model, StandardScaler, MODEL_FORMAT_VERSION,
};
use crate::store::{EventLog, StoreError};
use chrono::{NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Errors from baseline training. All recoverable: retry with more history
/// or after fixing the store.
#[derive(Debug)]
pub enum TrainingError {
    /// The span is shorter than the configured baseline duration.
    InsufficientBaseline {
        required_secs: u64,
        actual_secs: i64,
    },
    Store(StoreError),
    Artifact(crate::model::ModelError),
}

impl std::fmt::Display for TrainingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainingError::InsufficientBaseline {
                required_secs,
                actual_secs,
            } => write!(
                f,
                "insufficient baseline: span covers {actual_secs}s, need at least {required_secs}s"
            ),
            TrainingError::Store(e) => write!(f, "store error during training: {e}"),
            TrainingError::Artifact(e) => write!(f, "could not persist model: {e}"),
        }
    }
}

impl std::error::Error for TrainingError {}

impl From<StoreError> for TrainingError {
    fn from(e: StoreError) -> Self {
        TrainingError::Store(e)
    }
}

/// Train a baseline over `[start, end)` with a caller-supplied RNG.
///
/// The caller is responsible for passing a span fully in the past; training
/// does not check the wall clock.
pub fn train_baseline_with_rng<R: Rng>(
    log: &EventLog,
    start: NaiveDateTime,
    end: NaiveDateTime,
    config: &Config,
    rng: &mut R,
) -> Result<Model, TrainingError> {
    let required_secs = config.baseline_duration.as_secs();
    let actual_secs = (end - start).num_seconds();
    if actual_secs < required_secs as i64 {
        return Err(TrainingError::InsufficientBaseline {
            required_secs,
            actual_secs,
        });
    }

    let windows = partition(start, end, config.window_size_chrono());
    // The last window may extend past `end`; fetch to its true edge so its
    // feature semantics match inference exactly.
    let fetch_end = windows.last().map(|w| w.end).unwrap_or(end);
    let events = log.all_events_between(start, fetch_end)?;

    let matrix: Vec<FeatureVector> = windows
        .iter()
        .map(|w| extract_features(w, &events))
        .collect();

    tracing::info!(
        windows = matrix.len(),
        events = events.len(),
        dim = FEATURE_DIM,
        "fitting baseline model"
    );

    let scaler = StandardScaler::fit(&matrix);
    let scaled = scaler.transform_all(&matrix);
    let forest = IsolationForest::fit(&scaled, config.tree_count, rng);

    let training_scores: Vec<f64> = scaled.iter().map(|row| forest.score(row)).collect();
    let threshold = score_threshold(&training_scores, config.contamination);

    Ok(Model {
        format_version: MODEL_FORMAT_VERSION,
        model_id: uuid::Uuid::new_v4(),
        dim: FEATURE_DIM,
        contamination: config.contamination,
        threshold,
        trained_at: Utc::now(),
        host: local_hostname(),
        scaler,
        forest,
    })
}

/// Train a baseline over `[start, end)`.
pub fn train_baseline(
    log: &EventLog,
    start: NaiveDateTime,
    end: NaiveDateTime,
    config: &Config,
) -> Result<Model, TrainingError> {
    train_baseline_with_rng(log, start, end, config, &mut StdRng::from_entropy())
}
