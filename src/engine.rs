//! Collaborator-facing facade over the pipeline.
//!
//! External consumers (the decision gateway, a UI, a challenge flow) only
//! see three operations: train a baseline, evaluate a window, check whether
//! a model exists. They never touch raw events, windows or model internals.
//!
//! The model artifact is loaded fresh on every evaluation call: cheap
//! enough at this scale, and a retrain is picked up immediately without
//! cache invalidation.

use crate::config::Config;
use crate::features::Window;
use crate::inference::{self, latest_closed_window, InferenceError, Verdict};
use crate::model::Model;
use crate::store::EventLog;
use crate::trainer::{self, TrainingError};
use chrono::NaiveDateTime;
use std::sync::Arc;

pub struct BehaviorEngine {
    log: Arc<EventLog>,
    config: Config,
}

impl BehaviorEngine {
    pub fn new(log: Arc<EventLog>, config: Config) -> Self {
        Self { log, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether a trained model artifact exists.
    pub fn is_model_present(&self) -> bool {
        Model::is_present(&self.config.model_path())
    }

    /// Train a baseline over `[start, end)` and atomically replace the
    /// persisted artifact with the result.
    pub fn train_baseline(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Model, TrainingError> {
        let model = trainer::train_baseline(&self.log, start, end, &self.config)?;
        model
            .save(&self.config.model_path())
            .map_err(TrainingError::Artifact)?;
        tracing::info!(
            path = %self.config.model_path().display(),
            trained_at = %model.trained_at,
            "baseline model persisted"
        );
        Ok(model)
    }

    /// Score the window `[start, end)` against the persisted model.
    pub fn evaluate_window(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Verdict, InferenceError> {
        let model = Model::load(&self.config.model_path())?;
        inference::evaluate_window(&self.log, &model, Window { start, end })
    }

    /// Score the newest fully-closed window as of `now`.
    pub fn evaluate_latest(&self, now: NaiveDateTime) -> Result<Verdict, InferenceError> {
        let window = latest_closed_window(now, self.config.window_size_chrono());
        self.evaluate_window(window.start, window.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::{EventKind, RawEvent};
    use chrono::{Duration, NaiveDate};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn engine_fixture(dir: &std::path::Path) -> BehaviorEngine {
        let log = EventLog::open_in_memory().unwrap();
        for i in 0..300 {
            log.append(&RawEvent::new(
                EventKind::Keyboard {
                    key: "a".into(),
                    dwell: 0.1,
                },
                base() + Duration::seconds(i * 2),
            ))
            .unwrap();
        }
        let config = Config {
            tree_count: 50,
            data_path: dir.to_path_buf(),
            ..Config::default()
        };
        BehaviorEngine::new(Arc::new(log), config)
    }

    #[test]
    fn test_inference_requires_training_first() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(dir.path());

        assert!(!engine.is_model_present());
        let result = engine.evaluate_window(base(), base() + Duration::seconds(30));
        assert!(matches!(result, Err(InferenceError::ModelNotTrained)));
    }

    #[test]
    fn test_train_then_evaluate() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(dir.path());

        engine
            .train_baseline(base(), base() + Duration::seconds(600))
            .unwrap();
        assert!(engine.is_model_present());

        let verdict = engine
            .evaluate_window(base() + Duration::seconds(60), base() + Duration::seconds(90))
            .unwrap();
        assert!(verdict.anomaly_score.is_finite());
    }

    #[test]
    fn test_retrain_replaces_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(dir.path());

        let first = engine
            .train_baseline(base(), base() + Duration::seconds(600))
            .unwrap();
        let second = engine
            .train_baseline(base(), base() + Duration::seconds(600))
            .unwrap();
        assert_ne!(first.model_id, second.model_id);

        let loaded = Model::load(&engine.config().model_path()).unwrap();
        assert_eq!(loaded.model_id, second.model_id);
    }

    #[test]
    fn test_evaluate_latest_uses_closed_window() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_fixture(dir.path());
        engine
            .train_baseline(base(), base() + Duration::seconds(600))
            .unwrap();

        let now = base() + Duration::seconds(700);
        let verdict = engine.evaluate_latest(now).unwrap();
        assert!(verdict.window.end < now);
    }
}
