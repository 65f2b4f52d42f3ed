//! Window scoring against a trained baseline.
//!
//! Inference never mutates the model: a loaded [`Model`] can be shared
//! across concurrent calls. Scoring a window that is still filling gives a
//! misleading vector, so live evaluation goes through
//! [`latest_closed_window`], which backs off from "now" by a small epsilon.

use crate::features::{extract_features, Window};
use crate::model::{Model, ModelError};
use crate::store::{EventLog, StoreError};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Gap between "now" and the end of the newest window eligible for scoring.
const LIVE_EPSILON_SECS: i64 = 2;

/// Errors from window evaluation.
#[derive(Debug)]
pub enum InferenceError {
    /// No baseline has been trained yet. Train first; inference never
    /// trains implicitly.
    ModelNotTrained,
    Store(StoreError),
    Artifact(ModelError),
}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceError::ModelNotTrained => {
                write!(f, "model not trained: run baseline training first")
            }
            InferenceError::Store(e) => write!(f, "store error during inference: {e}"),
            InferenceError::Artifact(e) => write!(f, "model artifact error: {e}"),
        }
    }
}

impl std::error::Error for InferenceError {}

impl From<StoreError> for InferenceError {
    fn from(e: StoreError) -> Self {
        InferenceError::Store(e)
    }
}

impl From<ModelError> for InferenceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::NotFound(_) => InferenceError::ModelNotTrained,
            other => InferenceError::Artifact(other),
        }
    }
}

/// The verdict for one scored window. Ephemeral — produced per call, never
/// persisted with the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// True when the window looks like the trained baseline.
    pub is_normal: bool,
    /// Continuous anomaly score in (0, 1]; higher is more anomalous.
    pub anomaly_score: f64,
    /// The window this verdict refers to.
    pub window: Window,
}

/// Score one window's events against a loaded model.
pub fn evaluate_window(
    log: &EventLog,
    model: &Model,
    window: Window,
) -> Result<Verdict, InferenceError> {
    let events = log.all_events_between(window.start, window.end)?;
    let vector = extract_features(&window, &events);
    let (anomaly_score, is_normal) = model.classify(&vector);

    tracing::debug!(
        window = %window.label(),
        events = events.len(),
        score = anomaly_score,
        normal = is_normal,
        "window evaluated"
    );

    Ok(Verdict {
        is_normal,
        anomaly_score,
        window,
    })
}

/// The newest fully-closed window as of `now`: it ends at `now - ε` so a
/// still-filling window is never scored.
pub fn latest_closed_window(now: NaiveDateTime, window_size: Duration) -> Window {
    let end = now - Duration::seconds(LIVE_EPSILON_SECS);
    Window {
        start: end - window_size,
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::{EventKind, RawEvent};
    use crate::config::Config;
    use crate::trainer::train_baseline_with_rng;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn trained_fixture() -> (EventLog, Model, Config) {
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
            ..Config::default()
        };
        let mut rng = StdRng::seed_from_u64(31);
        let model = train_baseline_with_rng(
            &log,
            base(),
            base() + Duration::seconds(600),
            &config,
            &mut rng,
        )
        .unwrap();
        (log, model, config)
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let (log, model, config) = trained_fixture();
        let window = Window::new(base() + Duration::seconds(60), config.window_size_chrono());

        let first = evaluate_window(&log, &model, window).unwrap();
        let second = evaluate_window(&log, &model, window).unwrap();
        assert_eq!(first.is_normal, second.is_normal);
        assert_eq!(first.anomaly_score, second.anomaly_score);
    }

    #[test]
    fn test_empty_window_evaluates_without_error() {
        let (log, model, config) = trained_fixture();
        // A window far after the data: zero events across all modalities.
        let window = Window::new(base() + Duration::seconds(3600), config.window_size_chrono());

        let verdict = evaluate_window(&log, &model, window).unwrap();
        assert!(verdict.anomaly_score.is_finite());
        assert!(verdict.anomaly_score > 0.0);
    }

    #[test]
    fn test_latest_closed_window_backs_off_from_now() {
        let now = base() + Duration::seconds(100);
        let window = latest_closed_window(now, Duration::seconds(30));
        assert!(window.end < now);
        assert_eq!(window.end - window.start, Duration::seconds(30));
        assert_eq!(now - window.end, Duration::seconds(LIVE_EPSILON_SECS));
    }

    #[test]
    fn test_verdict_references_its_window() {
        let (log, model, config) = trained_fixture();
        let window = Window::new(base(), config.window_size_chrono());
        let verdict = evaluate_window(&log, &model, window).unwrap();
        assert_eq!(verdict.window, window);
    }
}
