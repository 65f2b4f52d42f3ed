//! Access decision gateway.
//!
//! Maps a verdict onto the protected operation: baseline-like behavior is
//! granted directly, anything else must pass a secondary challenge (a
//! time-based one-time passcode in the full deployment — issuing and
//! verifying that code is outside this crate). The gateway's only contact
//! with the pipeline is the engine facade.

use crate::engine::BehaviorEngine;
use crate::inference::{InferenceError, Verdict};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// Behavior matches the baseline; grant the protected operation.
    Grant,
    /// Behavior is suspicious; require the secondary challenge.
    Challenge,
}

impl AccessDecision {
    /// Pure mapping from a verdict.
    pub fn from_verdict(verdict: &Verdict) -> Self {
        if verdict.is_normal {
            AccessDecision::Grant
        } else {
            AccessDecision::Challenge
        }
    }
}

/// Gateway in front of a protected resource.
pub struct AccessGateway {
    engine: BehaviorEngine,
}

impl AccessGateway {
    pub fn new(engine: BehaviorEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &BehaviorEngine {
        &self.engine
    }

    /// Authorize based on the window `[start, end)`.
    ///
    /// An untrained model fails closed: the caller gets `Challenge` rather
    /// than an error, since granting access on missing evidence is the one
    /// outcome a gate must never produce.
    pub fn authorize(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<AccessDecision, InferenceError> {
        match self.engine.evaluate_window(start, end) {
            Ok(verdict) => {
                let decision = AccessDecision::from_verdict(&verdict);
                tracing::info!(
                    window = %verdict.window.label(),
                    score = verdict.anomaly_score,
                    decision = ?decision,
                    "access decision"
                );
                Ok(decision)
            }
            Err(InferenceError::ModelNotTrained) => {
                tracing::warn!("no baseline model; failing closed to challenge");
                Ok(AccessDecision::Challenge)
            }
            Err(e) => Err(e),
        }
    }

    /// Authorize based on the newest closed window as of `now`.
    pub fn authorize_latest(&self, now: NaiveDateTime) -> Result<AccessDecision, InferenceError> {
        match self.engine.evaluate_latest(now) {
            Ok(verdict) => Ok(AccessDecision::from_verdict(&verdict)),
            Err(InferenceError::ModelNotTrained) => Ok(AccessDecision::Challenge),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::{EventKind, RawEvent};
    use crate::config::Config;
    use crate::store::EventLog;
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn verdict(is_normal: bool) -> Verdict {
        Verdict {
            is_normal,
            anomaly_score: 0.5,
            window: crate::features::Window::new(base(), Duration::seconds(30)),
        }
    }

    #[test]
    fn test_decision_mapping() {
        assert_eq!(
            AccessDecision::from_verdict(&verdict(true)),
            AccessDecision::Grant
        );
        assert_eq!(
            AccessDecision::from_verdict(&verdict(false)),
            AccessDecision::Challenge
        );
    }

    #[test]
    fn test_untrained_model_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_path: dir.path().to_path_buf(),
            ..Config::default()
        };
        let engine = BehaviorEngine::new(Arc::new(EventLog::open_in_memory().unwrap()), config);
        let gateway = AccessGateway::new(engine);

        let decision = gateway
            .authorize(base(), base() + Duration::seconds(30))
            .unwrap();
        assert_eq!(decision, AccessDecision::Challenge);
    }
}
