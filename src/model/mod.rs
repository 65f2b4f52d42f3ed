//! Anomaly model: normalizer, isolation ensemble, persisted artifact.

pub mod artifact;
pub mod forest;
pub mod scaler;

pub use artifact::{local_hostname, Model, ModelError, MODEL_FORMAT_VERSION};
pub use forest::{score_threshold, IsolationForest};
pub use scaler::StandardScaler;
