//! Behavior Sentry - Continuous behavioral authentication for workstations.
//!
//! This library observes keyboard, mouse and window-focus behavior, reduces
//! it into fixed-size statistical windows, and scores each window against an
//! unsupervised baseline model of the user's own behavior. The resulting
//! verdict gates access to protected resources: baseline-like behavior is
//! granted directly, anything else requires a secondary challenge.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Behavior Sentry                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌─────────┐  │
//! │  │ Capture  │──▶│   Event   │──▶│ Windowing │──▶│ Trainer │  │
//! │  │ adapters │   │   store   │   │ /features │   │         │  │
//! │  └──────────┘   └───────────┘   └───────────┘   └────┬────┘  │
//! │                                       │              ▼       │
//! │                                       │         ┌─────────┐  │
//! │                                       └────────▶│  Model  │  │
//! │                                                 └────┬────┘  │
//! │                                                      ▼       │
//! │                                 ┌──────────┐   ┌───────────┐ │
//! │                                 │ Gateway  │◀──│ Inference │ │
//! │                                 └──────────┘   └───────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Capture adapters publish immutable events through a single-writer
//! channel into the append-only store. Training reads a closed historical
//! span; inference scores the newest fully-closed window. Both go through
//! the same partitioning and extraction code, so window semantics cannot
//! drift between them.
//!
//! # Example
//!
//! ```no_run
//! use behavior_sentry::{BehaviorEngine, Config, EventLog};
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let log = Arc::new(EventLog::open(&config.event_log_path()).expect("open event log"));
//! let engine = BehaviorEngine::new(log, config);
//!
//! if engine.is_model_present() {
//!     let now = chrono::Local::now().naive_local();
//!     let verdict = engine.evaluate_latest(now).expect("evaluate");
//!     println!("normal: {}", verdict.is_normal);
//! }
//! ```

pub mod agent;
pub mod capture;
pub mod config;
pub mod engine;
pub mod features;
pub mod gateway;
pub mod inference;
pub mod model;
pub mod stats;
pub mod store;
pub mod trainer;

// Re-export key types at crate root for convenience
pub use agent::CaptureAgent;
pub use capture::{EventKind, EventType, RawEvent};
pub use config::{Config, LogConfig};
pub use engine::BehaviorEngine;
pub use features::{extract_features, FeatureVector, Window, FEATURE_DIM};
pub use gateway::{AccessDecision, AccessGateway};
pub use inference::{InferenceError, Verdict};
pub use model::Model;
pub use stats::{CaptureStats, SharedCaptureStats};
pub use store::{EventLog, StoreError};
pub use trainer::TrainingError;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
