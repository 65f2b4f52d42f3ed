//! Windowing and feature extraction.
//!
//! This module contains:
//! - Half-open time windows and gapless span partitioning
//! - The fixed-dimensional feature vector contract

pub mod extract;
pub mod window;

// Re-export commonly used types
pub use extract::{extract_features, FeatureVector, FEATURE_DIM, FOCUS_DIM, KEYBOARD_DIM, MOUSE_DIM};
pub use window::{partition, Window};
