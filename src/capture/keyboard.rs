//! Keyboard press/release pairing.
//!
//! The tracker owns the per-key press map; it is only ever touched from the
//! keyboard hook thread, so no locking is needed. Completed pairs are turned
//! into [`EventKind::Keyboard`] values by the caller's channel plumbing.

use crate::capture::types::EventKind;
use std::collections::HashMap;

/// Pairs key presses with their releases to measure dwell time.
///
/// State is bounded: one pending press per key identity. If a key is pressed
/// again before its release arrives, the stored press time is overwritten —
/// only the most recent unmatched press is measured. A release with no
/// recorded press is dropped.
#[derive(Debug, Default)]
pub struct KeyboardTracker {
    pending: HashMap<String, f64>,
}

impl KeyboardTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press at `at` (monotonic seconds).
    pub fn key_pressed(&mut self, key: &str, at: f64) {
        self.pending.insert(key.to_string(), at);
    }

    /// Record a release; emits the completed pair, or `None` for an
    /// unmatched release.
    pub fn key_released(&mut self, key: &str, at: f64) -> Option<EventKind> {
        let pressed_at = self.pending.remove(key)?;
        Some(EventKind::Keyboard {
            key: key.to_string(),
            dwell: (at - pressed_at).max(0.0),
        })
    }

    /// Number of keys currently held down.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
