//! Feature extraction from one window of raw events.
//!
//! `extract_features` is a stateless pure function: one window plus its
//! events in, one fixed-length vector out. The anomaly model depends on the
//! vector length never changing, so a modality with zero events contributes
//! an all-zero sub-vector of its declared width — never a shorter vector.

use crate::capture::types::{is_backspace_key, is_modifier_key, EventKind, RawEvent};
use crate::features::window::Window;
use serde::{Deserialize, Serialize};

/// Keyboard sub-vector width.
pub const KEYBOARD_DIM: usize = 5;
/// Mouse sub-vector width.
pub const MOUSE_DIM: usize = 4;
/// Focus sub-vector width.
pub const FOCUS_DIM: usize = 3;

/// Total vector dimensionality: keyboard ⧺ mouse ⧺ focus, zero-padded.
/// Baked into every persisted model artifact; changing it invalidates them.
pub const FEATURE_DIM: usize = 16;

/// Consecutive clicks closer than this count as a double click.
const DOUBLE_CLICK_SECS: f64 = 0.5;

/// A fixed-length numeric summary of one window.
///
/// Invariant: `values.len() == FEATURE_DIM`, regardless of event count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build a vector from raw values, zero-padding or truncating to
    /// [`FEATURE_DIM`] so the length invariant holds for any input.
    pub fn from_values(values: Vec<f64>) -> Self {
        let mut padded = vec![0.0; FEATURE_DIM];
        let n = values.len().min(FEATURE_DIM);
        padded[..n].copy_from_slice(&values[..n]);
        Self { values: padded }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Keyboard / mouse / focus slices, in declared order.
    pub fn keyboard(&self) -> &[f64] {
        &self.values[..KEYBOARD_DIM]
    }

    pub fn mouse(&self) -> &[f64] {
        &self.values[KEYBOARD_DIM..KEYBOARD_DIM + MOUSE_DIM]
    }

    pub fn focus(&self) -> &[f64] {
        &self.values[KEYBOARD_DIM + MOUSE_DIM..KEYBOARD_DIM + MOUSE_DIM + FOCUS_DIM]
    }
}

/// Extract the feature vector for `window` from its events.
///
/// Events outside the window are ignored, so passing a whole span's worth of
/// events is safe. Resource and window-close events carry no features.
pub fn extract_features(window: &Window, events: &[RawEvent]) -> FeatureVector {
    let mut keyboard = Vec::new();
    let mut clicks = Vec::new();
    let mut focus = Vec::new();

    for event in events {
        if !window.contains(event.timestamp) {
            continue;
        }
        match &event.kind {
            EventKind::Keyboard { .. } => keyboard.push(event),
            EventKind::Click { .. } => clicks.push(event),
            EventKind::Focus { .. } => focus.push(event),
            EventKind::Scroll { .. } | EventKind::AppClosed { .. } | EventKind::PcUsage { .. } => {}
        }
    }

    let mut values = vec![0.0; FEATURE_DIM];
    values[..KEYBOARD_DIM].copy_from_slice(&keyboard_features(&keyboard, window.duration_secs()));
    values[KEYBOARD_DIM..KEYBOARD_DIM + MOUSE_DIM].copy_from_slice(&mouse_features(&clicks));
    values[KEYBOARD_DIM + MOUSE_DIM..KEYBOARD_DIM + MOUSE_DIM + FOCUS_DIM]
        .copy_from_slice(&focus_features(&focus));
    // Remaining slots stay zero: reserved padding up to FEATURE_DIM.

    FeatureVector { values }
}

/// [typing_speed (events/min), shortcut_count, backspace_count, mean_dwell,
///  mean_inter_key_interval]
fn keyboard_features(events: &[&RawEvent], window_secs: f64) -> [f64; KEYBOARD_DIM] {
    if events.is_empty() || window_secs <= 0.0 {
        return [0.0; KEYBOARD_DIM];
    }

    let mut shortcut_count = 0u32;
    let mut backspace_count = 0u32;
    let mut dwells = Vec::with_capacity(events.len());
    for event in events {
        if let EventKind::Keyboard { key, dwell } = &event.kind {
            if is_modifier_key(key) {
                shortcut_count += 1;
            }
            if is_backspace_key(key) {
                backspace_count += 1;
            }
            dwells.push(*dwell);
        }
    }

    let typing_speed = events.len() as f64 / window_secs * 60.0;
    let gaps: Vec<f64> = events
        .windows(2)
        .map(|pair| seconds_between(pair[0], pair[1]))
        .collect();

    [
        typing_speed,
        shortcut_count as f64,
        backspace_count as f64,
        mean(&dwells),
        mean(&gaps),
    ]
}

/// [mean_click_distance, mean_click_speed, double_click_count,
///  mean_click_interval]
fn mouse_features(events: &[&RawEvent]) -> [f64; MOUSE_DIM] {
    if events.is_empty() {
        return [0.0; MOUSE_DIM];
    }

    let mut hold_intervals = Vec::with_capacity(events.len());
    for event in events {
        if let EventKind::Click { interval, .. } = &event.kind {
            hold_intervals.push(*interval);
        }
    }

    let mut distances = Vec::new();
    let mut speeds = Vec::new();
    let mut double_clicks = 0u32;
    for pair in events.windows(2) {
        let gap = seconds_between(pair[0], pair[1]);
        if gap < DOUBLE_CLICK_SECS {
            double_clicks += 1;
        }
        // Positional features need both endpoints; a click with a missing
        // or malformed position skips only these contributions.
        if let (Some(a), Some(b)) = (click_position(pair[0]), click_position(pair[1])) {
            let distance = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
            distances.push(distance);
            if gap > 0.0 {
                speeds.push(distance / gap);
            }
        }
    }

    [
        mean(&distances),
        mean(&speeds),
        double_clicks as f64,
        mean(&hold_intervals),
    ]
}

/// [switching_rate, max_duration, std_dev_duration]
fn focus_features(events: &[&RawEvent]) -> [f64; FOCUS_DIM] {
    if events.is_empty() {
        return [0.0; FOCUS_DIM];
    }

    let mut durations = Vec::with_capacity(events.len());
    for event in events {
        if let EventKind::Focus { duration, .. } = &event.kind {
            durations.push(*duration);
        }
    }

    let switching_rate = (events.len() as f64 - 1.0).max(0.0);
    let max_duration = durations.iter().copied().fold(0.0, f64::max);

    [switching_rate, max_duration, std_dev(&durations)]
}

fn click_position(event: &RawEvent) -> Option<(f64, f64)> {
    match &event.kind {
        EventKind::Click { position, .. } => *position,
        _ => None,
    }
}

fn seconds_between(a: &RawEvent, b: &RawEvent) -> f64 {
    (b.timestamp - a.timestamp).num_milliseconds() as f64 / 1000.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
