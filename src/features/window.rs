//! Fixed-size time windows.
//!
//! A window is a half-open interval `[start, start + size)`. Partitioning a
//! span produces contiguous, gapless, non-overlapping windows; an empty
//! window is a valid window, not an error. Training and inference both go
//! through [`partition`] so their boundary semantics cannot drift apart.

use crate::capture::types::format_timestamp;
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn new(start: NaiveDateTime, size: Duration) -> Self {
        Self {
            start,
            end: start + size,
        }
    }

    /// Whether a timestamp falls inside the window. Half-open: the start is
    /// included, the end is not.
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    /// Human-readable reference used in verdicts and logs.
    pub fn label(&self) -> String {
        format!(
            "[{} .. {})",
            format_timestamp(self.start),
            format_timestamp(self.end)
        )
    }
}

/// Partition `[start, end)` into contiguous windows of `size`.
///
/// Yields `ceil((end - start) / size)` windows; every window is full-size,
/// so the last one may extend past `end`. Returns an empty vec for an empty
/// or inverted span.
pub fn partition(start: NaiveDateTime, end: NaiveDateTime, size: Duration) -> Vec<Window> {
    if end <= start || size <= Duration::zero() {
        return Vec::new();
    }

    let mut windows = Vec::new();
    let mut cursor = start;
    while cursor < end {
        windows.push(Window::new(cursor, size));
        cursor = cursor + size;
    }
    windows
}
