//! Mouse click pairing and scroll tracking.
//!
//! Clicks are paired press/release per button, symmetric to the keyboard
//! tracker. Scrolls are single events carrying the gap to the previous
//! scroll; the first scroll of a session has no prior reference and reports
//! an interval of 0.

use crate::capture::types::{EventKind, ScrollDirection};
use std::collections::HashMap;

/// Pairs button presses with releases into click events.
///
/// Same bounded-state rules as the keyboard tracker: re-press overwrites,
/// unmatched release is dropped.
#[derive(Debug, Default)]
pub struct ClickTracker {
    pending: HashMap<String, f64>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button_pressed(&mut self, button: &str, at: f64) {
        self.pending.insert(button.to_string(), at);
    }

    /// `position` is the release coordinate, which is what gets stored.
    pub fn button_released(
        &mut self,
        button: &str,
        at: f64,
        position: (f64, f64),
    ) -> Option<EventKind> {
        let pressed_at = self.pending.remove(button)?;
        Some(EventKind::Click {
            click_type: button.to_string(),
            interval: (at - pressed_at).max(0.0),
            position: Some(position),
        })
    }
}

/// Tracks scroll cadence.
#[derive(Debug, Default)]
pub struct ScrollTracker {
    last_scroll_at: Option<f64>,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one scroll tick with vertical delta `dy`.
    pub fn scrolled(&mut self, dy: f64, at: f64) -> EventKind {
        let interval = match self.last_scroll_at {
            Some(prev) => (at - prev).max(0.0),
            None => 0.0,
        };
        self.last_scroll_at = Some(at);

        let speed = if interval > 0.0 {
            dy.abs() / interval
        } else {
            0.0
        };

        EventKind::Scroll {
            direction: ScrollDirection::from_dy(dy),
            speed,
            interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_pairing() {
        let mut tracker = ClickTracker::new();
        tracker.button_pressed("left", 1.0);
        let event = tracker.button_released("left", 1.1, (100.0, 200.0)).unwrap();
        match event {
            EventKind::Click {
                click_type,
                interval,
                position,
            } => {
                assert_eq!(click_type, "left");
                assert!((interval - 0.1).abs() < 1e-9);
                assert_eq!(position, Some((100.0, 200.0)));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_release_without_press_dropped() {
        let mut tracker = ClickTracker::new();
        assert!(tracker.button_released("right", 2.0, (0.0, 0.0)).is_none());
    }

    #[test]
    fn test_buttons_tracked_independently() {
        let mut tracker = ClickTracker::new();
        tracker.button_pressed("left", 0.0);
        tracker.button_pressed("right", 0.5);
        assert!(tracker.button_released("right", 0.6, (5.0, 5.0)).is_some());
        assert!(tracker.button_released("left", 0.7, (6.0, 6.0)).is_some());
    }

    #[test]
    fn test_first_scroll_has_zero_interval() {
        let mut tracker = ScrollTracker::new();
        match tracker.scrolled(-3.0, 12.0) {
            EventKind::Scroll {
                direction,
                speed,
                interval,
            } => {
                assert_eq!(direction, ScrollDirection::Down);
                assert_eq!(interval, 0.0);
                assert_eq!(speed, 0.0);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_scroll_speed_from_interval() {
        let mut tracker = ScrollTracker::new();
        tracker.scrolled(1.0, 10.0);
        match tracker.scrolled(4.0, 12.0) {
            EventKind::Scroll {
                direction,
                speed,
                interval,
            } => {
                assert_eq!(direction, ScrollDirection::Up);
                assert!((interval - 2.0).abs() < 1e-9);
                assert!((speed - 2.0).abs() < 1e-9);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
