//! Window-focus tracking.
//!
//! Driven by a poll timer rather than OS callbacks: each tick the runtime
//! asks the platform probe for the active window title and the set of open
//! titles, and feeds both here. A focus change emits the *previous* window's
//! cumulative focused duration; titles that vanish from the open set emit
//! `AppClosed` markers.

use crate::capture::types::EventKind;
use std::collections::HashSet;

/// Source of window titles. Platform backends implement this; the default
/// [`NoopWindowProbe`] reports nothing, which keeps the agent runnable on
/// hosts without an accessible window system.
pub trait WindowProbe: Send {
    /// Title of the currently focused window, if any.
    fn active_window(&self) -> Option<String>;

    /// Titles of all open windows.
    fn open_windows(&self) -> Vec<String>;
}

/// Probe for platforms without a wired-up window backend.
#[derive(Debug, Default)]
pub struct NoopWindowProbe;

impl WindowProbe for NoopWindowProbe {
    fn active_window(&self) -> Option<String> {
        None
    }

    fn open_windows(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Accumulates focus state between polls.
#[derive(Debug, Default)]
pub struct FocusTracker {
    current: Option<(String, f64)>,
    known_titles: HashSet<String>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one poll observation at `at` (monotonic seconds).
    ///
    /// Returns the events this observation produced: at most one `Focus`
    /// event for a departed window, plus one `AppClosed` per vanished title.
    pub fn observe(
        &mut self,
        active: Option<&str>,
        open_titles: &[String],
        at: f64,
    ) -> Vec<EventKind> {
        let mut events = Vec::new();

        let changed = match (&self.current, active) {
            (Some((title, _)), Some(new_title)) => title != new_title,
            (Some(_), None) => true,
            (None, Some(_)) => true,
            (None, None) => false,
        };

        if changed {
            if let Some((title, since)) = self.current.take() {
                events.push(EventKind::Focus {
                    title,
                    duration: (at - since).max(0.0),
                });
            }
            if let Some(new_title) = active {
                self.current = Some((new_title.to_string(), at));
            }
        }

        let open: HashSet<String> = open_titles.iter().cloned().collect();
        for title in self.known_titles.difference(&open) {
            events.push(EventKind::AppClosed {
                title: title.clone(),
            });
        }
        self.known_titles = open;
        if let Some(title) = active {
            self.known_titles.insert(title.to_string());
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_observation_emits_nothing() {
        let mut tracker = FocusTracker::new();
        let events = tracker.observe(Some("editor"), &titles(&["editor"]), 0.0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_focus_change_reports_previous_duration() {
        let mut tracker = FocusTracker::new();
        tracker.observe(Some("editor"), &titles(&["editor", "browser"]), 0.0);
        tracker.observe(Some("editor"), &titles(&["editor", "browser"]), 5.0);
        let events = tracker.observe(Some("browser"), &titles(&["editor", "browser"]), 12.0);

        assert_eq!(events.len(), 1);
        match &events[0] {
            EventKind::Focus { title, duration } => {
                assert_eq!(title, "editor");
                assert!((duration - 12.0).abs() < 1e-9);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_vanished_title_emits_closed() {
        let mut tracker = FocusTracker::new();
        tracker.observe(Some("editor"), &titles(&["editor", "browser"]), 0.0);
        let events = tracker.observe(Some("editor"), &titles(&["editor"]), 5.0);

        assert_eq!(events.len(), 1);
        match &events[0] {
            EventKind::AppClosed { title } => assert_eq!(title, "browser"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_focus_lost_entirely() {
        let mut tracker = FocusTracker::new();
        tracker.observe(Some("editor"), &titles(&["editor"]), 0.0);
        let events = tracker.observe(None, &titles(&["editor"]), 3.0);
        assert!(events
            .iter()
            .any(|e| matches!(e, EventKind::Focus { duration, .. } if (*duration - 3.0).abs() < 1e-9)));
    }

    #[test]
    fn test_noop_probe_is_silent() {
        let probe = NoopWindowProbe;
        assert!(probe.active_window().is_none());
        assert!(probe.open_windows().is_empty());
    }
}
