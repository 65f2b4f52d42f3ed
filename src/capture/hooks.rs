//! Input hook plumbing.
//!
//! OS hook backends (keyboard/mouse listeners) drive an [`InputAdapter`],
//! which owns the pairing trackers and publishes completed events into the
//! store writer channel. The adapter state is owned by the hook thread and
//! never read from anywhere else.
//!
//! On hosts without a wired-up hook backend the agent runs with
//! [`NoopHooks`], which captures nothing but keeps the rest of the pipeline
//! (focus poll, resource sampling, retention, inference) fully operational.

use crate::capture::keyboard::KeyboardTracker;
use crate::capture::mouse::{ClickTracker, ScrollTracker};
use crate::capture::types::{EventKind, EventType, RawEvent};
use crate::stats::SharedCaptureStats;
use chrono::Local;
use crossbeam_channel::{Sender, TrySendError};
use std::time::Instant;

/// Monotonic second counter for pairing math. Wall-clock time is only used
/// to stamp finished events; intervals are always computed from this clock
/// so they keep sub-second precision.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Stamps and publishes events into the writer channel.
///
/// Publishing never blocks: a full or disconnected channel drops the single
/// event with a warning, and capture continues.
#[derive(Clone)]
pub struct EventPublisher {
    sender: Sender<RawEvent>,
    stats: SharedCaptureStats,
}

impl EventPublisher {
    pub fn new(sender: Sender<RawEvent>, stats: SharedCaptureStats) -> Self {
        Self { sender, stats }
    }

    pub fn publish(&self, kind: EventKind) {
        let event_type: EventType = kind.event_type();
        let event = RawEvent::new(kind, Local::now().naive_local());
        match self.sender.try_send(event) {
            Ok(()) => self.stats.record_captured(event_type),
            Err(TrySendError::Full(_)) => {
                self.stats.record_dropped();
                tracing::warn!(kind = event_type.as_str(), "event channel full, dropping event");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.stats.record_dropped();
                tracing::warn!(kind = event_type.as_str(), "event channel closed, dropping event");
            }
        }
    }
}

/// Callback surface for an OS keyboard/mouse hook backend.
pub struct InputAdapter {
    keyboard: KeyboardTracker,
    clicks: ClickTracker,
    scrolls: ScrollTracker,
    clock: MonotonicClock,
    publisher: EventPublisher,
}

impl InputAdapter {
    pub fn new(publisher: EventPublisher) -> Self {
        Self {
            keyboard: KeyboardTracker::new(),
            clicks: ClickTracker::new(),
            scrolls: ScrollTracker::new(),
            clock: MonotonicClock::new(),
            publisher,
        }
    }

    pub fn key_pressed(&mut self, key: &str) {
        self.keyboard.key_pressed(key, self.clock.now_secs());
    }

    pub fn key_released(&mut self, key: &str) {
        if let Some(kind) = self.keyboard.key_released(key, self.clock.now_secs()) {
            self.publisher.publish(kind);
        }
    }

    pub fn button_pressed(&mut self, button: &str) {
        self.clicks.button_pressed(button, self.clock.now_secs());
    }

    pub fn button_released(&mut self, button: &str, position: (f64, f64)) {
        if let Some(kind) = self
            .clicks
            .button_released(button, self.clock.now_secs(), position)
        {
            self.publisher.publish(kind);
        }
    }

    pub fn scrolled(&mut self, dy: f64) {
        let kind = self.scrolls.scrolled(dy, self.clock.now_secs());
        self.publisher.publish(kind);
    }
}

/// Errors from the hook backend.
#[derive(Debug)]
pub enum HookError {
    AlreadyRunning,
}

impl std::fmt::Display for HookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookError::AlreadyRunning => write!(f, "input hooks already running"),
        }
    }
}

impl std::error::Error for HookError {}

/// Hook backend for platforms without OS-level listeners wired in.
///
/// Holds the adapter so the backend seam matches a real implementation, but
/// never invokes it.
pub struct NoopHooks {
    _adapter: Option<InputAdapter>,
    running: bool,
}

impl NoopHooks {
    pub fn new() -> Self {
        Self {
            _adapter: None,
            running: false,
        }
    }

    pub fn start(&mut self, adapter: InputAdapter) -> Result<(), HookError> {
        if self.running {
            return Err(HookError::AlreadyRunning);
        }
        self._adapter = Some(adapter);
        self.running = true;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.running = false;
        self._adapter = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for NoopHooks {
    fn default() -> Self {
        Self::new()
    }
}

/// Platform-agnostic hook backend alias.
pub type InputHooks = NoopHooks;

/// Whether the platform grants input-monitoring access. Platforms without a
/// hook backend have nothing to deny.
pub fn check_permission() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::CaptureStats;
    use crossbeam_channel::bounded;
    use std::sync::Arc;

    fn make_publisher(capacity: usize) -> (EventPublisher, crossbeam_channel::Receiver<RawEvent>) {
        let (tx, rx) = bounded(capacity);
        let publisher = EventPublisher::new(tx, Arc::new(CaptureStats::new()));
        (publisher, rx)
    }

    #[test]
    fn test_adapter_publishes_completed_pairs() {
        let (publisher, rx) = make_publisher(16);
        let mut adapter = InputAdapter::new(publisher);

        adapter.key_pressed("a");
        adapter.key_released("a");
        adapter.key_released("b"); // unmatched, dropped

        let events: Vec<RawEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), EventType::Keyboard);
    }

    #[test]
    fn test_full_channel_does_not_block() {
        let (publisher, _rx) = make_publisher(1);
        let mut adapter = InputAdapter::new(publisher);

        // Second completed event lands on a full channel and is dropped.
        adapter.scrolled(1.0);
        adapter.scrolled(-1.0);
    }

    #[test]
    fn test_noop_hooks_lifecycle() {
        let (publisher, _rx) = make_publisher(4);
        let mut hooks = NoopHooks::new();
        assert!(!hooks.is_running());
        hooks.start(InputAdapter::new(publisher.clone())).unwrap();
        assert!(hooks.is_running());
        assert!(matches!(
            hooks.start(InputAdapter::new(publisher)),
            Err(HookError::AlreadyRunning)
        ));
        hooks.stop();
        assert!(!hooks.is_running());
    }
}
