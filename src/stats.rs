//! Capture statistics.
//!
//! Tracks per-modality event counts and store outcomes so `status` can show
//! what a running or past session actually captured. Counters only — no
//! event content is ever recorded here.

use crate::capture::types::EventType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct CaptureStats {
    keyboard_events: AtomicU64,
    mouse_events: AtomicU64,
    focus_events: AtomicU64,
    resource_events: AtomicU64,
    events_stored: AtomicU64,
    write_failures: AtomicU64,
    events_dropped: AtomicU64,
    windows_scored: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl CaptureStats {
    pub fn new() -> Self {
        Self {
            keyboard_events: AtomicU64::new(0),
            mouse_events: AtomicU64::new(0),
            focus_events: AtomicU64::new(0),
            resource_events: AtomicU64::new(0),
            events_stored: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            windows_scored: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create stats with persistence, resuming counters from a prior run.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);
        if let Err(e) = stats.load() {
            tracing::debug!(error = %e, "no previous capture stats loaded");
        }
        stats
    }

    pub fn record_captured(&self, event_type: EventType) {
        let counter = match event_type {
            EventType::Keyboard => &self.keyboard_events,
            EventType::Click | EventType::Scroll => &self.mouse_events,
            EventType::Focus | EventType::AppClosed => &self.focus_events,
            EventType::PcUsage => &self.resource_events,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stored(&self) {
        self.events_stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_scored(&self) {
        self.windows_scored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            keyboard_events: self.keyboard_events.load(Ordering::Relaxed),
            mouse_events: self.mouse_events.load(Ordering::Relaxed),
            focus_events: self.focus_events.load(Ordering::Relaxed),
            resource_events: self.resource_events.load(Ordering::Relaxed),
            events_stored: self.events_stored.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            windows_scored: self.windows_scored.load(Ordering::Relaxed),
            session_start: self.session_start,
        }
    }

    pub fn summary(&self) -> String {
        let s = self.snapshot();
        format!(
            "Session statistics:\n\
             - Keyboard events: {}\n\
             - Mouse events: {}\n\
             - Focus events: {}\n\
             - Resource samples: {}\n\
             - Events stored: {} ({} write failures, {} dropped)\n\
             - Windows scored: {}",
            s.keyboard_events,
            s.mouse_events,
            s.focus_events,
            s.resource_events,
            s.events_stored,
            s.write_failures,
            s.events_dropped,
            s.windows_scored,
        )
    }

    /// Save counters to disk (no-op without a persist path).
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let json =
                serde_json::to_string_pretty(&self.snapshot()).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let snapshot: StatsSnapshot =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;
                self.keyboard_events
                    .store(snapshot.keyboard_events, Ordering::Relaxed);
                self.mouse_events
                    .store(snapshot.mouse_events, Ordering::Relaxed);
                self.focus_events
                    .store(snapshot.focus_events, Ordering::Relaxed);
                self.resource_events
                    .store(snapshot.resource_events, Ordering::Relaxed);
                self.events_stored
                    .store(snapshot.events_stored, Ordering::Relaxed);
                self.write_failures
                    .store(snapshot.write_failures, Ordering::Relaxed);
                self.events_dropped
                    .store(snapshot.events_dropped, Ordering::Relaxed);
                self.windows_scored
                    .store(snapshot.windows_scored, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for CaptureStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the counters, also the persistence format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub keyboard_events: u64,
    pub mouse_events: u64,
    pub focus_events: u64,
    pub resource_events: u64,
    pub events_stored: u64,
    pub write_failures: u64,
    pub events_dropped: u64,
    pub windows_scored: u64,
    pub session_start: DateTime<Utc>,
}

pub type SharedCaptureStats = Arc<CaptureStats>;

pub fn create_shared_stats() -> SharedCaptureStats {
    Arc::new(CaptureStats::new())
}

pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedCaptureStats {
    Arc::new(CaptureStats::with_persistence(path))
}
