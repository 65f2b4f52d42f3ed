//! Event types shared by the capture adapters and the event store.
//!
//! A [`RawEvent`] is immutable once emitted: adapters build one, hand it to
//! the store writer channel, and never touch it again.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamps are persisted as fixed-width local-time strings at second
/// resolution. The format sorts lexicographically, so range queries on the
/// stored text column behave like range queries on time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp for storage.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Returns `None` for malformed input; callers
/// skip the offending row and keep going.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

/// Scroll direction derived from the vertical delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn from_dy(dy: f64) -> Self {
        if dy > 0.0 {
            ScrollDirection::Up
        } else {
            ScrollDirection::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "Up",
            ScrollDirection::Down => "Down",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Up" => Some(ScrollDirection::Up),
            "Down" => Some(ScrollDirection::Down),
            _ => None,
        }
    }
}

/// Modality discriminator, also the `type` column of the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Keyboard,
    Click,
    Scroll,
    Focus,
    AppClosed,
    PcUsage,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Keyboard => "Keyboard",
            EventType::Click => "Click",
            EventType::Scroll => "Scroll",
            EventType::Focus => "Focus",
            EventType::AppClosed => "AppClosed",
            EventType::PcUsage => "PCUsage",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Keyboard" => Some(EventType::Keyboard),
            "Click" => Some(EventType::Click),
            "Scroll" => Some(EventType::Scroll),
            "Focus" => Some(EventType::Focus),
            "AppClosed" => Some(EventType::AppClosed),
            "PCUsage" => Some(EventType::PcUsage),
            _ => None,
        }
    }
}

/// Modality-specific payload of a captured event.
///
/// `Click.position` is optional because stored rows can carry a malformed or
/// missing position; feature extraction skips only that event's positional
/// contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// One completed key press/release pair. `dwell` is the hold time in
    /// seconds.
    Keyboard { key: String, dwell: f64 },
    /// One completed button press/release pair. `interval` is the hold time
    /// in seconds; `position` is the release coordinate.
    Click {
        click_type: String,
        interval: f64,
        position: Option<(f64, f64)>,
    },
    /// One scroll tick. `interval` is the gap to the previous scroll (0 for
    /// the first of a session) and `speed` is |dy| / interval.
    Scroll {
        direction: ScrollDirection,
        speed: f64,
        interval: f64,
    },
    /// The previously focused window, emitted when focus moves away.
    /// `duration` is its cumulative focused time in seconds.
    Focus { title: String, duration: f64 },
    /// A window title that disappeared from the open-window set.
    AppClosed { title: String },
    /// Periodic resource sample, both in percent.
    PcUsage { cpu: f64, memory: f64 },
}

impl EventKind {
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::Keyboard { .. } => EventType::Keyboard,
            EventKind::Click { .. } => EventType::Click,
            EventKind::Scroll { .. } => EventType::Scroll,
            EventKind::Focus { .. } => EventType::Focus,
            EventKind::AppClosed { .. } => EventType::AppClosed,
            EventKind::PcUsage { .. } => EventType::PcUsage,
        }
    }
}

/// An immutable captured event. Owned by the event store once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub kind: EventKind,
    /// Second-resolution local time.
    pub timestamp: NaiveDateTime,
}

impl RawEvent {
    pub fn new(kind: EventKind, timestamp: NaiveDateTime) -> Self {
        Self { kind, timestamp }
    }

    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }
}

/// Whether a key identifier names a modifier key.
///
/// Key identifiers are lowercase names as reported by the hook backend,
/// e.g. `"a"`, `"ctrl_l"`, `"shift"`, `"backspace"`.
pub fn is_modifier_key(key: &str) -> bool {
    ["ctrl", "shift", "alt", "meta", "cmd"]
        .iter()
        .any(|m| key == *m || key.starts_with(&format!("{m}_")))
}

/// Whether a key identifier names the backspace key.
pub fn is_backspace_key(key: &str) -> bool {
    key == "backspace"
}

/// Serialize a click position the way it is stored (`"(x, y)"`).
pub fn format_position(pos: (f64, f64)) -> String {
    format!("({}, {})", pos.0, pos.1)
}

/// Parse a stored click position. `None` on malformed input.
pub fn parse_position(s: &str) -> Option<(f64, f64)> {
    let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (x, y) = inner.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_round_trip() {
        let ts = parse_timestamp("2025-03-14 09:26:53").unwrap();
        assert_eq!(format_timestamp(ts), "2025-03-14 09:26:53");
    }

    #[test]
    fn test_timestamp_malformed() {
        assert!(parse_timestamp("2025-03-14T09:26:53").is_none());
        assert!(parse_timestamp("not a time").is_none());
    }

    #[test]
    fn test_scroll_direction() {
        assert_eq!(ScrollDirection::from_dy(1.0), ScrollDirection::Up);
        assert_eq!(ScrollDirection::from_dy(-2.0), ScrollDirection::Down);
    }

    #[test]
    fn test_modifier_classification() {
        assert!(is_modifier_key("ctrl"));
        assert!(is_modifier_key("ctrl_l"));
        assert!(is_modifier_key("shift_r"));
        assert!(!is_modifier_key("a"));
        assert!(!is_modifier_key("backspace"));
        assert!(is_backspace_key("backspace"));
    }

    #[test]
    fn test_position_round_trip() {
        let s = format_position((120.0, 48.5));
        assert_eq!(parse_position(&s), Some((120.0, 48.5)));
        assert!(parse_position("garbage").is_none());
        assert!(parse_position("(1,)").is_none());
    }
}
