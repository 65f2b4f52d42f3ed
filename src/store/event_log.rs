//! SQLite-backed append-only event log.
//!
//! One row per [`RawEvent`], all modality columns nullable except `type` and
//! `timestamp`. Timestamps are fixed-width local-time strings, so text range
//! comparisons are time range comparisons. Rows are immutable once written;
//! the only mutation is the retention sweep deleting old rows.

use crate::capture::types::{
    format_position, format_timestamp, parse_position, parse_timestamp, EventKind, EventType,
    RawEvent, ScrollDirection,
};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Errors from the event log.
#[derive(Debug)]
pub enum StoreError {
    Database(rusqlite::Error),
    Poisoned,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "database error: {e}"),
            StoreError::Poisoned => write!(f, "event log lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e)
    }
}

/// Append-only persistent log of raw events.
///
/// Safe under concurrent callers; every write is an independent append.
pub struct EventLog {
    conn: Mutex<Connection>,
}

impl EventLog {
    /// Open or create the log at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory log (tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                title TEXT,
                key TEXT,
                key_interval REAL,
                click_type TEXT,
                click_interval REAL,
                position TEXT,
                scroll_direction TEXT,
                scroll_speed REAL,
                scroll_interval REAL,
                duration REAL,
                cpu_usage REAL,
                memory_usage REAL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_ts ON events(timestamp);
            CREATE INDEX IF NOT EXISTS idx_events_type_ts ON events(type, timestamp);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Append one event.
    pub fn append(&self, event: &RawEvent) -> Result<(), StoreError> {
        let ts = format_timestamp(event.timestamp);
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;

        match &event.kind {
            EventKind::Keyboard { key, dwell } => conn.execute(
                "INSERT INTO events (type, key, key_interval, timestamp) VALUES (?1, ?2, ?3, ?4)",
                params![EventType::Keyboard.as_str(), key, dwell, ts],
            )?,
            EventKind::Click {
                click_type,
                interval,
                position,
            } => conn.execute(
                "INSERT INTO events (type, click_type, click_interval, position, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    EventType::Click.as_str(),
                    click_type,
                    interval,
                    position.map(format_position),
                    ts
                ],
            )?,
            EventKind::Scroll {
                direction,
                speed,
                interval,
            } => conn.execute(
                "INSERT INTO events (type, scroll_direction, scroll_speed, scroll_interval, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    EventType::Scroll.as_str(),
                    direction.as_str(),
                    speed,
                    interval,
                    ts
                ],
            )?,
            EventKind::Focus { title, duration } => conn.execute(
                "INSERT INTO events (type, title, duration, timestamp) VALUES (?1, ?2, ?3, ?4)",
                params![EventType::Focus.as_str(), title, duration, ts],
            )?,
            EventKind::AppClosed { title } => conn.execute(
                "INSERT INTO events (type, title, timestamp) VALUES (?1, ?2, ?3)",
                params![EventType::AppClosed.as_str(), title, ts],
            )?,
            EventKind::PcUsage { cpu, memory } => conn.execute(
                "INSERT INTO events (type, cpu_usage, memory_usage, timestamp) VALUES (?1, ?2, ?3, ?4)",
                params![EventType::PcUsage.as_str(), cpu, memory, ts],
            )?,
        };
        Ok(())
    }

    /// Events of one modality in the half-open range `[start, end)`,
    /// oldest first. Malformed rows are skipped with a warning.
    pub fn events_between(
        &self,
        event_type: EventType,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<RawEvent>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT type, title, key, key_interval, click_type, click_interval, position,
                    scroll_direction, scroll_speed, scroll_interval, duration,
                    cpu_usage, memory_usage, timestamp
             FROM events
             WHERE type = ?1 AND timestamp >= ?2 AND timestamp < ?3
             ORDER BY timestamp, id",
        )?;
        let rows = stmt.query_map(
            params![
                event_type.as_str(),
                format_timestamp(start),
                format_timestamp(end)
            ],
            decode_row,
        )?;
        Ok(collect_decoded(rows)?)
    }

    /// All events in the half-open range `[start, end)`, oldest first.
    pub fn all_events_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<RawEvent>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare(
            "SELECT type, title, key, key_interval, click_type, click_interval, position,
                    scroll_direction, scroll_speed, scroll_interval, duration,
                    cpu_usage, memory_usage, timestamp
             FROM events
             WHERE timestamp >= ?1 AND timestamp < ?2
             ORDER BY timestamp, id",
        )?;
        let rows = stmt.query_map(
            params![format_timestamp(start), format_timestamp(end)],
            decode_row,
        )?;
        Ok(collect_decoded(rows)?)
    }

    /// Total row count (any modality) in `[start, end)`.
    pub fn count_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<u64, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE timestamp >= ?1 AND timestamp < ?2",
            params![format_timestamp(start), format_timestamp(end)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Retention sweep: delete events older than `cutoff`. Returns the
    /// number of rows removed.
    pub fn prune_before(&self, cutoff: NaiveDateTime) -> Result<u64, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let n = conn.execute(
            "DELETE FROM events WHERE timestamp < ?1",
            params![format_timestamp(cutoff)],
        )?;
        Ok(n as u64)
    }
}

type RowFields = (
    String,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<String>,
    Option<f64>,
    Option<String>,
    Option<String>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    String,
);

fn decode_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Option<RawEvent>> {
    let fields: RowFields = (
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
    );
    Ok(decode_fields(fields))
}

/// Turn a row into an event, or `None` if required fields are missing or
/// malformed. Only a bad `position` is tolerated within an otherwise valid
/// click row (the event survives, minus its positional contribution).
fn decode_fields(fields: RowFields) -> Option<RawEvent> {
    let (
        type_str,
        title,
        key,
        key_interval,
        click_type,
        click_interval,
        position,
        scroll_direction,
        scroll_speed,
        scroll_interval,
        duration,
        cpu_usage,
        memory_usage,
        ts_str,
    ) = fields;

    let Some(timestamp) = parse_timestamp(&ts_str) else {
        tracing::warn!(timestamp = %ts_str, "skipping event row with malformed timestamp");
        return None;
    };
    let Some(event_type) = EventType::parse(&type_str) else {
        tracing::warn!(r#type = %type_str, "skipping event row with unknown type");
        return None;
    };

    let kind = match event_type {
        EventType::Keyboard => EventKind::Keyboard {
            key: key?,
            dwell: key_interval?,
        },
        EventType::Click => EventKind::Click {
            click_type: click_type?,
            interval: click_interval?,
            position: position.as_deref().and_then(parse_position),
        },
        EventType::Scroll => EventKind::Scroll {
            direction: scroll_direction.as_deref().and_then(ScrollDirection::parse)?,
            speed: scroll_speed?,
            interval: scroll_interval?,
        },
        EventType::Focus => EventKind::Focus {
            title: title?,
            duration: duration?,
        },
        EventType::AppClosed => EventKind::AppClosed { title: title? },
        EventType::PcUsage => EventKind::PcUsage {
            cpu: cpu_usage?,
            memory: memory_usage?,
        },
    };

    Some(RawEvent { kind, timestamp })
}

fn collect_decoded(
    rows: impl Iterator<Item = rusqlite::Result<Option<RawEvent>>>,
) -> rusqlite::Result<Vec<RawEvent>> {
    let mut events = Vec::new();
    for row in rows {
        if let Some(event) = row? {
            events.push(event);
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn key_event(key: &str, dwell: f64, t: NaiveDateTime) -> RawEvent {
        RawEvent::new(
            EventKind::Keyboard {
                key: key.into(),
                dwell,
            },
            t,
        )
    }

    #[test]
    fn test_append_and_query_by_type() {
        let log = EventLog::open_in_memory().unwrap();
        log.append(&key_event("a", 0.1, ts(10, 0, 0))).unwrap();
        log.append(&RawEvent::new(
            EventKind::Click {
                click_type: "left".into(),
                interval: 0.05,
                position: Some((10.0, 20.0)),
            },
            ts(10, 0, 1),
        ))
        .unwrap();

        let keys = log
            .events_between(EventType::Keyboard, ts(10, 0, 0), ts(10, 1, 0))
            .unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].event_type(), EventType::Keyboard);

        let clicks = log
            .events_between(EventType::Click, ts(10, 0, 0), ts(10, 1, 0))
            .unwrap();
        assert_eq!(clicks.len(), 1);
        match &clicks[0].kind {
            EventKind::Click { position, .. } => assert_eq!(*position, Some((10.0, 20.0))),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_range_is_half_open() {
        let log = EventLog::open_in_memory().unwrap();
        log.append(&key_event("a", 0.1, ts(10, 0, 0))).unwrap();
        log.append(&key_event("b", 0.1, ts(10, 0, 30))).unwrap();

        let events = log
            .events_between(EventType::Keyboard, ts(10, 0, 0), ts(10, 0, 30))
            .unwrap();
        assert_eq!(events.len(), 1);
        match &events[0].kind {
            EventKind::Keyboard { key, .. } => assert_eq!(key, "a"),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_all_event_kinds_round_trip() {
        let log = EventLog::open_in_memory().unwrap();
        let events = vec![
            key_event("ctrl", 0.2, ts(9, 0, 0)),
            RawEvent::new(
                EventKind::Scroll {
                    direction: ScrollDirection::Up,
                    speed: 3.0,
                    interval: 0.5,
                },
                ts(9, 0, 1),
            ),
            RawEvent::new(
                EventKind::Focus {
                    title: "editor".into(),
                    duration: 42.0,
                },
                ts(9, 0, 2),
            ),
            RawEvent::new(
                EventKind::AppClosed {
                    title: "browser".into(),
                },
                ts(9, 0, 3),
            ),
            RawEvent::new(
                EventKind::PcUsage {
                    cpu: 12.5,
                    memory: 40.0,
                },
                ts(9, 0, 4),
            ),
        ];
        for e in &events {
            log.append(e).unwrap();
        }

        let all = log.all_events_between(ts(9, 0, 0), ts(9, 1, 0)).unwrap();
        assert_eq!(all, events);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let log = EventLog::open_in_memory().unwrap();
        {
            let conn = log.conn.lock().unwrap();
            // Bad timestamp
            conn.execute(
                "INSERT INTO events (type, key, key_interval, timestamp) VALUES ('Keyboard', 'a', 0.1, 'garbage')",
                [],
            )
            .unwrap();
            // Missing dwell
            conn.execute(
                "INSERT INTO events (type, key, timestamp) VALUES ('Keyboard', 'b', '2025-03-14 10:00:01')",
                [],
            )
            .unwrap();
            // Click with malformed position survives without one
            conn.execute(
                "INSERT INTO events (type, click_type, click_interval, position, timestamp)
                 VALUES ('Click', 'left', 0.1, 'nonsense', '2025-03-14 10:00:02')",
                [],
            )
            .unwrap();
        }

        let keys = log
            .events_between(EventType::Keyboard, ts(10, 0, 0), ts(10, 1, 0))
            .unwrap();
        assert!(keys.is_empty());

        let clicks = log
            .events_between(EventType::Click, ts(10, 0, 0), ts(10, 1, 0))
            .unwrap();
        assert_eq!(clicks.len(), 1);
        match &clicks[0].kind {
            EventKind::Click { position, .. } => assert!(position.is_none()),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_prune_before() {
        let log = EventLog::open_in_memory().unwrap();
        log.append(&key_event("a", 0.1, ts(9, 0, 0))).unwrap();
        log.append(&key_event("b", 0.1, ts(9, 30, 0))).unwrap();

        let removed = log.prune_before(ts(9, 15, 0)).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(log.count_between(ts(9, 0, 0), ts(10, 0, 0)).unwrap(), 1);
    }
}
