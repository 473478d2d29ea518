//! SQLite-backed event ledger.
//!
//! Events live in a single `events` table indexed by trigger identity. The
//! schema and index are created on open with `IF NOT EXISTS`, so opening the
//! same file repeatedly is harmless.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::pool::{ConnectionPool, PoolOptions};
use super::{effective_limit, EventStore};
use crate::error::{Result, TriggerError};
use crate::event::Event;

/// Durable [`EventStore`] over a pooled SQLite database.
pub struct SqliteEventStore {
    pool: ConnectionPool,
    path: Option<PathBuf>,
}

impl SqliteEventStore {
    /// Open (or create) the ledger at `path`.
    ///
    /// # Errors
    /// Returns `PersistenceUnavailable` if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: &Path, options: PoolOptions) -> Result<Self> {
        let pool = ConnectionPool::open(path, options)?;
        let store = Self {
            pool,
            path: Some(path.to_path_buf()),
        };
        store.migrate()?;
        info!(path = %path.display(), pool_size = store.pool.size(), "opened event ledger");
        Ok(store)
    }

    /// Open a private in-memory ledger.
    pub fn open_memory() -> Result<Self> {
        let store = Self {
            pool: ConnectionPool::open_in_memory()?,
            path: None,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Database file, if this ledger is on disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.pool.get()?;
        create_schema(&conn)?;
        Ok(())
    }
}

fn create_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS events (
            id               TEXT PRIMARY KEY,
            trigger_identity TEXT NOT NULL CHECK (trigger_identity <> ''),
            created_at       TEXT NOT NULL,
            classification   INTEGER NOT NULL,
            measurement      REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_events_trigger_identity ON events(trigger_identity);",
    )
}

fn row_to_event(row: &rusqlite::Row) -> Result<Event, rusqlite::Error> {
    let created_at: String = row.get(2)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Event {
        id: row.get(0)?,
        trigger_identity: row.get(1)?,
        created_at,
        classification: row.get(3)?,
        measurement: row.get(4)?,
    })
}

impl EventStore for SqliteEventStore {
    fn find_by_identity(&self, identity: &str, limit: u32) -> Result<Vec<Event>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, trigger_identity, created_at, classification, measurement
             FROM events
             WHERE trigger_identity = ?1
             ORDER BY rowid ASC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![identity, effective_limit(limit)], row_to_event)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        debug!(trigger_identity = identity, found = events.len(), "looked up events");
        Ok(events)
    }

    fn append(&self, identity: &str, classification: bool, measurement: f64) -> Result<Event> {
        if identity.is_empty() {
            return Err(TriggerError::InvalidIdentity);
        }

        // created_at is taken once a connection is held
        let conn = self.pool.get()?;
        let event = Event::stamp(identity, classification, measurement);
        conn.execute(
            "INSERT INTO events (id, trigger_identity, created_at, classification, measurement)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.id,
                event.trigger_identity,
                event.created_at.to_rfc3339(),
                event.classification,
                event.measurement,
            ],
        )?;
        Ok(event)
    }

    fn count_by_identity(&self, identity: &str) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM events WHERE trigger_identity = ?1",
            params![identity],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
