//! A small bounded pool of SQLite connections.
//!
//! Connections are checked out with [`ConnectionPool::get`] and returned to
//! the pool when the [`PooledConnection`] guard is dropped, so every exit
//! path of a caller releases its connection.

use std::ops::Deref;
use std::path::Path;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use rusqlite::Connection;
use tracing::warn;

use crate::error::{Result, TriggerError};

/// Sizing and wait policy for a [`ConnectionPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    /// Number of connections opened up front.
    pub size: usize,
    /// How long a checkout waits for a free connection.
    pub checkout_timeout: Duration,
    /// SQLite busy timeout applied to every connection.
    pub busy_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            size: 4,
            checkout_timeout: Duration::from_millis(5000),
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

pub struct ConnectionPool {
    idle: Mutex<Vec<Connection>>,
    available: Condvar,
    size: usize,
    checkout_timeout: Duration,
}

impl ConnectionPool {
    /// Open `options.size` connections to the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if any connection cannot be opened or configured.
    pub fn open(path: &Path, options: PoolOptions) -> Result<Self> {
        let size = options.size.max(1);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open(path)?;
            conn.busy_timeout(options.busy_timeout)?;
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                row.get::<_, String>(0)
            })?;
            connections.push(conn);
        }
        Ok(Self::from_connections(connections, options.checkout_timeout))
    }

    /// A single-connection pool over a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connections(
            vec![conn],
            PoolOptions::default().checkout_timeout,
        ))
    }

    fn from_connections(connections: Vec<Connection>, checkout_timeout: Duration) -> Self {
        Self {
            size: connections.len(),
            idle: Mutex::new(connections),
            available: Condvar::new(),
            checkout_timeout,
        }
    }

    /// Check out a connection, waiting up to the checkout timeout.
    ///
    /// # Errors
    /// Returns `PersistenceUnavailable` if no connection frees up in time.
    pub fn get(&self) -> Result<PooledConnection<'_>> {
        // The idle list stays consistent across a panic, so poisoning is ignored
        let idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut idle, _) = self
            .available
            .wait_timeout_while(idle, self.checkout_timeout, |idle| idle.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        match idle.pop() {
            Some(conn) => Ok(PooledConnection {
                pool: self,
                conn: Some(conn),
            }),
            None => {
                warn!(size = self.size, "connection pool exhausted");
                Err(TriggerError::persistence("connection pool exhausted"))
            }
        }
    }

    /// Configured number of connections.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Connections currently waiting in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn release(&self, conn: Connection) {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(conn);
        self.available.notify_one();
    }
}

/// A checked-out connection. Returns itself to the pool on drop.
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `None` after drop has taken it
        self.conn.as_ref().expect("pooled connection already released")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
