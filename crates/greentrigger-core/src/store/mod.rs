//! Event ledger storage.
//!
//! [`EventStore`] is the capability the trigger engine depends on. Two
//! adapters ship with the crate:
//! - [`SqliteEventStore`]: the durable ledger, backed by a pooled SQLite file
//! - [`InMemoryEventStore`]: a process-local ledger for tests and dry runs

pub mod memory;
pub mod pool;
pub mod sqlite;

pub use memory::InMemoryEventStore;
pub use pool::{ConnectionPool, PoolOptions, PooledConnection};
pub use sqlite::SqliteEventStore;

use std::sync::Arc;

use crate::error::Result;
use crate::event::Event;

/// Cap applied by [`EventStore::find_by_identity`] when the caller passes 0.
pub const DEFAULT_FIND_LIMIT: u32 = 50;

/// Append-only, identity-indexed collection of [`Event`]s.
///
/// Implementations must be safe to share between concurrent evaluations.
pub trait EventStore: Send + Sync {
    /// Events recorded for `identity`, at most `limit` of them.
    ///
    /// A `limit` of 0 applies [`DEFAULT_FIND_LIMIT`]. No events is an empty
    /// vector, not an error.
    fn find_by_identity(&self, identity: &str, limit: u32) -> Result<Vec<Event>>;

    /// Stamp and persist a new event, returning the stored record.
    ///
    /// # Errors
    /// [`TriggerError::InvalidIdentity`](crate::TriggerError::InvalidIdentity)
    /// for an empty identity, `PersistenceUnavailable` on storage faults.
    fn append(&self, identity: &str, classification: bool, measurement: f64) -> Result<Event>;

    /// Total number of events recorded for `identity`.
    fn count_by_identity(&self, identity: &str) -> Result<usize>;
}

impl<T: EventStore + ?Sized> EventStore for Arc<T> {
    fn find_by_identity(&self, identity: &str, limit: u32) -> Result<Vec<Event>> {
        (**self).find_by_identity(identity, limit)
    }

    fn append(&self, identity: &str, classification: bool, measurement: f64) -> Result<Event> {
        (**self).append(identity, classification, measurement)
    }

    fn count_by_identity(&self, identity: &str) -> Result<usize> {
        (**self).count_by_identity(identity)
    }
}

impl<T: EventStore + ?Sized> EventStore for Box<T> {
    fn find_by_identity(&self, identity: &str, limit: u32) -> Result<Vec<Event>> {
        (**self).find_by_identity(identity, limit)
    }

    fn append(&self, identity: &str, classification: bool, measurement: f64) -> Result<Event> {
        (**self).append(identity, classification, measurement)
    }

    fn count_by_identity(&self, identity: &str) -> Result<usize> {
        (**self).count_by_identity(identity)
    }
}

/// Resolve the caller's limit to the number of rows actually returned.
pub fn effective_limit(limit: u32) -> u32 {
    if limit == 0 {
        DEFAULT_FIND_LIMIT
    } else {
        limit
    }
}
