//! Process-local event ledger.

use std::sync::Mutex;

use tracing::debug;

use super::{effective_limit, EventStore};
use crate::error::{Result, TriggerError};
use crate::event::Event;

/// An [`EventStore`] kept in memory for the lifetime of the value.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<Event>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with already-recorded events.
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }

    /// Total number of events across all identities.
    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Event>>> {
        self.events
            .lock()
            .map_err(|_| TriggerError::persistence("in-memory store lock poisoned"))
    }
}

impl EventStore for InMemoryEventStore {
    fn find_by_identity(&self, identity: &str, limit: u32) -> Result<Vec<Event>> {
        let events = self.lock()?;
        Ok(events
            .iter()
            .filter(|e| e.trigger_identity == identity)
            .take(effective_limit(limit) as usize)
            .cloned()
            .collect())
    }

    fn append(&self, identity: &str, classification: bool, measurement: f64) -> Result<Event> {
        if identity.is_empty() {
            return Err(TriggerError::InvalidIdentity);
        }
        let event = Event::stamp(identity, classification, measurement);
        self.lock()?.push(event.clone());
        debug!(trigger_identity = identity, id = %event.id, "appended event in memory");
        Ok(event)
    }

    fn count_by_identity(&self, identity: &str) -> Result<usize> {
        Ok(self
            .lock()?
            .iter()
            .filter(|e| e.trigger_identity == identity)
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_find() {
        let store = InMemoryEventStore::new();
        let created = store.append("t1", true, 45.0).unwrap();

        let found = store.find_by_identity("t1", 0).unwrap();
        assert_eq!(found, vec![created]);
        assert!(store.find_by_identity("t2", 0).unwrap().is_empty());
    }

    #[test]
    fn find_respects_limit() {
        let store = InMemoryEventStore::new();
        for i in 0..5 {
            store.append("t1", false, i as f64).unwrap();
        }

        assert_eq!(store.find_by_identity("t1", 2).unwrap().len(), 2);
        assert_eq!(store.find_by_identity("t1", 0).unwrap().len(), 5);
        assert_eq!(store.count_by_identity("t1").unwrap(), 5);
    }

    #[test]
    fn default_cap_applies_to_zero_limit() {
        let store = InMemoryEventStore::new();
        for _ in 0..60 {
            store.append("busy", true, 50.0).unwrap();
        }
        assert_eq!(store.find_by_identity("busy", 0).unwrap().len(), 50);
    }

    #[test]
    fn empty_identity_is_rejected() {
        let store = InMemoryEventStore::new();
        let err = store.append("", true, 45.0).unwrap_err();
        assert!(matches!(err, TriggerError::InvalidIdentity));
        assert!(store.is_empty());
    }
}
