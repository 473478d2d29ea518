//! The durable record of one qualifying evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event recorded for a trigger identity.
///
/// Events are only ever created by an [`EventStore`](crate::store::EventStore)
/// append and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Time-ordered unique identifier (UUIDv7).
    pub id: String,
    pub trigger_identity: String,
    pub created_at: DateTime<Utc>,
    /// Whether the measurement was above the green threshold.
    pub classification: bool,
    /// Green-energy share in percent at evaluation time.
    pub measurement: f64,
}

impl Event {
    /// Stamp a new event with a fresh id and the current time.
    pub(crate) fn stamp(trigger_identity: &str, classification: bool, measurement: f64) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            trigger_identity: trigger_identity.to_string(),
            created_at: Utc::now(),
            classification,
            measurement,
        }
    }
}
