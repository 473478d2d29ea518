//! Trigger evaluation engine.
//!
//! One call to [`TriggerEngine::evaluate`] runs one evaluation cycle:
//!
//! 1. validate the request (an explicit `limit` of 0 stops here)
//! 2. look up events already recorded for the trigger identity; if there
//!    are any, return them unchanged
//! 3. check the time-of-day window; outside it, return nothing
//! 4. fetch the green-energy measurement and classify it
//! 5. append exactly one new event and return it
//!
//! Only step 5 writes. Two concurrent cycles for the same identity can both
//! reach it; the engine does not serialise them.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::{debug, info, warn};

use crate::classifier::classify;
use crate::error::Result;
use crate::event::Event;
use crate::measurement::MeasurementSource;
use crate::request::TriggerRequest;
use crate::store::EventStore;
use crate::window::TimeWindow;

/// Source of "now" for window checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Why a cycle finished without returning events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The caller asked for zero results.
    ZeroLimit,
    /// No events existed and the current time is outside the window.
    OutsideWindow,
}

/// Successful outcome of one evaluation cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Events were already recorded for the identity; nothing was written.
    Cached(Vec<Event>),
    /// Nothing to report.
    Skipped(SkipReason),
    /// A new event was recorded.
    Created(Event),
}

impl Evaluation {
    pub fn events(&self) -> &[Event] {
        match self {
            Evaluation::Cached(events) => events,
            Evaluation::Skipped(_) => &[],
            Evaluation::Created(event) => std::slice::from_ref(event),
        }
    }

    pub fn into_events(self) -> Vec<Event> {
        match self {
            Evaluation::Cached(events) => events,
            Evaluation::Skipped(_) => Vec::new(),
            Evaluation::Created(event) => vec![event],
        }
    }

    /// The event written by this cycle, if any.
    pub fn created(&self) -> Option<&Event> {
        match self {
            Evaluation::Created(event) => Some(event),
            _ => None,
        }
    }
}

/// Orchestrates store lookup, window check, measurement and append.
pub struct TriggerEngine<S, M, C = SystemClock> {
    store: S,
    source: M,
    clock: C,
    offset: FixedOffset,
}

impl<S: EventStore, M: MeasurementSource> TriggerEngine<S, M> {
    /// Engine on the system clock, evaluating windows in UTC.
    pub fn new(store: S, source: M) -> Self {
        Self {
            store,
            source,
            clock: SystemClock,
            offset: Utc.fix(),
        }
    }
}

impl<S: EventStore, M: MeasurementSource, C: Clock> TriggerEngine<S, M, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> TriggerEngine<S, M, C2> {
        TriggerEngine {
            store: self.store,
            source: self.source,
            clock,
            offset: self.offset,
        }
    }

    /// Evaluate windows in a fixed timezone instead of UTC.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one cycle at the engine clock's current time.
    pub fn evaluate(&self, request: &TriggerRequest) -> Result<Evaluation> {
        self.evaluate_at(request, self.clock.now())
    }

    /// Run one cycle as if the current time were `now`.
    ///
    /// # Errors
    /// `MissingField` or `MalformedWindow` for bad requests,
    /// `MeasurementUnavailable` or `PersistenceUnavailable` when a
    /// collaborator fails. Nothing is written on any error path.
    pub fn evaluate_at(&self, request: &TriggerRequest, now: DateTime<Utc>) -> Result<Evaluation> {
        request.validate()?;
        let identity = request.trigger_identity.as_str();

        if request.wants_nothing() {
            debug!(trigger_identity = identity, "limit is 0, skipping evaluation");
            return Ok(Evaluation::Skipped(SkipReason::ZeroLimit));
        }

        let limit = request.store_limit();
        let existing = self.store.find_by_identity(identity, limit).inspect_err(|e| {
            warn!(trigger_identity = identity, error = %e, "failed to look up existing events");
        })?;
        if !existing.is_empty() {
            debug!(
                trigger_identity = identity,
                count = existing.len(),
                "returning existing events"
            );
            return Ok(Evaluation::Cached(existing));
        }

        let window = TimeWindow::parse(&request.from, &request.to)?;
        let local_now = now.with_timezone(&self.offset).time();
        if !window.contains(local_now) {
            debug!(
                trigger_identity = identity,
                %window,
                now = %local_now.format("%H:%M"),
                "outside trigger window"
            );
            return Ok(Evaluation::Skipped(SkipReason::OutsideWindow));
        }

        let measurement = self.source.fetch().inspect_err(|e| {
            warn!(trigger_identity = identity, error = %e, "measurement fetch failed");
        })?;
        let classification = classify(measurement);

        let event = self
            .store
            .append(identity, classification, measurement)
            .inspect_err(|e| {
                warn!(trigger_identity = identity, error = %e, "failed to record event");
            })?;
        info!(
            trigger_identity = identity,
            id = %event.id,
            measurement,
            classification,
            "recorded new event"
        );
        Ok(Evaluation::Created(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::StaticMeasurementSource;
    use crate::store::InMemoryEventStore;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn records_one_event_inside_window() {
        let engine = TriggerEngine::new(InMemoryEventStore::new(), StaticMeasurementSource(45.0));
        let request = TriggerRequest::new("t1", "09:00", "17:00");

        let outcome = engine.evaluate_at(&request, noon()).unwrap();
        let event = outcome.created().unwrap();
        assert!(event.classification);
        assert_eq!(event.measurement, 45.0);
        assert_eq!(engine.store().len(), 1);
    }

    #[test]
    fn second_cycle_returns_cached_event() {
        let engine = TriggerEngine::new(InMemoryEventStore::new(), StaticMeasurementSource(12.0));
        let request = TriggerRequest::new("t1", "09:00", "17:00");

        let first = engine.evaluate_at(&request, noon()).unwrap().into_events();
        let second = engine.evaluate_at(&request, noon()).unwrap();
        assert_eq!(second, Evaluation::Cached(first));
        assert_eq!(engine.store().len(), 1);
    }

    #[test]
    fn offset_shifts_the_window() {
        // 12:00 UTC is 21:00 at +09:00
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let engine = TriggerEngine::new(InMemoryEventStore::new(), StaticMeasurementSource(45.0))
            .with_utc_offset(tokyo);
        let request = TriggerRequest::new("t1", "09:00", "17:00");

        let outcome = engine.evaluate_at(&request, noon()).unwrap();
        assert_eq!(outcome, Evaluation::Skipped(SkipReason::OutsideWindow));
    }

    #[test]
    fn fixed_clock_drives_evaluate() {
        let engine = TriggerEngine::new(InMemoryEventStore::new(), StaticMeasurementSource(45.0))
            .with_clock(FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap()));
        let request = TriggerRequest::new("night", "22:00", "06:00");

        assert!(engine.evaluate(&request).unwrap().created().is_some());
    }
}
