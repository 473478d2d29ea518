//! # greentrigger Core Library
//!
//! Answers polling requests from a trigger-based automation platform:
//! "has a notable green-energy event happened for this trigger, and if not,
//! should one be recorded now?"
//!
//! ## Architecture
//!
//! - **Engine**: runs one query/decide/record cycle per request and never
//!   records more than one event per cycle
//! - **Storage**: identity-indexed event ledger, SQLite-backed with a pooled
//!   connection, or in memory for tests
//! - **Window**: pure time-of-day window arithmetic, including windows that
//!   wrap past midnight
//! - **Measurement**: green-energy share fetched over HTTP and classified
//!   against a fixed threshold
//!
//! ## Key Components
//!
//! - [`TriggerEngine`]: the evaluation pipeline
//! - [`EventStore`]: ledger capability with [`SqliteEventStore`] and
//!   [`InMemoryEventStore`] adapters
//! - [`MeasurementSource`]: measurement capability
//! - [`Config`]: TOML configuration

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod measurement;
pub mod request;
pub mod response;
pub mod store;
pub mod window;

pub use classifier::{classify, GREEN_THRESHOLD_PERCENT};
pub use config::{data_dir, Config};
pub use engine::{Clock, Evaluation, FixedClock, SkipReason, SystemClock, TriggerEngine};
pub use error::{ConfigError, Result, TriggerError};
pub use event::Event;
pub use measurement::{
    HttpMeasurementSource, MeasurementSource, StaticMeasurementSource,
    UnconfiguredMeasurementSource,
};
pub use request::TriggerRequest;
pub use response::{handle_body, Reply, Signal, TriggerResponse};
pub use store::{EventStore, InMemoryEventStore, SqliteEventStore, DEFAULT_FIND_LIMIT};
pub use window::{in_window, TimeWindow};
