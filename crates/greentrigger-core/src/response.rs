//! Response payloads and outcome signalling.
//!
//! Successful cycles render as `{"data": [...]}`, failures as
//! `{"errors": [{"message": "..."}]}`. A [`Signal`] tells the transport how
//! to report the outcome (HTTP status or process exit code).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{Clock, Evaluation, TriggerEngine};
use crate::error::TriggerError;
use crate::event::Event;
use crate::measurement::MeasurementSource;
use crate::request::TriggerRequest;
use crate::store::EventStore;

/// Abstract outcome class of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Ok,
    ClientError,
    ServerError,
}

impl Signal {
    pub fn for_error(err: &TriggerError) -> Self {
        if err.is_client_error() {
            Signal::ClientError
        } else {
            Signal::ServerError
        }
    }

    pub fn http_status(self) -> u16 {
        match self {
            Signal::Ok => 200,
            Signal::ClientError => 400,
            Signal::ServerError => 500,
        }
    }

    pub fn exit_code(self) -> i32 {
        match self {
            Signal::Ok => 0,
            Signal::ServerError => 1,
            Signal::ClientError => 2,
        }
    }
}

/// Dedup metadata the polling platform expects on every item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    pub id: String,
    /// Unix seconds.
    pub timestamp: i64,
}

/// Wire form of an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDto {
    pub trigger_identity: String,
    pub created_at: DateTime<Utc>,
    pub classification: bool,
    pub measurement: f64,
    pub meta: EventMeta,
}

impl From<&Event> for EventDto {
    fn from(event: &Event) -> Self {
        Self {
            trigger_identity: event.trigger_identity.clone(),
            created_at: event.created_at,
            classification: event.classification,
            measurement: event.measurement,
            meta: EventMeta {
                id: event.id.clone(),
                timestamp: event.created_at.timestamp(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub data: Vec<EventDto>,
}

impl TriggerResponse {
    pub fn empty() -> Self {
        Self { data: Vec::new() }
    }
}

impl From<&Evaluation> for TriggerResponse {
    fn from(evaluation: &Evaluation) -> Self {
        Self {
            data: evaluation.events().iter().map(EventDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorMessage>,
}

impl From<&TriggerError> for ErrorResponse {
    fn from(err: &TriggerError) -> Self {
        Self {
            errors: vec![ErrorMessage {
                message: err.to_string(),
            }],
        }
    }
}

/// Rendered outcome, ready for a transport to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub signal: Signal,
    /// JSON body.
    pub body: String,
}

impl Reply {
    pub fn from_result(result: &Result<Evaluation, TriggerError>) -> Self {
        match result {
            Ok(evaluation) => Self {
                signal: Signal::Ok,
                body: to_json(&TriggerResponse::from(evaluation)),
            },
            Err(err) => Self {
                signal: Signal::for_error(err),
                body: to_json(&ErrorResponse::from(err)),
            },
        }
    }
}

/// Parse a raw request body, run one cycle at `now` and render the reply.
///
/// An unparseable body is a client error and never reaches the engine.
pub fn handle_body<S, M, C>(
    engine: &TriggerEngine<S, M, C>,
    body: &str,
    now: DateTime<Utc>,
) -> Reply
where
    S: EventStore,
    M: MeasurementSource,
    C: Clock,
{
    let result = TriggerRequest::from_json(body).and_then(|req| engine.evaluate_at(&req, now));
    Reply::from_result(&result)
}

fn to_json<T: Serialize>(value: &T) -> String {
    // Payload types only hold strings, numbers, bools and timestamps
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(r#"{{"errors":[{{"message":"failed to encode response: {e}"}}]}}"#)
    })
}
