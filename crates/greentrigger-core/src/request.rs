//! Polling request schema.
//!
//! The platform posts a JSON body such as:
//!
//! ```json
//! {
//!   "trigger_identity": "92429d82a41e93048",
//!   "triggerFields": { "hours_start": "09:00", "hours_stop": "17:00" },
//!   "limit": 50
//! }
//! ```
//!
//! Unknown fields are ignored. `limit` is optional; an absent (or `null`)
//! limit leaves the store's default cap in force, an explicit `0` means
//! "return nothing".

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriggerError};

/// A validated polling request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRequest {
    pub trigger_identity: String,
    /// Window start, as sent by the caller.
    pub from: String,
    /// Window end, as sent by the caller.
    pub to: String,
    /// `None` when the caller sent no limit.
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRequest {
    #[serde(default)]
    trigger_identity: Option<String>,
    #[serde(default, rename = "triggerFields")]
    trigger_fields: Option<RawTriggerFields>,
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTriggerFields {
    #[serde(default)]
    hours_start: Option<String>,
    #[serde(default)]
    hours_stop: Option<String>,
}

impl TriggerRequest {
    pub fn new(
        trigger_identity: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            trigger_identity: trigger_identity.into(),
            from: from.into(),
            to: to.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Parse and validate a JSON request body.
    ///
    /// # Errors
    /// `InvalidRequest` for unparseable JSON or a negative limit,
    /// `MissingField` for an absent or blank required field.
    pub fn from_json(body: &str) -> Result<Self> {
        Self::from_slice(body.as_bytes())
    }

    /// Like [`from_json`](Self::from_json) for a raw body; bytes that are
    /// not UTF-8 are an invalid request.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let body = std::str::from_utf8(body).map_err(|e| {
            TriggerError::InvalidRequest(format!("request body is not valid UTF-8: {e}"))
        })?;
        let raw: RawRequest = serde_json::from_str(body)?;
        let fields = raw.trigger_fields.unwrap_or_default();

        let request = Self {
            trigger_identity: raw.trigger_identity.unwrap_or_default(),
            from: fields.hours_start.unwrap_or_default(),
            to: fields.hours_stop.unwrap_or_default(),
            limit: raw.limit.map(parse_limit).transpose()?,
        };
        request.validate()?;
        Ok(request)
    }

    /// Check that every required field is present.
    ///
    /// Fields are checked in the order `to`, `from`, `trigger_identity`;
    /// the first blank one is reported.
    pub fn validate(&self) -> Result<()> {
        require("to", &self.to)?;
        require("from", &self.from)?;
        require("trigger_identity", &self.trigger_identity)?;
        Ok(())
    }

    /// Limit handed to the store: an absent limit becomes 0, which the
    /// store reads as its default cap.
    pub fn store_limit(&self) -> u32 {
        self.limit.unwrap_or(0)
    }

    /// Whether the caller explicitly asked for zero results.
    pub fn wants_nothing(&self) -> bool {
        self.limit == Some(0)
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(TriggerError::MissingField { field })
    } else {
        Ok(())
    }
}

fn parse_limit(limit: i64) -> Result<u32> {
    u32::try_from(limit)
        .map_err(|_| TriggerError::InvalidRequest(format!("limit {limit} is out of range")))
}
