//! Green-energy measurement providers.
//!
//! The engine only needs "the current share of green energy, in percent".
//! [`HttpMeasurementSource`] reads it from a JSON endpoint; the other
//! sources exist for dry runs and overrides.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::MeasurementConfig;
use crate::error::{Result, TriggerError};

/// Provider of the current green-energy percentage.
pub trait MeasurementSource: Send + Sync {
    /// Fetch the current measurement. Not retried by callers.
    ///
    /// # Errors
    /// `MeasurementUnavailable` when the provider is unreachable or its
    /// answer is malformed.
    fn fetch(&self) -> Result<f64>;
}

impl<T: MeasurementSource + ?Sized> MeasurementSource for Arc<T> {
    fn fetch(&self) -> Result<f64> {
        (**self).fetch()
    }
}

impl<T: MeasurementSource + ?Sized> MeasurementSource for Box<T> {
    fn fetch(&self) -> Result<f64> {
        (**self).fetch()
    }
}

/// Reads a percentage out of a JSON document served over HTTP.
pub struct HttpMeasurementSource {
    client: Client,
    url: Url,
    value_path: String,
}

impl HttpMeasurementSource {
    /// Build a source for `url`, reading the number at `value_path`.
    ///
    /// # Errors
    /// Returns `MeasurementUnavailable` if the URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(url: &str, value_path: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| TriggerError::MeasurementUnavailable {
            message: format!("invalid measurement url '{url}'"),
            source: Some(Box::new(e)),
        })?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url,
            value_path: value_path.into(),
        })
    }

    pub fn from_config(config: &MeasurementConfig) -> Result<Self> {
        Self::new(
            &config.url,
            config.value_path.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl MeasurementSource for HttpMeasurementSource {
    fn fetch(&self) -> Result<f64> {
        debug!(url = %self.url, "fetching green energy measurement");
        let response = self.client.get(self.url.clone()).send()?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "measurement provider returned an error status");
            return Err(TriggerError::measurement(format!(
                "provider returned status {status}"
            )));
        }

        let body: Value = response.json()?;
        extract_percentage(&body, &self.value_path)
    }
}

/// Pull the percentage at a dot-separated `path` out of `body`.
///
/// Path segments that parse as integers index into arrays. Numeric strings
/// are accepted. The value must be finite and within 0..=100.
pub fn extract_percentage(body: &Value, path: &str) -> Result<f64> {
    let mut current = body;
    if !path.is_empty() {
        for part in path.split('.') {
            let next = match current {
                Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
                other => other.get(part),
            };
            current = next.ok_or_else(|| {
                TriggerError::measurement(format!("response has no value at '{path}'"))
            })?;
        }
    }

    let value = match current {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| TriggerError::measurement(format!("value at '{path}' is not a number")))?;

    check_percentage(value).map_err(|_| {
        TriggerError::measurement(format!("value {value} at '{path}' is not a percentage"))
    })
}

/// Accept `value` only if it is a finite percentage within 0..=100.
///
/// # Errors
/// `MeasurementUnavailable` for NaN, infinities and out-of-range values.
pub fn check_percentage(value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(TriggerError::measurement(format!("{value} is not a percentage")))
    }
}

/// Always reports the same measurement.
#[derive(Debug, Clone, Copy)]
pub struct StaticMeasurementSource(pub f64);

impl MeasurementSource for StaticMeasurementSource {
    fn fetch(&self) -> Result<f64> {
        check_percentage(self.0)
    }
}

/// Used when no provider is configured.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredMeasurementSource;

impl MeasurementSource for UnconfiguredMeasurementSource {
    fn fetch(&self) -> Result<f64> {
        Err(TriggerError::measurement(
            "no measurement provider configured (set measurement.url)",
        ))
    }
}
