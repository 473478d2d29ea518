//! TOML-based configuration.
//!
//! Stored at `<data_dir>/config.toml`:
//!
//! ```toml
//! [storage]
//! pool_size = 4
//!
//! [measurement]
//! url = "https://example.org/generation-mix"
//! value_path = "percentage"
//!
//! [window]
//! utc_offset_minutes = 60
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::store::PoolOptions;

/// Event ledger settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Ledger file; defaults to `<data_dir>/events.db`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_timeout_ms")]
    pub checkout_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Measurement provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// JSON endpoint reporting the green-energy share. Empty means unset.
    #[serde(default)]
    pub url: String,
    /// Dot-separated path to the percentage inside the response.
    #[serde(default = "default_value_path")]
    pub value_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Time-of-day window settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Offset from UTC used to read the current time of day.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub measurement: MeasurementConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

fn default_pool_size() -> usize {
    4
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_value_path() -> String {
    "percentage".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: default_pool_size(),
            checkout_timeout_ms: default_timeout_ms(),
            busy_timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            value_path: default_value_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Returns the data directory.
///
/// `GREENTRIGGER_DATA_DIR` wins when set. Otherwise this is
/// `~/.config/greentrigger/`, or `~/.config/greentrigger-dev/` when
/// `GREENTRIGGER_ENV=dev`. The directory is created if missing.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("GREENTRIGGER_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            match std::env::var("GREENTRIGGER_ENV").as_deref() {
                Ok("dev") => base.join("greentrigger-dev"),
                _ => base.join("greentrigger"),
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl Config {
    /// Default config file location.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first use.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be parsed, or if the
    /// defaults cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Ledger file, resolving the default against the data directory.
    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.path {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Ok(data_dir()?.join("events.db")),
        }
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            size: self.storage.pool_size.max(1),
            checkout_timeout: Duration::from_millis(self.storage.checkout_timeout_ms),
            busy_timeout: Duration::from_millis(self.storage.busy_timeout_ms),
        }
    }

    /// Timezone in which windows are evaluated.
    ///
    /// # Errors
    /// Returns an error if the offset is beyond ±24 hours.
    pub fn window_offset(&self) -> Result<FixedOffset, ConfigError> {
        let minutes = self.window.utc_offset_minutes;
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "window.utc_offset_minutes".into(),
                message: format!("{minutes} is not a valid UTC offset"),
            })
    }

    /// Whether a measurement provider has been configured.
    pub fn has_measurement_url(&self) -> bool {
        !self.measurement.url.trim().is_empty()
    }

    /// Get a value by dot-separated key, e.g. `"storage.pool_size"`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let value = key
            .split('.')
            .try_fold(&json, |current, part| current.get(part))?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. Does not save.
    ///
    /// The new value is parsed according to the type of the current one;
    /// optional fields that are unset take the value as a string.
    ///
    /// # Errors
    /// Returns an error for unknown keys or values of the wrong type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let (parent_path, leaf) = key.rsplit_once('.').unwrap_or(("", key));
        let parent = if parent_path.is_empty() {
            Some(&mut json)
        } else {
            parent_path
                .split('.')
                .try_fold(&mut json, |current, part| current.get_mut(part))
        };
        let slot = parent
            .and_then(Value::as_object_mut)
            .and_then(|obj| obj.get_mut(leaf))
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match slot {
            Value::Bool(_) => Value::Bool(
                value
                    .parse()
                    .map_err(|_| invalid(format!("'{value}' is not a bool")))?,
            ),
            Value::Number(_) => serde_json::from_str::<serde_json::Number>(value)
                .map(Value::Number)
                .map_err(|_| invalid(format!("'{value}' is not a number")))?,
            Value::Object(_) | Value::Array(_) => {
                return Err(invalid("cannot set a whole section".into()));
            }
            Value::Null | Value::String(_) => Value::String(value.to_string()),
        };
        *slot = new_value;

        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        if key == "measurement.url" && !value.is_empty() {
            url::Url::parse(value).map_err(|e| invalid(e.to_string()))?;
        }
        updated.window_offset()?;
        *self = updated;
        Ok(())
    }
}
