//! Settings type definitions.
//!
//! All types use camelCase JSON and `#[serde(default)]`, so a partial file
//! only needs the keys it overrides.

use serde::{Deserialize, Serialize};
use weft_core::ProviderKind;

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "logging": { "level": "debug" },
///   "stream": { "defaultProvider": "codex", "previewChars": 120 }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeftSettings {
    /// Settings schema version.
    pub version: String,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Stream pipeline configuration.
    pub stream: StreamSettings,
}

impl Default for WeftSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            logging: LoggingSettings::default(),
            stream: StreamSettings::default(),
        }
    }
}

impl WeftSettings {
    /// Reject values the pipeline cannot run with.
    ///
    /// Env overrides are range-checked as they are read; this covers values
    /// that came from the settings file.
    pub fn validate(&self) -> Result<()> {
        if self.stream.channel_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "stream.channelCapacity must be at least 1".into(),
            ));
        }
        if self.stream.preview_chars == 0 {
            return Err(SettingsError::InvalidValue(
                "stream.previewChars must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (or `EnvFilter` directive) for stderr output.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Stream pipeline configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamSettings {
    /// Provider assumed when the caller does not name one.
    pub default_provider: ProviderKind,
    /// Capacity of each session's UI event broadcast channel.
    pub channel_capacity: usize,
    /// Maximum characters of a tool progress preview.
    pub preview_chars: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::Claude,
            channel_capacity: 1024,
            preview_chars: 200,
        }
    }
}
