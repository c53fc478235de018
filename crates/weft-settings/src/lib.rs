//! # weft-settings
//!
//! Layered configuration for the weft stream engine.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`WeftSettings::default()`]
//! 2. **User file**: `~/.weft/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `WEFT_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<WeftSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// Loads from `~/.weft/settings.json` with env overrides on first call and
/// caches the result. Falls back to compiled defaults if loading fails.
pub fn get_settings() -> &'static WeftSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|error| {
            tracing::warn!(%error, "failed to load settings, using defaults");
            WeftSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: WeftSettings) -> std::result::Result<(), WeftSettings> {
    SETTINGS.set(settings)
}
