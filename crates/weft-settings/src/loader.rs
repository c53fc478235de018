//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`WeftSettings::default()`]
//! 2. If `~/.weft/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};
use weft_core::ProviderKind;

use crate::errors::Result;
use crate::types::WeftSettings;

/// Log level override.
pub const ENV_LOG_LEVEL: &str = "WEFT_LOG_LEVEL";
/// Default provider override.
pub const ENV_DEFAULT_PROVIDER: &str = "WEFT_DEFAULT_PROVIDER";
/// UI channel capacity override (1..=65536).
pub const ENV_CHANNEL_CAPACITY: &str = "WEFT_CHANNEL_CAPACITY";
/// Tool progress preview length override (16..=65536).
pub const ENV_PREVIEW_CHARS: &str = "WEFT_PREVIEW_CHARS";

/// Resolve the path to the settings file (`~/.weft/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".weft").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<WeftSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON or out-of-range values are
/// errors.
pub fn load_settings_from_path(path: &Path) -> Result<WeftSettings> {
    let defaults = serde_json::to_value(WeftSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: WeftSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `WEFT_*` environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut WeftSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup` (env var name to raw value).
pub fn apply_overrides_from(settings: &mut WeftSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
        settings.logging.level = v;
    }
    if let Some(v) = read_parsed(&lookup, ENV_DEFAULT_PROVIDER, |v| v.parse::<ProviderKind>().ok()) {
        settings.stream.default_provider = v;
    }
    if let Some(v) = read_parsed(&lookup, ENV_CHANNEL_CAPACITY, |v| {
        parse_usize_range(v, 1, 65_536)
    }) {
        settings.stream.channel_capacity = v;
    }
    if let Some(v) = read_parsed(&lookup, ENV_PREVIEW_CHARS, |v| {
        parse_usize_range(v, 16, 65_536)
    }) {
        settings.stream.preview_chars = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a `usize` within an inclusive range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn read_parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Option<T> {
    let val = lookup(name)?;
    let result = parse(&val);
    if result.is_none() {
        warn!(key = name, value = %val, "invalid env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::SettingsError;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"stream": {"channelCapacity": 1024, "previewChars": 200}});
        let source = serde_json::json!({"stream": {"previewChars": 80}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["stream"]["previewChars"], 80);
        assert_eq!(merged["stream"]["channelCapacity"], 1024);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4, 5]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["items"], serde_json::json!([4, 5]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings.stream.channel_capacity, 1024);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"logging": {"level": "debug"}, "stream": {"defaultProvider": "codex"}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.stream.default_provider, ProviderKind::Codex);
        assert_eq!(settings.stream.preview_chars, 200);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }

    #[test]
    fn load_zero_capacity_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"stream": {"channelCapacity": 0}}"#).unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result, Err(SettingsError::InvalidValue(_))));
    }

    #[test]
    fn load_unknown_provider_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"stream": {"defaultProvider": "gemini"}}"#).unwrap();

        assert!(matches!(
            load_settings_from_path(&path),
            Err(SettingsError::Json(_))
        ));
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn overrides_apply_valid_values() {
        let mut settings = WeftSettings::default();
        apply_overrides_from(
            &mut settings,
            env(&[
                (ENV_LOG_LEVEL, "weft_stream=debug"),
                (ENV_DEFAULT_PROVIDER, "openai"),
                (ENV_CHANNEL_CAPACITY, "64"),
                (ENV_PREVIEW_CHARS, "32"),
            ]),
        );
        assert_eq!(settings.logging.level, "weft_stream=debug");
        assert_eq!(settings.stream.default_provider, ProviderKind::Codex);
        assert_eq!(settings.stream.channel_capacity, 64);
        assert_eq!(settings.stream.preview_chars, 32);
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let mut settings = WeftSettings::default();
        apply_overrides_from(
            &mut settings,
            env(&[
                (ENV_LOG_LEVEL, ""),
                (ENV_DEFAULT_PROVIDER, "gemini"),
                (ENV_CHANNEL_CAPACITY, "0"),
                (ENV_PREVIEW_CHARS, "8"),
            ]),
        );
        let defaults = WeftSettings::default();
        assert_eq!(settings.logging.level, defaults.logging.level);
        assert_eq!(settings.stream.default_provider, defaults.stream.default_provider);
        assert_eq!(settings.stream.channel_capacity, defaults.stream.channel_capacity);
        assert_eq!(settings.stream.preview_chars, defaults.stream.preview_chars);
    }

    // ── parse_usize_range ───────────────────────────────────────────

    #[test]
    fn parse_usize_bounds() {
        assert_eq!(parse_usize_range("50", 1, 10_000), Some(50));
        assert_eq!(parse_usize_range(" 16 ", 16, 64), Some(16));
        assert_eq!(parse_usize_range("0", 1, 10_000), None);
        assert_eq!(parse_usize_range("20000", 1, 10_000), None);
        assert_eq!(parse_usize_range("abc", 1, 10), None);
    }
}
