//! Settings loading from configuration files.
//!
//! This module loads [`RouterSettings`] from TOML or JSON and applies
//! environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `WAYPOST_MODE` | `mode` |
//! | `WAYPOST_DEFAULT_TARGET` | `default_target` |
//! | `WAYPOST_DATA_KEY` | `data_key` |
//! | `WAYPOST_ROUTE_HOOK` | `route_hook` |
//! | `WAYPOST_ISOLATE_LISTENER_ERRORS` | `isolate_listener_errors` |
//! | `WAYPOST_LOG_LEVEL` | `log_level` |
//! | `WAYPOST_DEBUG` | `debug` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use waypost_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/router.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::WaypostError;
use crate::settings::{Mode, RouterSettings};

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<RouterSettings, WaypostError> {
    // TOML goes through serde_json::Value so it can be deep-merged over the
    // serialized defaults.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| WaypostError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<RouterSettings, WaypostError> {
    let content = read_config(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<RouterSettings, WaypostError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<RouterSettings, WaypostError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| WaypostError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<RouterSettings, WaypostError> {
    let content = read_config(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> RouterSettings {
    let mut settings = RouterSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies environment variable overrides to a settings struct.
///
/// Boolean variables accept "true"/"1"/"yes" (any case) as true; anything
/// else is false. An unknown `WAYPOST_MODE` is logged and ignored.
pub fn apply_env_overrides(settings: &mut RouterSettings) {
    if let Ok(val) = std::env::var("WAYPOST_MODE") {
        match val.parse::<Mode>() {
            Ok(mode) => settings.mode = mode,
            Err(e) => tracing::warn!(error = %e, "ignoring WAYPOST_MODE override"),
        }
    }

    if let Ok(val) = std::env::var("WAYPOST_DEFAULT_TARGET") {
        settings.default_target = val;
    }

    if let Ok(val) = std::env::var("WAYPOST_DATA_KEY") {
        settings.data_key = val;
    }

    if let Ok(val) = std::env::var("WAYPOST_ROUTE_HOOK") {
        settings.route_hook = val;
    }

    if let Ok(val) = std::env::var("WAYPOST_ISOLATE_LISTENER_ERRORS") {
        settings.isolate_listener_errors = parse_bool(&val);
    }

    if let Ok(val) = std::env::var("WAYPOST_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("WAYPOST_DEBUG") {
        settings.debug = parse_bool(&val);
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_bool(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_config(path: &Path, format: &str) -> Result<String, WaypostError> {
    std::fs::read_to_string(path).map_err(|e| {
        WaypostError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<RouterSettings, WaypostError> {
    let default_json = serde_json::to_value(RouterSettings::default()).map_err(|e| {
        WaypostError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        WaypostError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
