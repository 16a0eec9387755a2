//! Schema checks for jsonshelf JSON5 configuration layers.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Check a single config layer for unknown keys and wrong value types.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &["$schema", "store", "identity", "view", "logging"],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("store") {
        validate_store(value, layer, "store")?;
    }
    if let Some(value) = map.get("identity") {
        validate_identity(value, layer, "identity")?;
    }
    if let Some(value) = map.get("view") {
        validate_view(value, layer, "view")?;
    }
    if let Some(value) = map.get("logging") {
        let map = expect_object(value, layer, "logging")?;
        ensure_allowed_keys(map, &["file"], layer, "logging")?;
        if let Some(value) = map.get("file") {
            expect_optional_string(value, layer, "logging.file")?;
        }
    }
    Ok(())
}

fn validate_store(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["backend", "path", "collection"], layer, path)?;
    if let Some(value) = map.get("backend") {
        let backend_path = join_path(path, "backend");
        match value.as_str() {
            Some("memory" | "file") => {}
            Some(_) => {
                return Err(invalid_field(
                    layer,
                    &backend_path,
                    "expected \"memory\" or \"file\"",
                ));
            }
            None => return Err(invalid_field(layer, &backend_path, "expected string")),
        }
    }
    if let Some(value) = map.get("path") {
        expect_optional_string(value, layer, &join_path(path, "path"))?;
    }
    if let Some(value) = map.get("collection") {
        expect_string(value, layer, &join_path(path, "collection"))?;
    }
    Ok(())
}

fn validate_identity(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["user_id", "email"], layer, path)?;
    for key in ["user_id", "email"] {
        if let Some(value) = map.get(key) {
            expect_optional_string(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

fn validate_view(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["preview_max_chars"], layer, path)?;
    if let Some(value) = map.get("preview_max_chars") {
        expect_u64(value, layer, &join_path(path, "preview_max_chars"))?;
    }
    Ok(())
}

fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Strings or `null`; a later layer may clear a value set by an earlier one.
fn expect_optional_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() || value.is_null() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string or null"))
    }
}

fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
