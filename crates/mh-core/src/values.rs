//! Values handling: the dynamic document shared by every app render

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};

/// Insertion-ordered document parsed from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Parse values from a YAML string
    ///
    /// An empty document yields empty values rather than `null`.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }
        match parse_yaml(yaml)? {
            JsonValue::Null => Ok(Self::new()),
            other => Ok(Self(other)),
        }
    }

    /// Deep merge another Values into this one
    ///
    /// Objects merge recursively; scalars and arrays in `overlay` replace
    /// what is in `self`.
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Set a value by dotted path (e.g., "image.tag")
    pub fn set(&mut self, path: &str, value: JsonValue) {
        let parts = split_escaped(path, '.');
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        set_nested(&mut self.0, &parts, value);
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Resolve an app key such as `.frontend.web`
    ///
    /// The leading dot is optional; a bare `.` addresses the whole document.
    pub fn get_path(&self, key: &str) -> Result<&JsonValue> {
        let segments = key_segments(key);
        get_nested(&self.0, &segments).ok_or_else(|| CoreError::ValueNotFound {
            path: key.to_string(),
        })
    }

    /// Apply `key=value[,key2=value2]` entries in order
    pub fn apply_set(&mut self, entries: &[String]) -> Result<()> {
        let overrides = parse_set_values(entries)?;
        self.merge(&overrides);
        Ok(())
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

/// Parse YAML into a JSON tree, resolving `<<` merge keys
///
/// Non-string mapping keys (`1: x`, `true: y`) become strings.
pub fn parse_yaml(yaml: &str) -> Result<JsonValue> {
    let mut value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    value.apply_merge()?;
    Ok(serde_json::to_value(value)?)
}

/// Split an app key into its path segments, dropping the leading dot
pub fn key_segments(key: &str) -> Vec<&str> {
    key.trim_start_matches('.')
        .split('.')
        .filter(|s| !s.is_empty())
        .collect()
}

fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

fn set_nested(value: &mut JsonValue, path: &[&str], new_value: JsonValue) {
    let Some((key, remaining)) = path.split_first() else {
        *value = new_value;
        return;
    };

    if !value.is_object() {
        *value = JsonValue::Object(serde_json::Map::new());
    }

    if let JsonValue::Object(map) = value {
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
        set_nested(entry, remaining, new_value);
    }
}

fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let Some((key, remaining)) = path.split_first() else {
        return Some(value);
    };

    match value {
        JsonValue::Object(map) => map.get(*key).and_then(|v| get_nested(v, remaining)),
        JsonValue::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|idx| items.get(idx))
            .and_then(|v| get_nested(v, remaining)),
        _ => None,
    }
}

/// Split on `sep`, honouring backslash escapes (`\,`, `\.`, `\\`)
fn split_escaped(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) if next == sep || next == '\\' => current.push(next),
                Some(next) => {
                    current.push(c);
                    current.push(next);
                }
                None => current.push(c),
            }
        } else if c == sep {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

/// Infer a scalar the way `--set` values are typed
///
/// Booleans and `null` are case-insensitive; integers are recognised
/// unless they carry a leading zero, so `0755` stays a string.
fn typed_value(raw: &str) -> JsonValue {
    if raw.eq_ignore_ascii_case("true") {
        JsonValue::Bool(true)
    } else if raw.eq_ignore_ascii_case("false") {
        JsonValue::Bool(false)
    } else if raw.eq_ignore_ascii_case("null") {
        JsonValue::Null
    } else if raw == "0" {
        JsonValue::Number(0.into())
    } else if !raw.starts_with('0') {
        match raw.parse::<i64>() {
            Ok(num) => JsonValue::Number(num.into()),
            Err(_) => JsonValue::String(raw.to_string()),
        }
    } else {
        JsonValue::String(raw.to_string())
    }
}

/// Parse `--set` entries (`key=value`, comma-separated pairs allowed)
///
/// Later pairs override earlier ones on conflicting paths. Empty entries
/// are ignored.
pub fn parse_set_values(set_args: &[String]) -> Result<Values> {
    let mut values = Values::new();

    for arg in set_args {
        for pair in split_escaped(arg, ',') {
            if pair.trim().is_empty() {
                continue;
            }

            let (key, val) = pair.split_once('=').ok_or_else(|| CoreError::InvalidSetValue {
                message: format!("'{}' is not in key=value format", pair),
            })?;

            let key = key.trim();
            if key.is_empty() || key.starts_with('.') || key.ends_with('.') {
                return Err(CoreError::InvalidSetValue {
                    message: format!("'{}' has an invalid key", pair),
                });
            }

            values.set(key, typed_value(val));
        }
    }

    Ok(values)
}
