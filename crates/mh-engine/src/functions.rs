//! Template functions (global functions available in templates)

use minijinja::value::Rest;
use minijinja::{Environment, Error, ErrorKind, Value};
use std::sync::Arc;

use crate::datasource::Datasources;

/// Fail with a custom error message
///
/// Usage: {{ fail("Something went wrong") }}
pub fn fail(message: String) -> Result<Value, Error> {
    Err(Error::new(ErrorKind::InvalidOperation, message))
}

/// Create a dict from key-value pairs
///
/// Usage: {{ dict("key1", value1, "key2", value2) }}
pub fn dict(args: Rest<Value>) -> Result<Value, Error> {
    if args.len() % 2 != 0 {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            "dict requires an even number of arguments (key-value pairs)",
        ));
    }

    let mut map = serde_json::Map::new();
    for pair in args.chunks(2) {
        let key = pair[0]
            .as_str()
            .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "dict keys must be strings"))?;
        let value = serde_json::to_value(&pair[1])
            .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
        map.insert(key.to_string(), value);
    }

    Ok(Value::from_serialize(serde_json::Value::Object(map)))
}

/// Usage: {{ list("a", "b", "c") }}
pub fn list(args: Rest<Value>) -> Value {
    Value::from(args.0)
}

/// First argument that is defined, not none and not an empty string
///
/// Usage: {{ coalesce(app.replicas, defaults.replicas, 1) }}
pub fn coalesce(args: Rest<Value>) -> Value {
    args.iter()
        .find(|v| !v.is_undefined() && !v.is_none() && v.as_str() != Some(""))
        .cloned()
        .unwrap_or(Value::UNDEFINED)
}

/// Case-insensitive string equality
///
/// Usage: [% if eqfold(env, "PROD") %]
pub fn eqfold(a: String, b: String) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Environment variable, or `default` (empty when absent) when unset
///
/// Usage: [[ getenv("USER", "nobody") ]]
pub fn getenv(name: String, default: Option<String>) -> String {
    std::env::var(&name)
        .ok()
        .or(default)
        .unwrap_or_default()
}

/// Register `datasource`, `ds`, `datasource_exists` (or `datasourceExists`) and `include`
pub fn register_datasources(env: &mut Environment<'static>, datasources: &Arc<Datasources>) {
    let sources = Arc::clone(datasources);
    let lookup = move |name: String| -> Result<Value, Error> {
        sources
            .get(&name)
            .map(|fetched| Value::from_serialize(&fetched.value))
            .ok_or_else(|| unknown_datasource(&name))
    };
    let alias = lookup.clone();
    env.add_function("datasource", lookup);
    env.add_function("ds", alias);

    let sources = Arc::clone(datasources);
    let exists = move |name: String| sources.contains(&name);
    env.add_function("datasource_exists", exists.clone());
    env.add_function("datasourceExists", exists);

    let sources = Arc::clone(datasources);
    env.add_function("include", move |name: String| -> Result<String, Error> {
        sources
            .get(&name)
            .map(|fetched| fetched.raw.clone())
            .ok_or_else(|| unknown_datasource(&name))
    });
}

fn unknown_datasource(name: &str) -> Error {
    Error::new(
        ErrorKind::InvalidOperation,
        format!("undefined datasource '{}'", name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dict() {
        let value = dict(Rest(vec![Value::from("a"), Value::from(1)])).unwrap();
        assert_eq!(value.get_attr("a").unwrap(), Value::from(1));
        assert!(dict(Rest(vec![Value::from("a")])).is_err());
        assert!(dict(Rest(vec![Value::from(1), Value::from(2)])).is_err());
    }

    #[test]
    fn test_coalesce() {
        let value = coalesce(Rest(vec![Value::UNDEFINED, Value::from(""), Value::from("x")]));
        assert_eq!(value, Value::from("x"));
        assert!(coalesce(Rest(vec![])).is_undefined());
    }

    #[test]
    fn test_eqfold() {
        assert!(eqfold("Prod".to_string(), "pROD".to_string()));
        assert!(!eqfold("prod".to_string(), "dev".to_string()));
    }

    #[test]
    fn test_getenv_default() {
        assert_eq!(
            getenv("MH_TEST_SURELY_UNSET_VAR".to_string(), Some("fallback".to_string())),
            "fallback"
        );
        assert_eq!(getenv("MH_TEST_SURELY_UNSET_VAR".to_string(), None), "");
    }

    #[test]
    fn test_fail() {
        let err = fail("boom".to_string()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    }
}
