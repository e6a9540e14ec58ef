//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Invalid app source pattern '{pattern}': {message}")]
    GlobPattern { pattern: String, message: String },

    #[error("No app matches filter '{name}'{}", suggestion_suffix(.suggestion))]
    AppNotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("App '{name}' not found in app sources [{}]", .sources.join(", "))]
    AppFileNotFound { name: String, sources: Vec<String> },

    #[error("Invalid app: {message}")]
    InvalidApp { message: String },

    #[error("Invalid key '{key}' for app '{app}': {message}")]
    InvalidKey {
        app: String,
        key: String,
        message: String,
    },

    #[error("Value not found at path '{path}'")]
    ValueNotFound { path: String },

    #[error("Invalid set value: {message}")]
    InvalidSetValue { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{}'?)", name),
        None => String::new(),
    }
}

impl CoreError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
