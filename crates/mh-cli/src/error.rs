//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps library errors to appropriate exit codes.

use miette::Diagnostic;
use mh_core::CoreError;
use mh_engine::{EngineError, TemplateError};
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Config file, `set` entries or datasources are unusable
    #[error("Configuration error: {message}")]
    #[diagnostic(code(mh::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A filter or app file could not be resolved
    #[error("{message}")]
    #[diagnostic(code(mh::cli::app))]
    AppNotFound { message: String },

    /// Template rendering failed, with the template's own diagnostic attached
    #[error("{context}")]
    #[diagnostic(code(mh::cli::template))]
    Template {
        context: String,
        #[source]
        #[diagnostic_source]
        source: TemplateError,
    },

    /// Rendering failed outside of a template
    #[error("{message}")]
    #[diagnostic(code(mh::cli::render))]
    Render { message: String },

    /// Chart dependency build failed
    #[error("{message}")]
    #[diagnostic(code(mh::cli::build))]
    Build { message: String },

    #[error("Current kubectl context '{current}' does not match targetContext '{target}'")]
    #[diagnostic(
        code(mh::cli::context),
        help("switch with `kubectl config use-context {target}` or change targetContext")
    )]
    ContextMismatch { current: String, target: String },

    /// helm or kubectl failed
    #[error("`{command}` failed: {message}")]
    #[diagnostic(code(mh::cli::external))]
    External { command: String, message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(mh::cli::io))]
    Io { message: String },

    #[error("{message}")]
    #[diagnostic(code(mh::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::AppNotFound { .. } => exit_codes::APP_NOT_FOUND,
            CliError::Template { .. } | CliError::Render { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Build { .. } => exit_codes::BUILD_ERROR,
            CliError::ContextMismatch { .. } => exit_codes::CONTEXT_MISMATCH,
            CliError::External { .. } => exit_codes::EXTERNAL_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an error for a failed external command
    pub fn external(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::External {
            command: command.into(),
            message: message.into(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        from_core(&err, err.to_string())
    }
}

fn from_core(err: &CoreError, message: String) -> CliError {
    match err {
        CoreError::AppNotFound { .. } | CoreError::AppFileNotFound { .. } => {
            CliError::AppNotFound { message }
        }
        CoreError::Io(_) => CliError::Io { message },
        CoreError::InvalidSetValue { .. } => CliError::config_with_help(
            message,
            "use key=value, separate entries with commas and escape literal commas as \\,",
        ),
        _ => CliError::config(message),
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        let context = match &err {
            EngineError::App { app, config, .. } => format!(
                "Failed to render app '{}' with config {}",
                app,
                config.display()
            ),
            _ => "Failed to self-render the configuration".to_string(),
        };
        let message = err.to_string();

        match err.root() {
            EngineError::Template(source) => Self::Template {
                context,
                source: source.clone(),
            },
            EngineError::SelfRenderNonconvergence { .. }
            | EngineError::MissingField { .. }
            | EngineError::Json(_)
            | EngineError::Core(CoreError::YamlParse(_)) => Self::Render { message },
            EngineError::Build { .. } => Self::Build { message },
            EngineError::Datasource { .. } => Self::config(message),
            EngineError::ReadFile { .. } => Self::Io { message },
            EngineError::Core(core) => from_core(core, message),
            EngineError::App { .. } => Self::Other { message },
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
