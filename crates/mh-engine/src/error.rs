//! Engine error types

use miette::{Diagnostic, NamedSource, SourceSpan};
use mh_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Self-rendering did not converge after {rounds} rounds")]
    SelfRenderNonconvergence {
        rounds: usize,
        /// Output of the final round, kept for diagnostics
        last: String,
    },

    #[error("Datasource '{name}' failed: {message}")]
    Datasource { name: String, message: String },

    #[error("Rendered overrides have no `{field}` string")]
    MissingField { field: String },

    #[error("Failed to build chart dependencies in {}: {message}", .chart.display())]
    Build { chart: PathBuf, message: String },

    #[error("Failed to render app '{app}' with config {}: {source}", .config.display())]
    App {
        app: String,
        config: PathBuf,
        #[source]
        source: Box<EngineError>,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Wrap this error with the app and config file it occurred for
    pub fn for_app(self, app: &str, config: impl Into<PathBuf>) -> Self {
        Self::App {
            app: app.to_string(),
            config: config.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping app context wrappers
    pub fn root(&self) -> &EngineError {
        match self {
            Self::App { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownFunction,
    SyntaxError,
    TypeError,
    InvalidOperation,
    Other,
}

impl TemplateErrorKind {
    fn from_minijinja(kind: minijinja::ErrorKind) -> Self {
        match kind {
            minijinja::ErrorKind::UndefinedError => Self::UndefinedVariable,
            minijinja::ErrorKind::UnknownFilter => Self::UnknownFilter,
            minijinja::ErrorKind::UnknownFunction => Self::UnknownFunction,
            minijinja::ErrorKind::SyntaxError => Self::SyntaxError,
            minijinja::ErrorKind::InvalidOperation => Self::InvalidOperation,
            minijinja::ErrorKind::NonPrimitive | minijinja::ErrorKind::NonKey => Self::TypeError,
            _ => Self::Other,
        }
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            Self::UndefinedVariable => Some(
                "every referenced variable must exist; use `default(...)` or an `is defined` test for optional keys",
            ),
            Self::UnknownFilter | Self::UnknownFunction => {
                Some("check the spelling against the filters and functions mh registers")
            }
            Self::SyntaxError => Some("check that every tag is closed with the matching delimiter"),
            _ => None,
        }
    }
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(mh::template::render))]
pub struct TemplateError {
    pub message: String,

    pub kind: TemplateErrorKind,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create a template error from a MiniJinja error
    pub fn from_minijinja(err: minijinja::Error, template_name: &str, template_source: &str) -> Self {
        let kind = TemplateErrorKind::from_minijinja(err.kind());
        let message = match err.detail() {
            Some(detail) => format!("{}: {}", err.kind(), detail),
            None => err.kind().to_string(),
        };
        let span = err
            .line()
            .and_then(|line_num| calculate_span(template_source, line_num));

        Self {
            message,
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion: kind.help().map(str::to_string),
        }
    }

    /// Create a simple error without source mapping
    pub fn simple(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TemplateErrorKind::Other,
            src: NamedSource::new("<unknown>", String::new()),
            span: None,
            suggestion: None,
        }
    }

    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// Span covering the whole of line `line_num` (1-based)
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (idx, line) in source.split('\n').enumerate() {
        if idx + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }

    None
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_span() {
        let source = "a: 1\nb: {{ oops }}\nc: 3";
        let span = calculate_span(source, 2).unwrap();
        assert_eq!(span.offset(), 5);
        assert_eq!(span.len(), 13);
        assert!(calculate_span(source, 9).is_none());
    }

    #[test]
    fn test_root_skips_app_wrappers() {
        let err = EngineError::MissingField {
            field: "chart".to_string(),
        }
        .for_app("web", "mh.yaml");

        assert!(err.to_string().contains("web"));
        assert!(matches!(err.root(), EngineError::MissingField { .. }));
    }
}
