//! Fixed-point self-rendering of the main configuration document
//!
//! The document is both the template and its own context: each round parses
//! the current text as YAML, renders it against itself with the `[[ ]]`
//! syntax, and stops once the output no longer changes.
//!
//! Inside `[[ ]]` and `[% %]` tags a reference may start at the document
//! root with a dot: `[[ .values.a ]]` is the same as `[[ values.a ]]`.

use regex::{Captures, Regex};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use crate::datasource::{DatasourceFetcher, Datasources, DefaultFetcher, SelfRenderConfig};
use crate::engine::{Engine, Syntax};
use crate::error::{EngineError, Result};

/// Upper bound on rendering rounds before giving up
pub const MAX_SELF_RENDER_ROUNDS: usize = 10;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\[.*?\]\]|\[%.*?%\]").expect("valid regex"));

/// Renders a document against itself until it stabilizes
pub struct SelfRenderer {
    fetcher: Box<dyn DatasourceFetcher>,
    base_dir: PathBuf,
    name: String,
}

impl Default for SelfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SelfRenderer {
    pub fn new() -> Self {
        Self {
            fetcher: Box::new(DefaultFetcher),
            base_dir: PathBuf::from("."),
            name: "<config>".to_string(),
        }
    }

    /// Use a different fetcher for declared datasources
    pub fn with_fetcher(mut self, fetcher: impl DatasourceFetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Directory relative datasource paths resolve against
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Name shown in template diagnostics
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Configure base directory and diagnostic name from a config file path
    pub fn for_file(self, path: &Path) -> Self {
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.with_base_dir(base_dir)
            .with_name(path.display().to_string())
    }

    /// Render `document` to its fixed point
    pub fn render(&self, document: &str) -> Result<String> {
        let datasources = self.load_datasources(document)?;
        let engine = Engine::builder()
            .strict(true)
            .syntax(Syntax::SelfRender)
            .datasources(Arc::new(datasources))
            .build();

        let mut current = root_references(document).into_owned();
        for round in 1..=MAX_SELF_RENDER_ROUNDS {
            let context = parse_context(&current)?;
            let rendered = engine.render_string(&current, &context, &self.name)?;
            let rendered = root_references(&rendered).into_owned();

            if rendered == current {
                tracing::debug!(round, "Self-render converged");
                return Ok(rendered);
            }

            tracing::debug!(round, "Self-render round changed the document");
            current = rendered;
        }

        Err(EngineError::SelfRenderNonconvergence {
            rounds: MAX_SELF_RENDER_ROUNDS,
            last: current,
        })
    }

    fn load_datasources(&self, document: &str) -> Result<Datasources> {
        let config = SelfRenderConfig::from_document(&parse_context(document)?)?;
        if config.is_empty() {
            return Ok(Datasources::default());
        }
        Datasources::load(&config, &self.base_dir, self.fetcher.as_ref())
    }
}

/// Render with the default fetcher, resolving relative datasources against the working directory
pub fn self_render(document: &str) -> Result<String> {
    SelfRenderer::new().render(document)
}

fn parse_context(text: &str) -> Result<JsonValue> {
    if text.trim().is_empty() {
        return Ok(JsonValue::Object(serde_json::Map::new()));
    }
    let value = mh_core::parse_yaml(text)?;
    Ok(match value {
        JsonValue::Object(_) => value,
        _ => JsonValue::Object(serde_json::Map::new()),
    })
}

/// Rewrite root references (`.values.a`) in every tag to plain variables
fn root_references(text: &str) -> Cow<'_, str> {
    TAG.replace_all(text, |caps: &Captures<'_>| strip_root_dots(&caps[0]))
}

/// Drop a dot that starts an identifier outside string literals
///
/// Attribute access (`a.b`, `f().b`, `x[0].b`) and numbers (`1.5`) keep
/// their dot.
fn strip_root_dots(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len());
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;
    let mut chars = tag.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q && prev != Some('\\') => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '.'
                && !prev.is_some_and(ends_operand)
                && chars
                    .peek()
                    .is_some_and(|next| next.is_ascii_alphabetic() || *next == '_') =>
            {
                prev = Some(c);
                continue;
            }
            None => {}
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

fn ends_operand(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ')' | ']' | '.' | '"' | '\'')
}
