//! Per-app rendering: from the main configuration to helm overrides

use mh_core::{App, MhConfigFile, Values, key_segments};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::engine::{Engine, Syntax};
use crate::error::{EngineError, Result};
use crate::self_render::SelfRenderer;

/// The self-rendered main configuration, loaded once per run
#[derive(Debug, Clone)]
pub struct MainConfig {
    pub path: PathBuf,
    /// Text after self-rendering
    pub rendered: String,
    pub values: Values,
    pub file: MhConfigFile,
}

impl MainConfig {
    /// Read and self-render the configuration at `path`
    pub fn load(path: &Path, renderer: &SelfRenderer) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| EngineError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let rendered = renderer.render(&raw)?;
        Self::from_rendered(path, rendered)
    }

    /// Build from an already self-rendered document
    pub fn from_rendered(path: &Path, rendered: String) -> Result<Self> {
        let values = Values::from_yaml(&rendered)?;
        let file = MhConfigFile::from_yaml(&rendered)?;
        Ok(Self {
            path: path.to_path_buf(),
            rendered,
            values,
            file,
        })
    }
}

/// The result of rendering one app
#[derive(Debug, Clone)]
pub struct RenderedApp {
    pub app: App,
    /// Rendered template text, passed to helm as values
    pub overrides: String,
    /// `overrides` parsed
    pub values: JsonValue,
    pub chart: String,
    pub version: Option<String>,
}

impl RenderedApp {
    /// Whether `chart` points at a directory rather than a repository chart
    pub fn is_local_chart(&self) -> bool {
        is_local_chart(&self.chart)
    }
}

/// Relative (`./charts/x`) and absolute chart paths are built locally
fn is_local_chart(chart: &str) -> bool {
    chart.starts_with(['.', '/'])
}

/// Prepares a local chart's dependencies before it is deployed
pub trait DependencyBuilder {
    fn build(&self, chart: &Path) -> Result<()>;
}

/// Runs `helm dependency update` for charts that declare requirements
#[derive(Debug, Clone)]
pub struct HelmDependencyBuilder {
    helm: PathBuf,
}

impl Default for HelmDependencyBuilder {
    fn default() -> Self {
        Self {
            helm: PathBuf::from("helm"),
        }
    }
}

impl HelmDependencyBuilder {
    pub fn with_binary(helm: impl Into<PathBuf>) -> Self {
        Self { helm: helm.into() }
    }
}

impl DependencyBuilder for HelmDependencyBuilder {
    fn build(&self, chart: &Path) -> Result<()> {
        if !chart.join("requirements.yaml").exists() {
            tracing::debug!(chart = %chart.display(), "No requirements.yaml, skipping dependency update");
            return Ok(());
        }

        tracing::info!(chart = %chart.display(), "Updating chart dependencies");
        let output = Command::new(&self.helm)
            .args(["dependency", "update"])
            .current_dir(chart)
            .output()
            .map_err(|e| EngineError::Build {
                chart: chart.to_path_buf(),
                message: format!("failed to run {}: {}", self.helm.display(), e),
            })?;

        if !output.status.success() {
            return Err(EngineError::Build {
                chart: chart.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// Renders app templates against the main configuration
pub struct AppRenderer {
    engine: Engine,
    builder: Box<dyn DependencyBuilder>,
}

impl Default for AppRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl AppRenderer {
    pub fn new() -> Self {
        Self {
            engine: Engine::builder().strict(true).syntax(Syntax::Standard).build(),
            builder: Box::new(HelmDependencyBuilder::default()),
        }
    }

    pub fn with_builder(mut self, builder: impl DependencyBuilder + 'static) -> Self {
        self.builder = Box::new(builder);
        self
    }

    /// Load the configuration at `config_path`, then render `app`
    pub fn render_from_path(&self, app: &App, config_path: &Path) -> Result<RenderedApp> {
        let renderer = SelfRenderer::new().for_file(config_path);
        let main = MainConfig::load(config_path, &renderer)
            .map_err(|e| e.for_app(&app.id, config_path))?;
        self.render(app, &main)
    }

    /// Render `app` into its helm overrides
    pub fn render(&self, app: &App, main: &MainConfig) -> Result<RenderedApp> {
        self.render_app(app, main)
            .map_err(|e| e.for_app(&app.id, &main.path))
    }

    fn render_app(&self, app: &App, main: &MainConfig) -> Result<RenderedApp> {
        tracing::info!(app = %app.id, file = %app.file.display(), "Rendering app");

        let body = std::fs::read_to_string(&app.file).map_err(|source| EngineError::ReadFile {
            path: app.file.clone(),
            source,
        })?;

        main.values.get_path(&app.key)?;

        let mut values = main.values.clone();
        values.apply_set(&app.config.set)?;
        let template = format!("{}{}", preamble(app, values.inner())?, body);

        let file_name = app
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = format!("{}/{}", app.id, file_name);

        let overrides = self.engine.render_string(&template, values.inner(), &name)?;
        let parsed = mh_core::parse_yaml(&overrides)?;

        let chart = parsed
            .get("chart")
            .and_then(JsonValue::as_str)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| EngineError::MissingField {
                field: "chart".to_string(),
            })?
            .to_string();

        let version = match parsed.get("version") {
            Some(JsonValue::String(v)) if !v.is_empty() => Some(v.clone()),
            Some(JsonValue::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        if is_local_chart(&chart) {
            self.builder.build(Path::new(&chart))?;
        }

        Ok(RenderedApp {
            app: app.clone(),
            overrides,
            values: parsed,
            chart,
            version,
        })
    }
}

/// The `name`/`app` bindings prepended to every app template
fn preamble(app: &App, values: &JsonValue) -> Result<String> {
    let name = serde_json::to_string(&app.id)?;
    Ok(format!(
        "{{%- set name = {} %}}\n{{%- set app = {} %}}\n",
        name,
        key_expression(app, values)?
    ))
}

/// Turn `.a.b-c` into `a["b-c"]`
///
/// A numeric segment addressing a list in `values` becomes an integer
/// subscript (`.list.0` is `list[0]`).
fn key_expression(app: &App, values: &JsonValue) -> Result<String> {
    let invalid = |message: &str| mh_core::CoreError::InvalidKey {
        app: app.id.clone(),
        key: app.key.clone(),
        message: message.to_string(),
    };

    let segments = key_segments(&app.key);
    let (first, rest) = segments
        .split_first()
        .ok_or_else(|| invalid("key must name a value inside the config"))?;

    if !is_identifier(first) {
        return Err(invalid("first key segment must be an identifier").into());
    }

    let mut expr = first.to_string();
    let mut node = values.get(*first);
    for segment in rest {
        let index = match node {
            Some(JsonValue::Array(_)) => segment.parse::<usize>().ok(),
            _ => None,
        };
        expr.push('[');
        match index {
            Some(index) => expr.push_str(&index.to_string()),
            None => expr.push_str(&serde_json::to_string(segment)?),
        }
        expr.push(']');
        node = match (node, index) {
            (Some(JsonValue::Array(items)), Some(index)) => items.get(index),
            (Some(JsonValue::Object(map)), _) => map.get(*segment),
            _ => None,
        };
    }
    Ok(expr)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
