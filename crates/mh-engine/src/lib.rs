//! mh Engine - self-rendering configuration and app templates
//!
//! This crate turns the main configuration document and each app's template
//! into the overrides handed to helm:
//! - Fixed-point self-rendering with `[[ ]]` delimiters and datasources
//! - Helm-flavoured filters and functions on top of MiniJinja
//! - Per-app rendering with `name` and `app` bound for every template
//! - Diagnostics with source spans through `miette`

pub mod datasource;
pub mod engine;
pub mod error;
pub mod filters;
pub mod functions;
pub mod pipeline;
pub mod self_render;

pub use datasource::{
    Datasource, DatasourceFetcher, Datasources, DefaultFetcher, Fetched, SelfRenderConfig,
};
pub use engine::{Engine, EngineBuilder, Syntax};
pub use error::{EngineError, Result, TemplateError, TemplateErrorKind};
pub use pipeline::{
    AppRenderer, DependencyBuilder, HelmDependencyBuilder, MainConfig, RenderedApp,
};
pub use self_render::{MAX_SELF_RENDER_ROUNDS, SelfRenderer, self_render};
