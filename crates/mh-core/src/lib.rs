//! mh Core - configuration and app resolution for multi-chart deployments
//!
//! This crate provides the foundational types used throughout mh:
//! - `MhConfig`: deployment options with layered, override-if-set merging
//! - `Values`: the dynamic document rendered app templates read from
//! - `AppSource`: glob-based discovery of app template files
//! - `App`: a configured app resolved to its template file and options
//! - `MhConfigFile`: the configuration file and its effective apps

pub mod app;
pub mod app_source;
pub mod config;
pub mod config_file;
pub mod error;
pub mod values;

pub use app::{App, AppFile, AppSpec, lower_camel_case};
pub use app_source::{AppSource, AppSourceKind, AppSourceSpec, AppSources};
pub use config::{MhConfig, merge_configs};
pub use config_file::MhConfigFile;
pub use error::{CoreError, Result};
pub use values::{Values, key_segments, parse_set_values, parse_yaml};
