//! App sources: where app template files are discovered
//!
//! Each source globs `*.y*ml` below a directory and keys every match by its
//! file stem, so `apps/frontend.yaml` answers to the app name `frontend`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app::{AppFile, AppSpec};
use crate::error::{CoreError, Result};

const APP_FILE_GLOB: &str = "/*.y*ml";

/// How an app source's `source` string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppSourceKind {
    /// `source` is a directory, relative to the working directory or absolute
    Path,
    /// `source` is a directory relative to the configuration file
    ConfigPath,
}

/// An app source as declared under `appSources`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSourceSpec {
    pub kind: AppSourceKind,
    pub name: String,
    pub source: String,
}

impl AppSourceSpec {
    /// Glob pattern matching this source's app files
    pub fn pattern(&self, config_path: &Path) -> String {
        match self.kind {
            AppSourceKind::Path => format!("{}{}", self.source, APP_FILE_GLOB),
            AppSourceKind::ConfigPath => {
                let dir = config_path
                    .parent()
                    .map(|p| p.to_string_lossy().into_owned())
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| ".".to_string());
                let sep = if self.source.starts_with('/') { "" } else { "/" };
                format!("{}{}{}{}", dir, sep, self.source, APP_FILE_GLOB)
            }
        }
    }
}

/// An app source with all the app files it currently matches
#[derive(Debug, Clone)]
pub struct AppSource {
    pub spec: AppSourceSpec,
    pub files: IndexMap<String, PathBuf>,
}

impl AppSource {
    /// Glob the filesystem for the files of `spec`
    pub fn resolve(spec: AppSourceSpec, config_path: &Path) -> Result<Self> {
        let pattern = spec.pattern(config_path);

        let paths = glob::glob(&pattern).map_err(|e| CoreError::GlobPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;

        let mut files = IndexMap::new();
        for entry in paths {
            let path = entry.map_err(|e| CoreError::GlobPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;

            if let Some(stem) = path.file_stem() {
                files.insert(stem.to_string_lossy().into_owned(), path);
            }
        }

        if files.is_empty() {
            tracing::warn!(app_source = %spec.name, %pattern, "AppSource matches no files");
        } else {
            tracing::debug!(app_source = %spec.name, count = files.len(), "Resolved app source");
        }

        Ok(Self { spec, files })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Look up the app file for `app_name`
    pub fn lookup(&self, app_name: &str) -> Option<&Path> {
        self.files.get(app_name).map(PathBuf::as_path)
    }

    /// Set `spec.file` to this source's match for the app name
    ///
    /// Returns `false` and leaves `spec` untouched when there is no match.
    pub fn assign_file(&self, spec: &mut AppSpec) -> bool {
        match self.lookup(&spec.name) {
            Some(path) => {
                spec.file = Some(AppFile {
                    path: path.to_path_buf(),
                });
                true
            }
            None => false,
        }
    }
}

/// Resolved app sources in declaration order
#[derive(Debug, Clone, Default)]
pub struct AppSources(pub Vec<AppSource>);

impl AppSources {
    /// Resolve every declared source against the filesystem
    pub fn resolve(specs: &[AppSourceSpec], config_path: &Path) -> Result<Self> {
        specs
            .iter()
            .cloned()
            .map(|spec| AppSource::resolve(spec, config_path))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// First source that knows the app wins
    pub fn assign_file(&self, spec: &mut AppSpec) -> bool {
        self.0.iter().any(|source| source.assign_file(spec))
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|s| s.name().to_string()).collect()
    }
}
