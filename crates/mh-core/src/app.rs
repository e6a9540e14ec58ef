//! Apps: named deployable units declared in the configuration file

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{MhConfig, merge_configs};
use crate::error::{CoreError, Result};

/// Where an app's template lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppFile {
    pub path: PathBuf,
}

/// An app entry as declared under `apps`
///
/// Every [`MhConfig`] option may be set per app and overrides the effective
/// configuration for that app only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<AppFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(flatten)]
    pub config: MhConfig,
}

impl AppSpec {
    /// A bare app entry with only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            alias: None,
            file: None,
            key: None,
            name: name.into(),
            namespace: None,
            config: MhConfig::empty(),
        }
    }

    /// Alias if set, otherwise the name
    pub fn id(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias,
            _ => &self.name,
        }
    }

    /// Whether `filter` selects this app by name or alias
    pub fn matches(&self, filter: &str) -> bool {
        self.name == filter || self.alias.as_deref() == Some(filter)
    }
}

/// A fully resolved app, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub id: String,
    pub name: String,
    pub alias: Option<String>,
    /// Path of the app's values inside the rendered config, e.g. `.myApp`
    pub key: String,
    pub namespace: Option<String>,
    pub file: PathBuf,
    /// Effective configuration with this app's overrides applied
    pub config: MhConfig,
}

impl App {
    /// Build an app from its spec and the run's effective configuration
    pub fn new(spec: AppSpec, effective: &MhConfig) -> Result<Self> {
        if spec.name.trim().is_empty() {
            return Err(CoreError::InvalidApp {
                message: format!("empty name for app {:?}", spec),
            });
        }

        let id = spec.id().to_string();

        let key = match spec.key {
            Some(key) if !key.is_empty() => key,
            _ => format!(".{}", lower_camel_case(&id)),
        };

        let file = spec
            .file
            .map(|f| f.path)
            .ok_or_else(|| CoreError::AppFileNotFound {
                name: spec.name.clone(),
                sources: Vec::new(),
            })?;

        let config = merge_configs(&[effective.clone(), spec.config])?;

        Ok(Self {
            id,
            name: spec.name,
            alias: spec.alias.filter(|a| !a.is_empty()),
            key,
            namespace: spec.namespace.filter(|n| !n.is_empty()),
            file,
            config,
        })
    }
}

/// Convert an identifier such as `my-app` or `MyApp` to `myApp`
pub fn lower_camel_case(input: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = input.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // "myApp" splits before 'A'; "HTTPServer" splits before 'S'
            if !prev.is_uppercase() || next_is_lower {
                words.push(std::mem::take(&mut current));
            }
        }

        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut result = String::with_capacity(input.len());
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if i == 0 {
            result.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                result.extend(first.to_uppercase());
                result.push_str(chars.as_str());
            }
        }
    }

    result
}
