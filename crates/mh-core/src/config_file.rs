//! The mh configuration file and app resolution against it

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::app::{App, AppSpec};
use crate::app_source::{AppSourceSpec, AppSources};
use crate::config::MhConfig;
use crate::error::{CoreError, Result};

/// Structure of a mh configuration file
///
/// Keys other than these are free-form data for app templates and are
/// ignored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MhConfigFile {
    #[serde(default = "MhConfig::empty")]
    pub mh: MhConfig,

    #[serde(default)]
    pub apps: Vec<AppSpec>,

    #[serde(default)]
    pub app_sources: Vec<AppSourceSpec>,
}

impl Default for MhConfigFile {
    fn default() -> Self {
        Self {
            mh: MhConfig::empty(),
            apps: Vec::new(),
            app_sources: Vec::new(),
        }
    }
}

impl MhConfigFile {
    /// Parse a (self-rendered) configuration document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        value.apply_merge()?;
        Ok(serde_yaml::from_value(value)?)
    }

    /// All apps selected by `filters`, resolved against the app sources
    ///
    /// With no filters every app is selected. Otherwise an app is selected
    /// when its name or alias equals one of the filters; the result keeps
    /// declaration order. A filter that selects nothing is an error, as is
    /// a selected app whose file can't be found in any source.
    pub fn effective_apps(
        &self,
        config_path: &Path,
        filters: &[String],
        effective: &MhConfig,
    ) -> Result<Vec<App>> {
        let sources = AppSources::resolve(&self.app_sources, config_path)?;

        if let Some(unmatched) = filters
            .iter()
            .find(|filter| !self.apps.iter().any(|app| app.matches(filter)))
        {
            return Err(CoreError::AppNotFound {
                name: unmatched.clone(),
                suggestion: self.closest_app_name(unmatched),
            });
        }

        let mut apps = Vec::new();
        for spec in &self.apps {
            if !filters.is_empty() {
                let Some(filter) = filters.iter().find(|f| spec.matches(f)) else {
                    continue;
                };
                tracing::info!(app = %spec.name, %filter, "App matched filter");
            }

            let mut spec = spec.clone();
            if spec.file.is_none() && !sources.assign_file(&mut spec) {
                tracing::error!(app = %spec.name, "App not found in sources");
                return Err(CoreError::AppFileNotFound {
                    name: spec.name,
                    sources: sources.names(),
                });
            }

            apps.push(App::new(spec, effective)?);
        }

        Ok(apps)
    }

    fn closest_app_name(&self, filter: &str) -> Option<String> {
        self.apps
            .iter()
            .flat_map(|app| std::iter::once(app.name.as_str()).chain(app.alias.as_deref()))
            .map(|candidate| (strsim::jaro_winkler(filter, candidate), candidate))
            .filter(|(score, _)| *score > 0.8)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, candidate)| candidate.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, MhConfigFile) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("apps")).unwrap();
        fs::write(dir.path().join("apps/foo.yaml"), "chart: stable/foo\n").unwrap();
        fs::write(dir.path().join("apps/web.yaml"), "chart: stable/web\n").unwrap();

        let config = MhConfigFile::from_yaml(
            r#"
mh:
  team: platform
appSources:
  - kind: configPath
    name: local
    source: /apps
apps:
  - name: foo
  - name: web
    alias: frontend
    team: web-team
  - name: pinned
    file:
      path: /srv/pinned.yaml
values:
  free: form
"#,
        )
        .unwrap();

        (dir, config)
    }

    #[test]
    fn test_parse_config_file() {
        let (_dir, config) = fixture();
        assert_eq!(config.mh.team, "platform");
        assert_eq!(config.apps.len(), 3);
        assert_eq!(config.app_sources.len(), 1);
        assert_eq!(config.apps[1].config.team, "web-team");
    }

    #[test]
    fn test_app_entries_share_anchored_options() {
        let config = MhConfigFile::from_yaml(
            r#"
x-defaults: &defaults
  team: web-team
  noRecreatePods: true
apps:
  - <<: *defaults
    name: web
  - <<: *defaults
    name: api
    team: api-team
"#,
        )
        .unwrap();

        assert_eq!(config.apps[0].config.team, "web-team");
        assert!(config.apps[0].config.no_recreate_pods);
        assert_eq!(config.apps[1].config.team, "api-team");
        assert!(config.apps[1].config.no_recreate_pods);
    }

    #[test]
    fn test_empty_config_file() {
        let config = MhConfigFile::from_yaml("").unwrap();
        assert!(config.apps.is_empty());
        assert_eq!(config.mh, MhConfig::empty());
    }

    #[test]
    fn test_all_apps_without_filters() {
        let (dir, config) = fixture();
        let apps = config
            .effective_apps(&dir.path().join("mh.yaml"), &[], &MhConfig::default())
            .unwrap();

        let ids: Vec<&str> = apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["foo", "frontend", "pinned"]);
        assert_eq!(apps[0].file, dir.path().join("apps/foo.yaml"));
        assert_eq!(apps[2].file, Path::new("/srv/pinned.yaml"));
        assert_eq!(apps[1].config.team, "web-team");
    }

    #[test]
    fn test_filters_keep_declaration_order() {
        let (dir, config) = fixture();
        let filters = vec!["frontend".to_string(), "foo".to_string()];
        let apps = config
            .effective_apps(&dir.path().join("mh.yaml"), &filters, &MhConfig::default())
            .unwrap();

        let ids: Vec<&str> = apps.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["foo", "frontend"]);
    }

    #[test]
    fn test_unknown_filter() {
        let (dir, config) = fixture();
        let err = config
            .effective_apps(
                &dir.path().join("mh.yaml"),
                &["fronted".to_string()],
                &MhConfig::default(),
            )
            .unwrap_err();

        match err {
            CoreError::AppNotFound { name, suggestion } => {
                assert_eq!(name, "fronted");
                assert_eq!(suggestion.as_deref(), Some("frontend"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_app_missing_from_sources() {
        let (dir, mut config) = fixture();
        config.apps.push(AppSpec::named("bar"));

        let err = config
            .effective_apps(
                &dir.path().join("mh.yaml"),
                &["bar".to_string()],
                &MhConfig::default(),
            )
            .unwrap_err();

        assert!(matches!(err, CoreError::AppFileNotFound { ref name, ref sources }
            if name == "bar" && sources == &["local".to_string()]));
    }
}
