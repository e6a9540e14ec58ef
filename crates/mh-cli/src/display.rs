//! Display formatting for CLI output

use console::style;
use mh_engine::RenderedApp;
use serde::Serialize;

/// Machine-readable form of a rendered app
#[derive(Debug, Serialize)]
pub struct RenderedAppJson<'a> {
    pub app: &'a str,
    pub chart: &'a str,
    pub version: Option<&'a str>,
    pub namespace: Option<&'a str>,
    pub local_chart: bool,
    pub overrides: &'a serde_json::Value,
}

impl<'a> From<&'a RenderedApp> for RenderedAppJson<'a> {
    fn from(rendered: &'a RenderedApp) -> Self {
        Self {
            app: &rendered.app.id,
            chart: &rendered.chart,
            version: rendered.version.as_deref(),
            namespace: rendered.app.namespace.as_deref(),
            local_chart: rendered.is_local_chart(),
            overrides: &rendered.values,
        }
    }
}

/// One YAML document per app, headed by a comment naming app, chart and version
pub fn rendered_yaml(rendered: &[RenderedApp]) -> String {
    let mut out = String::new();
    for app in rendered {
        out.push_str("---\n");
        out.push_str(&format!(
            "# app: {}, chart: {}, version: {}\n",
            app.app.id,
            app.chart,
            app.version.as_deref().unwrap_or("latest")
        ));
        out.push_str(app.overrides.trim_start_matches('\n'));
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

pub fn rendered_json(rendered: &[RenderedApp]) -> serde_json::Result<String> {
    let items: Vec<RenderedAppJson<'_>> = rendered.iter().map(RenderedAppJson::from).collect();
    serde_json::to_string_pretty(&items)
}

/// Progress line on stderr, kept off stdout so rendered output stays parseable
pub fn step(action: &str, app: &str) {
    eprintln!(
        "{} {} {}",
        style("→").blue().bold(),
        action,
        style(app).cyan()
    );
}

pub fn done(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mh_core::{App, AppFile, AppSpec, MhConfig};
    use std::path::PathBuf;

    fn rendered(id: &str, overrides: &str, version: Option<&str>) -> RenderedApp {
        let spec = AppSpec {
            file: Some(AppFile {
                path: PathBuf::from(format!("apps/{id}.yaml")),
            }),
            ..AppSpec::named(id)
        };
        RenderedApp {
            app: App::new(spec, &MhConfig::default()).unwrap(),
            overrides: overrides.to_string(),
            values: serde_yaml::from_str(overrides).unwrap(),
            chart: "stable/web".to_string(),
            version: version.map(str::to_string),
        }
    }

    #[test]
    fn test_rendered_yaml() {
        let out = rendered_yaml(&[
            rendered("web", "\nchart: stable/web\nreplicas: 2\n", Some("1.0.0")),
            rendered("api", "chart: stable/web", None),
        ]);
        insta::assert_snapshot!(out.trim_end(), @r"
        ---
        # app: web, chart: stable/web, version: 1.0.0
        chart: stable/web
        replicas: 2
        ---
        # app: api, chart: stable/web, version: latest
        chart: stable/web
        ");
    }

    #[test]
    fn test_rendered_json() {
        let out = rendered_json(&[rendered("web", "chart: stable/web\n", None)]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["app"], "web");
        assert_eq!(parsed[0]["local_chart"], false);
        assert_eq!(parsed[0]["overrides"]["chart"], "stable/web");
        assert!(parsed[0]["version"].is_null());
    }
}
