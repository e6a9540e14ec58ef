//! Integration tests for CLI commands

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run mh with a clean MH_* environment
fn mh(args: &[&str]) -> std::process::Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_mh"));
    for (key, _) in std::env::vars() {
        if key.starts_with("MH_") {
            command.env_remove(key);
        }
    }
    command
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("Failed to execute mh")
}

const CONFIG: &str = r#"selfRender:
  datasources:
    - site=site.yaml
mh:
  team: platform
appSources:
  - kind: configPath
    name: local
    source: /apps
apps:
  - name: app-one
    alias: a1
    namespace: one
  - name: app-two
global:
  region: '[[ datasource("site").region ]]'
  domain: '[[ .global.region ]].example.com'
a1:
  replicas: 2
appTwo:
  replicas: 5
"#;

const TEMPLATE: &str = r#"chart: stable/common
version: "1.0.0"
fullname: {{ name }}
host: {{ name }}.{{ global.domain }}
replicas: {{ app.replicas }}
foo: {{ foo | default("unset") }}
"#;

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("apps")).unwrap();
    fs::write(dir.path().join("apps/app-one.yaml"), TEMPLATE).unwrap();
    fs::write(dir.path().join("apps/app-two.yaml"), TEMPLATE).unwrap();
    fs::write(dir.path().join("site.yaml"), "region: eu\n").unwrap();
    fs::write(dir.path().join("mh.yaml"), CONFIG).unwrap();
    dir
}

fn config_arg(dir: &Path) -> String {
    dir.join("mh.yaml").to_string_lossy().into_owned()
}

mod render_command {
    use super::*;

    #[test]
    fn test_render_all_apps() {
        let dir = fixture();
        let output = mh(&["render", "--config", &config_arg(dir.path())]);

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("# app: a1, chart: stable/common, version: 1.0.0"));
        assert!(stdout.contains("host: a1.eu.example.com"));
        assert!(stdout.contains("# app: app-two"));
        assert!(stdout.contains("replicas: 5"));
    }

    #[test]
    fn test_render_json_with_set() {
        let dir = fixture();
        let output = mh(&[
            "render",
            "a1",
            "--json",
            "--set",
            "foo=bar",
            "--config",
            &config_arg(dir.path()),
        ]);

        assert!(output.status.success());
        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");

        let apps = json.as_array().unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0]["app"], "a1");
        assert_eq!(apps[0]["namespace"], "one");
        assert_eq!(apps[0]["overrides"]["foo"], "bar");
        assert_eq!(apps[0]["overrides"]["replicas"], 2);
    }

    #[test]
    fn test_config_from_env() {
        let dir = fixture();
        let output = Command::new(env!("CARGO_BIN_EXE_mh"))
            .env("MH_CONFIG", dir.path().join("mh.yaml"))
            .env("RUST_LOG", "warn")
            .args(["render", "app-two"])
            .output()
            .unwrap();

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("fullname: app-two"));
    }
}

mod errors {
    use super::*;

    #[test]
    fn test_unknown_app_suggests_name() {
        let dir = fixture();
        let output = mh(&["render", "app-tow", "--config", &config_arg(dir.path())]);

        assert_eq!(output.status.code(), Some(4));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("app-tow"));
        assert!(stderr.contains("app-two"));
    }

    #[test]
    fn test_template_error_names_app() {
        let dir = fixture();
        fs::write(dir.path().join("apps/app-two.yaml"), "chart: {{ app.missing }}\n").unwrap();

        let output = mh(&["render", "app-two", "--config", &config_arg(dir.path())]);

        assert_eq!(output.status.code(), Some(3));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("app-two"));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let output = mh(&[
            "render",
            "--config",
            &dir.path().join("absent.yaml").to_string_lossy(),
        ]);

        assert_eq!(output.status.code(), Some(5));
    }

    #[test]
    fn test_bad_set_value() {
        let dir = fixture();
        let output = mh(&["render", "--set", "novalue", "--config", &config_arg(dir.path())]);

        assert_eq!(output.status.code(), Some(2));
    }
}
