//! helm and kubectl invocation
//!
//! Argument vectors are built by pure functions; only `run` and
//! `current_context` touch the outside world.

use mh_engine::RenderedApp;
use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{CliError, Result};

const HELM: &str = "helm";
const KUBECTL: &str = "kubectl";

/// `helm upgrade` arguments for a rendered app, reading values from stdin
pub fn upgrade_args(rendered: &RenderedApp, simulate: bool) -> Vec<String> {
    let app = &rendered.app;
    let mut args = vec!["upgrade".to_string(), app.id.clone(), rendered.chart.clone()];

    if let Some(version) = &rendered.version {
        args.extend(["--version".to_string(), version.clone()]);
    }
    if simulate {
        args.extend(["--debug".to_string(), "--dry-run".to_string()]);
    }
    args.extend(["--force".to_string(), "--install".to_string()]);
    if !app.config.no_recreate_pods {
        args.push("--recreate-pods".to_string());
    }
    if let Some(namespace) = &app.namespace {
        args.extend(["--namespace".to_string(), namespace.clone()]);
    }
    args.extend(["--values".to_string(), "-".to_string()]);

    args
}

pub fn delete_args(id: &str, purge: bool) -> Vec<String> {
    let mut args = vec!["delete".to_string(), id.to_string()];
    if purge {
        args.push("--purge".to_string());
    }
    args
}

pub fn status_args(id: &str) -> Vec<String> {
    vec!["status".to_string(), id.to_string()]
}

/// Run helm with inherited stdout/stderr, optionally feeding `input` on stdin
pub fn run(args: &[String], input: Option<&[u8]>) -> Result<()> {
    let command = format!("{} {}", HELM, args.join(" "));
    tracing::info!(%command, "Running helm");

    let mut child = Command::new(HELM)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .spawn()
        .map_err(|e| CliError::external(&command, e.to_string()))?;

    if let (Some(bytes), Some(mut stdin)) = (input, child.stdin.take()) {
        stdin
            .write_all(bytes)
            .map_err(|e| CliError::external(&command, e.to_string()))?;
    }

    let status = child
        .wait()
        .map_err(|e| CliError::external(&command, e.to_string()))?;

    if !status.success() {
        return Err(CliError::external(command, status.to_string()));
    }
    Ok(())
}

/// The context kubectl currently points at
pub fn current_context() -> Result<String> {
    let output = Command::new(KUBECTL)
        .args(["config", "current-context"])
        .output()
        .map_err(|e| CliError::external("kubectl config current-context", e.to_string()))?;

    if !output.status.success() {
        return Err(CliError::external(
            "kubectl config current-context",
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

/// Refuse to act unless `current` is the configured target context
pub fn ensure_context(target: &str, current: &str) -> Result<()> {
    if target == current {
        tracing::debug!(context = %current, "Current context matches target");
        Ok(())
    } else {
        Err(CliError::ContextMismatch {
            current: current.to_string(),
            target: target.to_string(),
        })
    }
}
