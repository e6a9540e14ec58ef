//! Shared utility functions for CLI commands

use std::path::PathBuf;

/// File name of the configuration looked up in the home directory
pub const DEFAULT_CONFIG_NAME: &str = ".mh.yaml";

/// `--config` when given, else `$HOME/.mh.yaml`
#[must_use]
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_CONFIG_NAME)
    })
}
