//! Per-run state shared by every command

use mh_core::{App, MhConfig, merge_configs};
use mh_engine::{MainConfig, SelfRenderer};
use std::path::Path;

use crate::error::Result;

/// The self-rendered config, the effective configuration and the selected apps
pub struct Session {
    pub main: MainConfig,
    pub effective: MhConfig,
    pub apps: Vec<App>,
}

impl Session {
    /// Load `config_path` and select the apps matching `filters`
    ///
    /// Layers merge as defaults, then the file's `mh` block, then `cli`.
    pub fn load(config_path: &Path, cli: &MhConfig, filters: &[String]) -> Result<Self> {
        let renderer = SelfRenderer::new().for_file(config_path);
        let main = MainConfig::load(config_path, &renderer)?;

        let effective = merge_configs(&[MhConfig::default(), main.file.mh.clone(), cli.clone()])?;
        tracing::debug!(?effective, config = %config_path.display(), "Effective configuration");

        let apps = main.file.effective_apps(config_path, filters, &effective)?;

        Ok(Self {
            main,
            effective,
            apps,
        })
    }
}
