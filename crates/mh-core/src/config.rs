//! mh configuration layers and their merge rules
//!
//! An effective configuration is built from several layers by rising
//! priority:
//!
//! 1. [`MhConfig::default`]
//! 2. the `mh` block of the configuration file
//! 3. `MH_*` environment variables and command line flags
//! 4. app-specific overrides embedded in each app entry
//!
//! A field only overrides the accumulated value when it is non-zero, so an
//! empty string, an empty list or `false` never masks a lower layer.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Options used while deploying apps
///
/// Deserialized layers start from [`MhConfig::empty`], so keys absent from a
/// file never override a lower layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default = "MhConfig::empty")]
pub struct MhConfig {
    pub maintainers: Vec<String>,
    pub print_rendered: bool,
    pub no_recreate_pods: bool,
    pub simulate: bool,
    pub target_context: String,
    pub team: String,
    /// Ad-hoc `key=value` overrides applied to the config values before rendering
    pub set: Vec<String>,
}

impl Default for MhConfig {
    fn default() -> Self {
        Self {
            maintainers: vec!["none".to_string()],
            print_rendered: false,
            no_recreate_pods: false,
            simulate: false,
            target_context: "localhost".to_string(),
            team: "sre".to_string(),
            set: Vec::new(),
        }
    }
}

impl MhConfig {
    /// A layer with every field at its zero value
    pub fn empty() -> Self {
        Self {
            maintainers: Vec::new(),
            print_rendered: false,
            no_recreate_pods: false,
            simulate: false,
            target_context: String::new(),
            team: String::new(),
            set: Vec::new(),
        }
    }

    /// Overlay the non-zero fields of `layer` onto `self`
    pub fn overlay(&mut self, layer: &MhConfig) {
        if !layer.maintainers.is_empty() {
            self.maintainers = layer.maintainers.clone();
        }
        if layer.print_rendered {
            self.print_rendered = true;
        }
        if layer.no_recreate_pods {
            self.no_recreate_pods = true;
        }
        if layer.simulate {
            self.simulate = true;
        }
        if !layer.target_context.is_empty() {
            self.target_context = layer.target_context.clone();
        }
        if !layer.team.is_empty() {
            self.team = layer.team.clone();
        }
        if !layer.set.is_empty() {
            self.set = layer.set.clone();
        }
    }
}

/// Merge configuration layers, highest priority last
pub fn merge_configs(layers: &[MhConfig]) -> Result<MhConfig> {
    if layers.len() < 2 {
        return Err(CoreError::config(format!(
            "can't merge less than two configs (got {})",
            layers.len()
        )));
    }

    let mut result = MhConfig::empty();
    for layer in layers {
        result.overlay(layer);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(name: &str) -> MhConfig {
        MhConfig {
            team: name.to_string(),
            ..MhConfig::empty()
        }
    }

    #[test]
    fn test_later_layer_wins() {
        let merged = merge_configs(&[team("sre"), team(""), team("x")]).unwrap();
        assert_eq!(merged.team, "x");
    }

    #[test]
    fn test_empty_layers_never_overwrite() {
        let merged =
            merge_configs(&[MhConfig::default(), MhConfig::empty(), MhConfig::empty()]).unwrap();
        assert_eq!(merged, MhConfig::default());
        assert_eq!(merged.team, "sre");
        assert_eq!(merged.target_context, "localhost");
    }

    #[test]
    fn test_lists_replaced_wholesale() {
        let file = MhConfig {
            maintainers: vec!["alice".to_string(), "bob".to_string()],
            set: vec!["a=1".to_string()],
            ..MhConfig::empty()
        };
        let cli = MhConfig {
            set: vec!["b=2".to_string()],
            ..MhConfig::empty()
        };

        let merged = merge_configs(&[MhConfig::default(), file, cli]).unwrap();

        assert_eq!(merged.maintainers, vec!["alice", "bob"]);
        assert_eq!(merged.set, vec!["b=2"]);
    }

    #[test]
    fn test_flags_only_turn_on() {
        let on = MhConfig {
            print_rendered: true,
            ..MhConfig::empty()
        };
        let merged = merge_configs(&[MhConfig::default(), on, MhConfig::empty()]).unwrap();
        assert!(merged.print_rendered);
        assert!(!merged.simulate);
    }

    #[test]
    fn test_requires_two_layers() {
        assert!(matches!(
            merge_configs(&[MhConfig::default()]),
            Err(CoreError::Config { .. })
        ));
        assert!(merge_configs(&[]).is_err());
    }

    #[test]
    fn test_deserialize_partial_block() {
        let config: MhConfig = serde_yaml::from_str("team: platform\nnoRecreatePods: true\n").unwrap();
        assert_eq!(config.team, "platform");
        assert!(config.no_recreate_pods);
        assert!(config.target_context.is_empty());
        assert!(config.maintainers.is_empty());
    }
}
