//! Application configuration.
//!
//! One YAML document with a section per component. Every section defaults, so
//! an empty file (or none at all) is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use variant_bridge::{BridgeConfig, HostSettings};
use variant_preview::PreviewPolicy;
use variant_selector::{SelectorError, SelectorPolicy};

pub const ENV_SOURCE_TAG: &str = "VARIANT_STUDIO_SOURCE_TAG";
pub const ENV_MAX_ANCESTOR_DEPTH: &str = "VARIANT_STUDIO_MAX_ANCESTOR_DEPTH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("selector policy: {0}")]
    Selector(#[from] SelectorError),
    #[error("bridge.source_tag must not be empty")]
    EmptySourceTag,
    #[error("{var}={value:?} is not a valid override")]
    InvalidOverride { var: &'static str, value: String },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub selector: SelectorPolicy,
    pub preview: PreviewPolicy,
    pub bridge: BridgeConfig,
    /// Where commands write their artifacts when asked to.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            selector: SelectorPolicy::default(),
            preview: PreviewPolicy::default(),
            bridge: BridgeConfig::default(),
            output_dir: PathBuf::from("./output"),
        }
    }
}

impl Config {
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.selector.validate()?;
        if self.bridge.source_tag.trim().is_empty() {
            return Err(ConfigError::EmptySourceTag);
        }
        Ok(())
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<Vec<&'static str>, ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup; returns the variables that were set.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<Vec<&'static str>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();

        if let Some(tag) = lookup(ENV_SOURCE_TAG) {
            let tag = tag.trim();
            if tag.is_empty() {
                return Err(ConfigError::InvalidOverride {
                    var: ENV_SOURCE_TAG,
                    value: tag.to_string(),
                });
            }
            self.bridge.source_tag = tag.to_string();
            applied.push(ENV_SOURCE_TAG);
        }

        if let Some(raw) = lookup(ENV_MAX_ANCESTOR_DEPTH) {
            let depth = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidOverride {
                    var: ENV_MAX_ANCESTOR_DEPTH,
                    value: raw.clone(),
                })?;
            self.selector.max_ancestor_depth = depth;
            applied.push(ENV_MAX_ANCESTOR_DEPTH);
        }

        for var in &applied {
            info!(var = *var, "applied environment override");
        }
        Ok(applied)
    }

    pub fn host_settings(&self) -> HostSettings {
        HostSettings {
            selector: self.selector.clone(),
            preview: self.preview.clone(),
            bridge: self.bridge.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_section_defaults() {
        let config = Config::from_yaml_str("selector:\n  max_ancestor_depth: 3\n").unwrap();
        assert_eq!(config.selector.max_ancestor_depth, 3);
        assert_eq!(config.selector.reserved_prefix, SelectorPolicy::default().reserved_prefix);
        assert_eq!(config.bridge, BridgeConfig::default());
        assert!(config.preview.sanitize_html);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::from_yaml_str("  \n").unwrap(), Config::default());
        Config::default().validate().unwrap();
    }

    #[test]
    fn overrides_are_applied_and_checked() {
        let env: HashMap<&str, &str> = [(ENV_SOURCE_TAG, "lab"), (ENV_MAX_ANCESTOR_DEPTH, "4")]
            .into_iter()
            .collect();
        let mut config = Config::default();
        let applied = config
            .apply_overrides_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(applied, vec![ENV_SOURCE_TAG, ENV_MAX_ANCESTOR_DEPTH]);
        assert_eq!(config.bridge.source_tag, "lab");
        assert_eq!(config.selector.max_ancestor_depth, 4);

        let err = Config::default()
            .apply_overrides_from(|key| (key == ENV_MAX_ANCESTOR_DEPTH).then(|| "deep".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { .. }));
    }

    #[test]
    fn blank_source_tag_fails_validation() {
        let mut config = Config::default();
        config.bridge.source_tag = " ".into();
        assert!(matches!(config.validate(), Err(ConfigError::EmptySourceTag)));
    }
}
