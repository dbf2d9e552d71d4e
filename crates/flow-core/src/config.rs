//! Runtime switches for command nodes, loaded from YAML.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Node configuration, passed explicitly to every node at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Veto dispatch for alerted subjects unless the node forces execution.
    #[serde(default = "default_alertness_check")]
    pub alertness_check: bool,

    /// When off, vehicle entry always skips the transition animation.
    #[serde(default = "default_transition_animations")]
    pub transition_animations: bool,
}

fn default_alertness_check() -> bool {
    true
}
fn default_transition_animations() -> bool {
    true
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            alertness_check: default_alertness_check(),
            transition_animations: default_transition_animations(),
        }
    }
}

impl FlowConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}
