//! Configuration types for the dmn audit workspace.
//!
//! Configuration is loaded from a single YAML file (`dmn.yaml`). Every section
//! is optional and falls back to its `Default`.
//!
//! ```yaml
//! project: loans
//! audit:
//!   enabled: true
//!   validate_hit_policy: true
//! history:
//!   async_history_executor_message_queue_mode: false
//! ```

pub mod audit;
pub mod history;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use audit::AuditConfig;
pub use history::HistoryConfig;

/// Complete configuration loaded from `dmn.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DmnConfig {
    /// Project name.
    #[serde(default)]
    pub project: Option<String>,

    /// Decision audit settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Async history executor settings.
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DmnConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }
}
