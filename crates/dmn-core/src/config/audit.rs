//! Decision audit configuration.

use serde::{Deserialize, Serialize};

/// Configuration for decision execution auditing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audits are produced at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Reject hit-policy tags that are not canonical short names at audit begin.
    #[serde(default)]
    pub validate_hit_policy: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            validate_hit_policy: false,
        }
    }
}

fn default_enabled() -> bool {
    true
}
