//! Decision-table hit policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Standard decision-table hit policy.
///
/// Serialized as its canonical short name (`"UNIQUE"`, `"RULE ORDER"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitPolicy {
    /// Exactly one rule may match.
    #[serde(rename = "UNIQUE")]
    Unique,
    /// The first matching rule in table order wins.
    #[serde(rename = "FIRST")]
    First,
    /// The matching rule with the highest output priority wins.
    #[serde(rename = "PRIORITY")]
    Priority,
    /// Several rules may match as long as their outputs agree.
    #[serde(rename = "ANY")]
    Any,
    /// All matching rules contribute, optionally aggregated.
    #[serde(rename = "COLLECT")]
    Collect,
    /// All matching rules in table order.
    #[serde(rename = "RULE ORDER")]
    RuleOrder,
    /// All matching rules ordered by output priority.
    #[serde(rename = "OUTPUT ORDER")]
    OutputOrder,
}

impl HitPolicy {
    /// Every hit policy, in declaration order.
    pub const ALL: [HitPolicy; 7] = [
        HitPolicy::Unique,
        HitPolicy::First,
        HitPolicy::Priority,
        HitPolicy::Any,
        HitPolicy::Collect,
        HitPolicy::RuleOrder,
        HitPolicy::OutputOrder,
    ];

    /// Canonical short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unique => "UNIQUE",
            Self::First => "FIRST",
            Self::Priority => "PRIORITY",
            Self::Any => "ANY",
            Self::Collect => "COLLECT",
            Self::RuleOrder => "RULE ORDER",
            Self::OutputOrder => "OUTPUT ORDER",
        }
    }
}

impl fmt::Display for HitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HitPolicy> for String {
    fn from(policy: HitPolicy) -> Self {
        policy.as_str().to_string()
    }
}

/// Returned when a tag is not one of the canonical hit-policy names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hit policy: '{0}'")]
pub struct UnknownHitPolicy(pub String);

impl FromStr for HitPolicy {
    type Err = UnknownHitPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HitPolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| UnknownHitPolicy(s.to_string()))
    }
}
