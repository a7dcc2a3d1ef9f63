//! # dmn-core
//!
//! Types shared across the dmn audit crates:
//!
//! - [`DmnConfig`] and its sections, loaded from YAML
//! - [`HitPolicy`], the canonical decision-table hit-policy tags

// Configuration types shared across all dmn crates
pub mod config;
pub mod hit_policy;

pub use config::{AuditConfig, ConfigError, DmnConfig, HistoryConfig};
pub use hit_policy::{HitPolicy, UnknownHitPolicy};
