//! CLI command implementations for the dmn tools.

pub mod inspect;
pub mod record;
pub mod reset_jobs;
