//! `dmn reset-expired-jobs` command implementation.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use dmn_core::DmnConfig;
use dmn_history::{Command, InMemoryCommandContext, InMemoryHistoryJobStore, ResetExpiredHistoryJobsCmd};
use std::path::Path;
use std::sync::Arc;

/// Reset the given jobs (plus every expired one with `expired`) in a JSON
/// Lines job store and write the store back.
pub async fn run(
    config: &DmnConfig,
    store_path: &Path,
    expired: bool,
    mut job_ids: Vec<String>,
) -> Result<()> {
    let store = Arc::new(
        InMemoryHistoryJobStore::load(store_path)
            .with_context(|| format!("cannot load job store {}", store_path.display()))?,
    );

    if expired {
        for id in store.find_expired_job_ids(Utc::now())? {
            if !job_ids.contains(&id) {
                job_ids.push(id);
            }
        }
    }
    if job_ids.is_empty() {
        if expired {
            tracing::info!("No expired history jobs");
            return Ok(());
        }
        bail!("no job IDs given; pass IDs or --expired");
    }

    let ctx = InMemoryCommandContext::new(store.clone(), config.history.clone());
    ResetExpiredHistoryJobsCmd::new(job_ids).execute(&ctx).await?;

    store
        .save(store_path)
        .with_context(|| format!("cannot write job store {}", store_path.display()))?;
    Ok(())
}
