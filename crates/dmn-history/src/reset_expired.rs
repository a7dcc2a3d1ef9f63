//! Command that returns expired history jobs to the pool.

use async_trait::async_trait;

use crate::context::{Command, CommandContext};
use crate::error::JobError;
use crate::recovery::{RecoveryOutcome, recovery_for};

/// Reset history jobs that were claimed by a worker that stopped making
/// progress, so another worker can pick them up.
///
/// IDs are processed serially in the given order. Missing IDs are tolerated.
/// The first store error aborts the batch and is returned; jobs recovered
/// before it are not undone here, that is up to the enclosing transaction.
#[derive(Debug, Clone)]
pub struct ResetExpiredHistoryJobsCmd {
    job_ids: Vec<String>,
}

impl ResetExpiredHistoryJobsCmd {
    pub fn new<I, S>(job_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            job_ids: job_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn job_ids(&self) -> &[String] {
        &self.job_ids
    }
}

#[async_trait]
impl Command for ResetExpiredHistoryJobsCmd {
    type Output = ();

    async fn execute(&self, ctx: &dyn CommandContext) -> Result<(), JobError> {
        let recovery = recovery_for(ctx.engine_configuration());

        let mut recovered = 0usize;
        let mut skipped = 0usize;
        for job_id in &self.job_ids {
            match recovery.recover(ctx, job_id).await? {
                RecoveryOutcome::Skipped => skipped += 1,
                RecoveryOutcome::Released | RecoveryOutcome::Reset => recovered += 1,
            }
        }

        tracing::info!(
            mode = recovery.name(),
            requested = self.job_ids.len(),
            recovered,
            skipped,
            "Reset expired history jobs"
        );
        Ok(())
    }
}
