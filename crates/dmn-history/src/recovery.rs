//! Recovery strategies for expired history jobs.
//!
//! Which strategy applies depends on how history jobs are dispatched:
//!
//! | Mode | Strategy | Effect |
//! |------|----------|--------|
//! | in-process queue | [`LocalQueueRecovery`] | load the job and unacquire it |
//! | message queue | [`MessageQueueRecovery`] | clear the lock expiration only |
//!
//! In message-queue mode the message itself lives in the broker, which
//! redelivers it after its own timeout.

use async_trait::async_trait;
use dmn_core::HistoryConfig;

use crate::context::CommandContext;
use crate::error::JobError;

/// What recovery did for one job ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// The claim was cleared and the job returned to the ready pool.
    Released,
    /// The server-side lock expiration was cleared.
    Reset,
    /// No job exists for the ID.
    Skipped,
}

/// Returns one stuck job to a claimable state.
///
/// Implementations must be idempotent per job ID.
#[async_trait]
pub trait ExpiredJobRecovery: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &'static str;

    async fn recover(
        &self,
        ctx: &dyn CommandContext,
        job_id: &str,
    ) -> Result<RecoveryOutcome, JobError>;
}

/// Pick the strategy matching the configured dispatch mode.
pub fn recovery_for(config: &HistoryConfig) -> Box<dyn ExpiredJobRecovery> {
    if config.is_async_history_executor_message_queue_mode() {
        Box::new(MessageQueueRecovery)
    } else {
        Box::new(LocalQueueRecovery)
    }
}

/// In-process queue: load the job and unacquire it.
///
/// An ID with no job behind it is skipped with a warning; another worker may
/// already have completed and deleted it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalQueueRecovery;

#[async_trait]
impl ExpiredJobRecovery for LocalQueueRecovery {
    fn name(&self) -> &'static str {
        "local-queue"
    }

    async fn recover(
        &self,
        ctx: &dyn CommandContext,
        job_id: &str,
    ) -> Result<RecoveryOutcome, JobError> {
        let Some(job) = ctx.history_job_entity_manager().find_by_id(job_id).await? else {
            tracing::warn!(job_id, "Expired history job not found; skipping");
            return Ok(RecoveryOutcome::Skipped);
        };

        ctx.job_manager().unacquire(&job).await?;
        tracing::debug!(job_id, lock_owner = ?job.lock_owner, "Unacquired expired history job");
        Ok(RecoveryOutcome::Released)
    }
}

/// Message queue: clear the server-side lock expiration. No job lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageQueueRecovery;

#[async_trait]
impl ExpiredJobRecovery for MessageQueueRecovery {
    fn name(&self) -> &'static str {
        "message-queue"
    }

    async fn recover(
        &self,
        ctx: &dyn CommandContext,
        job_id: &str,
    ) -> Result<RecoveryOutcome, JobError> {
        ctx.history_job_entity_manager()
            .reset_expired_history_job(job_id)
            .await?;
        tracing::debug!(job_id, "Reset expired history job");
        Ok(RecoveryOutcome::Reset)
    }
}
