//! Collaborator interfaces available to commands.
//!
//! A [`CommandContext`] represents one caller-managed transaction. It hands
//! out the stores a command needs; commands never own connections.

use async_trait::async_trait;
use dmn_core::HistoryConfig;

use crate::error::JobError;
use crate::job::HistoryJob;

/// Persistence operations on history job records.
#[async_trait]
pub trait HistoryJobEntityManager: Send + Sync {
    /// Load a job by ID. Returns `None` for unknown IDs.
    async fn find_by_id(&self, job_id: &str) -> Result<Option<HistoryJob>, JobError>;

    /// Clear the server-side lock expiration of a job delivered through an
    /// external message queue. Unknown IDs are a no-op.
    async fn reset_expired_history_job(&self, job_id: &str) -> Result<(), JobError>;
}

/// Job scheduling operations.
#[async_trait]
pub trait JobManager: Send + Sync {
    /// Clear the claim on a job and return it to the ready pool.
    async fn unacquire(&self, job: &HistoryJob) -> Result<(), JobError>;
}

/// Transactional context a command executes in.
pub trait CommandContext: Send + Sync {
    fn history_job_entity_manager(&self) -> &dyn HistoryJobEntityManager;

    fn job_manager(&self) -> &dyn JobManager;

    fn engine_configuration(&self) -> &HistoryConfig;
}

/// A unit of work executed inside a [`CommandContext`].
#[async_trait]
pub trait Command: Send + Sync {
    type Output: Send;

    async fn execute(&self, ctx: &dyn CommandContext) -> Result<Self::Output, JobError>;
}
