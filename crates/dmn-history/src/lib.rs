//! # dmn-history
//!
//! History jobs persist decision audits asynchronously. When the worker that
//! claimed a job stops making progress, [`ResetExpiredHistoryJobsCmd`] returns
//! the job to the pool so another worker can pick it up.
//!
//! The recovery strategy follows the configured dispatch mode
//! (`history.async_history_executor_message_queue_mode`):
//!
//! - in-process queue: [`LocalQueueRecovery`] unacquires the job
//! - message queue: [`MessageQueueRecovery`] clears the lock expiration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dmn_core::HistoryConfig;
//! use dmn_history::{Command, InMemoryCommandContext, InMemoryHistoryJobStore, ResetExpiredHistoryJobsCmd};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), dmn_history::JobError> {
//! let store = Arc::new(InMemoryHistoryJobStore::load("jobs.jsonl")?);
//! let ctx = InMemoryCommandContext::new(store.clone(), HistoryConfig::default());
//!
//! ResetExpiredHistoryJobsCmd::new(["job-1", "job-2"]).execute(&ctx).await?;
//! store.save("jobs.jsonl")?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod job;
pub mod recovery;
pub mod reset_expired;
pub mod store;

pub use context::{Command, CommandContext, HistoryJobEntityManager, JobManager};
pub use error::JobError;
pub use job::HistoryJob;
pub use recovery::{
    ExpiredJobRecovery, LocalQueueRecovery, MessageQueueRecovery, RecoveryOutcome, recovery_for,
};
pub use reset_expired::ResetExpiredHistoryJobsCmd;
pub use store::{InMemoryCommandContext, InMemoryHistoryJobStore};
