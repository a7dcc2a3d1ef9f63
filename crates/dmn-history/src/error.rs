//! Error types for history job handling.

use thiserror::Error;

/// Errors raised by history job stores and commands.
///
/// Store errors abort the enclosing command; the caller owns the transaction
/// and decides whether to roll back. Nothing here is retried locally.
#[derive(Debug, Error)]
pub enum JobError {
    /// The backing store rejected an operation.
    #[error("history job store error for job '{job_id}': {message}")]
    Store { job_id: String, message: String },

    /// Failed to acquire the store lock.
    #[error("failed to acquire history job store lock")]
    LockError,

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl JobError {
    /// Create a store error for a job.
    pub fn store(job_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store {
            job_id: job_id.into(),
            message: message.into(),
        }
    }
}
