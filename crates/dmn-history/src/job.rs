//! History job records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A deferred unit of work that persists history (such as a decision audit)
/// asynchronously.
///
/// A worker claims a job by setting `lock_owner` and `lock_expiration_time`.
/// A claim whose expiration lies in the past belongs to a worker that stopped
/// making progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryJob {
    /// Unique job ID.
    pub id: String,
    /// Handler that processes the job payload.
    pub job_handler_type: String,
    /// Handler-specific payload (for example a serialized audit).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_handler_configuration: Option<String>,
    /// Worker currently holding the claim.
    #[serde(default)]
    pub lock_owner: Option<String>,
    /// When the current claim expires.
    #[serde(default)]
    pub lock_expiration_time: Option<DateTime<Utc>>,
    /// Remaining attempts.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// When the job was created.
    pub create_time: DateTime<Utc>,
    /// Last failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
}

impl HistoryJob {
    /// Create an unclaimed job.
    pub fn new(id: impl Into<String>, job_handler_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            job_handler_type: job_handler_type.into(),
            job_handler_configuration: None,
            lock_owner: None,
            lock_expiration_time: None,
            retries: default_retries(),
            create_time: Utc::now(),
            exception_message: None,
        }
    }

    /// Claim the job for a worker until `expires_at`.
    pub fn acquire(&mut self, owner: impl Into<String>, expires_at: DateTime<Utc>) {
        self.lock_owner = Some(owner.into());
        self.lock_expiration_time = Some(expires_at);
    }

    /// Drop the claim entirely, returning the job to the ready pool.
    pub fn release(&mut self) {
        self.lock_owner = None;
        self.lock_expiration_time = None;
    }

    /// Whether a worker holds a claim.
    pub fn is_acquired(&self) -> bool {
        self.lock_owner.is_some() || self.lock_expiration_time.is_some()
    }

    /// Whether the claim has expired at `now`.
    pub fn is_lock_expired(&self, now: DateTime<Utc>) -> bool {
        self.lock_expiration_time
            .is_some_and(|expires_at| expires_at <= now)
    }
}

fn default_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_acquire_and_release() {
        let mut job = HistoryJob::new("job-1", "decision-audit");
        assert!(!job.is_acquired());

        let now = Utc::now();
        job.acquire("worker-a", now + Duration::minutes(5));
        assert!(job.is_acquired());
        assert!(!job.is_lock_expired(now));
        assert!(job.is_lock_expired(now + Duration::minutes(6)));

        job.release();
        assert!(!job.is_acquired());
        assert!(!job.is_lock_expired(now + Duration::minutes(6)));
    }

    #[test]
    fn test_deserialize_minimal() {
        let job: HistoryJob = serde_json::from_str(
            r#"{"id":"j1","job_handler_type":"decision-audit","create_time":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(job.retries, 3);
        assert!(job.lock_owner.is_none());
    }
}
