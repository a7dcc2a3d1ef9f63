//! In-memory history job store with JSON Lines persistence.
//!
//! Backs the `dmn reset-expired-jobs` command and tests. The file holds one
//! [`HistoryJob`] per line; blank lines are ignored and unparseable lines are
//! logged and skipped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dmn_core::HistoryConfig;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::context::{CommandContext, HistoryJobEntityManager, JobManager};
use crate::error::JobError;
use crate::job::HistoryJob;

/// History jobs keyed by ID.
#[derive(Debug, Default)]
pub struct InMemoryHistoryJobStore {
    jobs: RwLock<BTreeMap<String, HistoryJob>>,
}

impl InMemoryHistoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load jobs from a JSON Lines file. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, JobError> {
        let path = path.as_ref();
        let store = Self::new();
        if !path.exists() {
            return Ok(store);
        }

        let reader = BufReader::new(File::open(path)?);
        let mut loaded = 0usize;
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<HistoryJob>(line) {
                Ok(job) => {
                    store.insert(job)?;
                    loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse history job on line {} of {}: {}",
                        line_num + 1,
                        path.display(),
                        e
                    );
                }
            }
        }
        tracing::info!("Loaded {} history jobs from {}", loaded, path.display());

        Ok(store)
    }

    /// Write all jobs to a JSON Lines file, replacing its contents.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), JobError> {
        let jobs = self.jobs.read().map_err(|_| JobError::LockError)?;

        let mut content = String::new();
        for job in jobs.values() {
            content.push_str(&serde_json::to_string(job)?);
            content.push('\n');
        }

        let mut file = fs::File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Insert or replace a job.
    pub fn insert(&self, job: HistoryJob) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().map_err(|_| JobError::LockError)?;
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    pub fn get(&self, job_id: &str) -> Result<Option<HistoryJob>, JobError> {
        let jobs = self.jobs.read().map_err(|_| JobError::LockError)?;
        Ok(jobs.get(job_id).cloned())
    }

    pub fn len(&self) -> Result<usize, JobError> {
        let jobs = self.jobs.read().map_err(|_| JobError::LockError)?;
        Ok(jobs.len())
    }

    pub fn is_empty(&self) -> Result<bool, JobError> {
        Ok(self.len()? == 0)
    }

    /// IDs of jobs whose claim has expired at `now`, oldest first.
    pub fn find_expired_job_ids(&self, now: DateTime<Utc>) -> Result<Vec<String>, JobError> {
        let jobs = self.jobs.read().map_err(|_| JobError::LockError)?;
        let mut expired: Vec<&HistoryJob> =
            jobs.values().filter(|j| j.is_lock_expired(now)).collect();
        expired.sort_by_key(|j| j.lock_expiration_time);
        Ok(expired.into_iter().map(|j| j.id.clone()).collect())
    }
}

#[async_trait]
impl HistoryJobEntityManager for InMemoryHistoryJobStore {
    async fn find_by_id(&self, job_id: &str) -> Result<Option<HistoryJob>, JobError> {
        self.get(job_id)
    }

    async fn reset_expired_history_job(&self, job_id: &str) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().map_err(|_| JobError::LockError)?;
        if let Some(job) = jobs.get_mut(job_id) {
            job.lock_expiration_time = None;
        }
        Ok(())
    }
}

#[async_trait]
impl JobManager for InMemoryHistoryJobStore {
    async fn unacquire(&self, job: &HistoryJob) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().map_err(|_| JobError::LockError)?;
        if let Some(stored) = jobs.get_mut(&job.id) {
            stored.release();
        }
        Ok(())
    }
}

/// Command context over an [`InMemoryHistoryJobStore`].
pub struct InMemoryCommandContext {
    store: Arc<InMemoryHistoryJobStore>,
    config: HistoryConfig,
}

impl InMemoryCommandContext {
    pub fn new(store: Arc<InMemoryHistoryJobStore>, config: HistoryConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &InMemoryHistoryJobStore {
        &self.store
    }
}

impl CommandContext for InMemoryCommandContext {
    fn history_job_entity_manager(&self) -> &dyn HistoryJobEntityManager {
        self.store.as_ref()
    }

    fn job_manager(&self) -> &dyn JobManager {
        self.store.as_ref()
    }

    fn engine_configuration(&self) -> &HistoryConfig {
        &self.config
    }
}
