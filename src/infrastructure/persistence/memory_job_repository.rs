use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{ArtifactPaths, Job, JobId, JobStatus, Segment};

/// Default store: a map under one mutex. Every reducer validates the
/// transition and writes while holding the lock, which gives the
/// per-job linearizability the worker pool relies on.
pub struct MemoryJobRepository {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl MemoryJobRepository {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().expect("job store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn transition<F>(
        &self,
        id: JobId,
        to: JobStatus,
        apply: F,
    ) -> Result<Option<Job>, RepositoryError>
    where
        F: FnOnce(&mut Job),
    {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        let job = jobs.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;

        // Repeating the current status writes nothing; the None signals
        // callers to skip transition side effects.
        if job.status == to {
            return Ok(None);
        }
        if !job.status.allows(to) {
            return Err(RepositoryError::InvalidTransition {
                from: job.status,
                to,
            });
        }

        apply(job);
        Ok(Some(job.clone()))
    }
}

impl Default for MemoryJobRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobRepository for MemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.lock().expect("job store lock poisoned");
        if jobs.contains_key(&job.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "job already exists: {}",
                job.id
            )));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let jobs = self.jobs.lock().expect("job store lock poisoned");
        Ok(jobs.get(&id).cloned())
    }

    async fn mark_running(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        self.transition(id, JobStatus::Running, |job| job.mark_running())
    }

    async fn mark_complete(
        &self,
        id: JobId,
        transcript: &str,
        segments: &[Segment],
        artifacts: Option<ArtifactPaths>,
    ) -> Result<Option<Job>, RepositoryError> {
        self.transition(id, JobStatus::Complete, |job| {
            job.mark_complete(transcript.to_string(), segments.to_vec(), artifacts)
        })
    }

    async fn mark_error(&self, id: JobId, message: &str) -> Result<Option<Job>, RepositoryError> {
        self.transition(id, JobStatus::Error, |job| job.mark_error(message))
    }
}
