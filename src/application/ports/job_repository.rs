use async_trait::async_trait;

use crate::domain::{ArtifactPaths, Job, JobId, JobStatus, Segment};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(JobId),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("InvalidTransition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

/// Exclusive owner of persisted job records. Implementations must be
/// linearizable per job id: every reducer reads, validates, and writes
/// under the same lock. A reducer returns the updated job, or `None`
/// when the job is already in the target status: nothing is written and
/// callers must not emit transition side effects. Backward moves fail
/// with `InvalidTransition`.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Persist a new job. The write must be durable before the job is
    /// published for dispatch.
    async fn create(&self, job: &Job) -> Result<(), RepositoryError>;

    async fn get(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    async fn mark_running(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    async fn mark_complete(
        &self,
        id: JobId,
        transcript: &str,
        segments: &[Segment],
        artifacts: Option<ArtifactPaths>,
    ) -> Result<Option<Job>, RepositoryError>;

    async fn mark_error(&self, id: JobId, message: &str) -> Result<Option<Job>, RepositoryError>;
}
