use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::application::ports::{JobRepository, MediaDownloader, MediaToolError, RepositoryError};
use crate::application::services::{PipelineError, PipelineRunner};
use crate::domain::{Job, JobId, Segment};

/// Message published to the job topic. The store write is durable before
/// this is sent; a redelivery that finds no record is dropped.
#[derive(Debug, Clone)]
pub struct JobMessage {
    pub job_id: JobId,
    pub source_url: String,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Sync {
        transcript: String,
        segments: Vec<Segment>,
    },
    Queued {
        job_id: JobId,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),
    /// Duration probe failures, surfaced before any job exists.
    #[error(transparent)]
    Probe(MediaToolError),
    /// Sync-path pipeline failure, surfaced directly to the caller.
    #[error(transparent)]
    Pipeline(PipelineError),
    #[error("Internal: {0}")]
    Internal(String),
}

impl From<RepositoryError> for SubmitError {
    fn from(e: RepositoryError) -> Self {
        SubmitError::Internal(e.to_string())
    }
}

/// Scheduling policy knobs, lifted from the process-wide settings.
#[derive(Debug, Clone)]
pub struct SchedulerPolicy {
    /// Probed durations at or under this run on the request thread.
    pub sync_threshold_seconds: u64,
    /// Probed durations strictly over this are rejected. Equal is
    /// accepted.
    pub max_video_length: Option<u64>,
    /// Advisory cap on total async jobs; passing it only logs.
    pub free_job_limit: Option<u64>,
}

/// Decides each submission's fate: inline transcription for short
/// sources, a persisted-then-published job for long ones.
pub struct TranscriptionService {
    downloader: Arc<dyn MediaDownloader>,
    pipeline: Arc<PipelineRunner>,
    jobs: Arc<dyn JobRepository>,
    queue: mpsc::Sender<JobMessage>,
    policy: SchedulerPolicy,
    shutdown: CancellationToken,
    async_jobs_submitted: AtomicU64,
}

impl TranscriptionService {
    pub fn new(
        downloader: Arc<dyn MediaDownloader>,
        pipeline: Arc<PipelineRunner>,
        jobs: Arc<dyn JobRepository>,
        queue: mpsc::Sender<JobMessage>,
        policy: SchedulerPolicy,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            downloader,
            pipeline,
            jobs,
            queue,
            policy,
            shutdown,
            async_jobs_submitted: AtomicU64::new(0),
        }
    }

    pub async fn submit(&self, url: &str) -> Result<SubmitOutcome, SubmitError> {
        validate_source_url(url)?;

        let duration = self
            .downloader
            .probe_duration(url, &self.shutdown)
            .await
            .map_err(SubmitError::Probe)?;

        if let Some(max) = self.policy.max_video_length {
            if duration > max as f64 {
                return Err(SubmitError::InvalidArgument(format!(
                    "source duration {:.0}s exceeds the {}s limit",
                    duration, max
                )));
            }
        }

        if duration <= self.policy.sync_threshold_seconds as f64 {
            return self.run_sync(url, duration).await;
        }

        self.enqueue(url, duration).await
    }

    /// Short sources are transcribed on the caller's thread; no job
    /// record is ever persisted for them.
    async fn run_sync(&self, url: &str, duration: f64) -> Result<SubmitOutcome, SubmitError> {
        let id = JobId::new();
        tracing::info!(job_id = %id, duration_s = duration, "Processing source synchronously");

        let output = self
            .pipeline
            .run(id, url, &self.shutdown)
            .await
            .map_err(SubmitError::Pipeline)?;

        Ok(SubmitOutcome::Sync {
            transcript: output.transcript,
            segments: output.segments,
        })
    }

    async fn enqueue(&self, url: &str, duration: f64) -> Result<SubmitOutcome, SubmitError> {
        let job = Job::new(url);
        let job_id = job.id;
        tracing::info!(job_id = %job_id, duration_s = duration, "Queueing source for async processing");

        // Persisted before publishing: redelivery must find the record.
        self.jobs.create(&job).await?;

        let submitted = self.async_jobs_submitted.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(limit) = self.policy.free_job_limit {
            if submitted > limit {
                tracing::warn!(submitted, limit, "Advisory job limit passed");
            }
        }

        self.queue
            .send(JobMessage {
                job_id,
                source_url: url.to_string(),
            })
            .await
            .map_err(|_| SubmitError::Internal("job queue closed".to_string()))?;

        Ok(SubmitOutcome::Queued { job_id })
    }
}

/// A submission is accepted iff it parses as an absolute http(s) URL.
fn validate_source_url(url: &str) -> Result<(), SubmitError> {
    let parsed = Url::parse(url)
        .map_err(|e| SubmitError::InvalidArgument(format!("invalid url: {}", e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SubmitError::InvalidArgument(format!(
            "unsupported url scheme: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_and_https_urls_are_accepted() {
        assert!(validate_source_url("https://example.com/v/1").is_ok());
        assert!(validate_source_url("http://example.com/watch?v=abc").is_ok());
    }

    #[test]
    fn relative_and_non_http_urls_are_rejected() {
        assert!(validate_source_url("not-a-url").is_err());
        assert!(validate_source_url("ftp://example.com/file").is_err());
        assert!(validate_source_url("/v/1").is_err());
    }
}
