use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Job;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    JobStarted,
    JobCompleted,
    JobFailed,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::JobStarted => "job.started",
            EventKind::JobCompleted => "job.completed",
            EventKind::JobFailed => "job.failed",
        }
    }
}

/// Lifecycle event emitted once per job transition. Serialized as the
/// webhook POST body.
#[derive(Debug, Clone, Serialize)]
pub struct JobEvent {
    pub event: String,
    pub job_id: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srt_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vtt_path: Option<String>,
}

impl JobEvent {
    pub fn started(job: &Job) -> Self {
        Self::base(EventKind::JobStarted, job)
    }

    pub fn completed(job: &Job, processing_ms: u64) -> Self {
        let mut event = Self::base(EventKind::JobCompleted, job);
        event.completed_at = job.completed_at;
        event.processing_ms = Some(processing_ms);
        if let Some(artifacts) = &job.artifacts {
            event.srt_path = Some(artifacts.srt.display().to_string());
            event.vtt_path = Some(artifacts.vtt.display().to_string());
        }
        event
    }

    pub fn failed(job: &Job, processing_ms: u64) -> Self {
        let mut event = Self::base(EventKind::JobFailed, job);
        event.completed_at = job.completed_at;
        event.processing_ms = Some(processing_ms);
        event.error = job.error_message.clone();
        event
    }

    fn base(kind: EventKind, job: &Job) -> Self {
        Self {
            event: kind.as_str().to_string(),
            job_id: job.id.to_string(),
            url: job.source_url.clone(),
            created_at: job.created_at,
            completed_at: None,
            processing_ms: None,
            error: None,
            srt_path: None,
            vtt_path: None,
        }
    }
}

/// Delivery seam for lifecycle events. Implementations never propagate
/// failure: a dropped event is logged and the job outcome stands.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify(&self, event: &JobEvent);
}

/// Used when no webhook endpoint is configured.
pub struct NoopNotifier;

#[async_trait]
impl EventNotifier for NoopNotifier {
    async fn notify(&self, _event: &JobEvent) {}
}
