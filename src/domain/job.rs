use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::{JobId, JobStatus, Segment};

/// Filesystem locations of a completed job's subtitle renderings.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub srt: PathBuf,
    pub vtt: PathBuf,
}

/// The central persisted entity. Result fields are populated only by the
/// terminal reducers: transcript/segments/artifacts on `Complete`,
/// error_message on `Error`.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub source_url: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub transcript: Option<String>,
    pub segments: Option<Vec<Segment>>,
    pub error_message: Option<String>,
    pub artifacts: Option<ArtifactPaths>,
}

impl Job {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            source_url: source_url.into(),
            status: JobStatus::Queued,
            created_at: Utc::now(),
            completed_at: None,
            transcript: None,
            segments: None,
            error_message: None,
            artifacts: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = JobStatus::Running;
    }

    pub fn mark_complete(
        &mut self,
        transcript: String,
        segments: Vec<Segment>,
        artifacts: Option<ArtifactPaths>,
    ) {
        self.status = JobStatus::Complete;
        self.completed_at = Some(Utc::now());
        self.transcript = Some(transcript);
        self.segments = Some(segments);
        self.artifacts = artifacts;
        self.error_message = None;
    }

    pub fn mark_error(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.completed_at = Some(Utc::now());
        self.error_message = Some(message.into());
        self.transcript = None;
        self.segments = None;
        self.artifacts = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_starts_queued_without_results() {
        let job = Job::new("https://example.com/v/1");
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.completed_at.is_none());
        assert!(job.transcript.is_none());
        assert!(job.segments.is_none());
        assert!(job.error_message.is_none());
    }

    #[test]
    fn completion_stamps_results_and_timestamp() {
        let mut job = Job::new("https://example.com/v/1");
        job.mark_running();
        job.mark_complete("hello".into(), vec![Segment::new(0.0, 1.0, "hello")], None);
        assert_eq!(job.status, JobStatus::Complete);
        assert!(job.completed_at.expect("completed_at") >= job.created_at);
        assert_eq!(job.transcript.as_deref(), Some("hello"));
    }

    #[test]
    fn failure_clears_results_and_sets_message() {
        let mut job = Job::new("https://example.com/v/1");
        job.mark_running();
        job.mark_error("DownloadFailed: exit status 1");
        assert_eq!(job.status, JobStatus::Error);
        assert!(job.transcript.is_none());
        assert!(job.segments.is_none());
        assert!(job.error_message.unwrap().starts_with("DownloadFailed"));
    }
}
