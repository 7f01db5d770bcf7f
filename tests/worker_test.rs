use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use skald::application::ports::{
    AudioNormalizer, EventNotifier, JobEvent, JobRepository, MediaDownloader, MediaToolError,
    Transcriber,
};
use skald::application::services::{JobMessage, PipelineRunner, TranscriptionWorker};
use skald::domain::{Job, JobId, JobStatus, Segment};
use skald::infrastructure::persistence::MemoryJobRepository;
use skald::infrastructure::subtitles::FsSubtitleWriter;

struct StubDownloader {
    fail_download: bool,
}

#[async_trait]
impl MediaDownloader for StubDownloader {
    async fn probe_duration(
        &self,
        _url: &str,
        _cancel: &CancellationToken,
    ) -> Result<f64, MediaToolError> {
        Ok(600.0)
    }

    async fn download_audio(
        &self,
        _url: &str,
        work_dir: &Path,
        _cancel: &CancellationToken,
    ) -> Result<PathBuf, MediaToolError> {
        if self.fail_download {
            return Err(MediaToolError::DownloadFailed("exit status 1".to_string()));
        }
        let path = work_dir.join("audio.m4a");
        tokio::fs::write(&path, b"audio")
            .await
            .map_err(|e| MediaToolError::DownloadFailed(e.to_string()))?;
        Ok(path)
    }
}

struct StubNormalizer;

#[async_trait]
impl AudioNormalizer for StubNormalizer {
    async fn normalize(
        &self,
        _input: &Path,
        work_dir: &Path,
        _cancel: &CancellationToken,
    ) -> Result<PathBuf, MediaToolError> {
        let path = work_dir.join("audio.wav");
        tokio::fs::write(&path, b"wav")
            .await
            .map_err(|e| MediaToolError::NormalizeFailed(e.to_string()))?;
        Ok(path)
    }
}

struct StubTranscriber;

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(
        &self,
        _wav: &Path,
        _cancel: &CancellationToken,
    ) -> Result<(String, Vec<Segment>), MediaToolError> {
        Ok((
            "hello world".to_string(),
            vec![
                Segment::new(0.0, 1.2, "hello"),
                Segment::new(1.2, 2.4, "world"),
            ],
        ))
    }
}

/// Records every delivered event kind, in order.
struct CollectingNotifier {
    events: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn kinds(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventNotifier for CollectingNotifier {
    async fn notify(&self, event: &JobEvent) {
        self.events.lock().unwrap().push(event.event.clone());
    }
}

struct Harness {
    jobs: Arc<MemoryJobRepository>,
    notifier: Arc<CollectingNotifier>,
    queue: mpsc::Sender<JobMessage>,
    _workspace: TempDir,
}

fn start_worker(fail_download: bool) -> Harness {
    let workspace = TempDir::new().expect("temp workspace");
    let jobs = Arc::new(MemoryJobRepository::new());
    let notifier = Arc::new(CollectingNotifier::new());

    let pipeline = Arc::new(PipelineRunner::new(
        Arc::new(StubDownloader { fail_download }),
        Arc::new(StubNormalizer),
        Arc::new(StubTranscriber),
        Arc::new(FsSubtitleWriter::new(workspace.path().join("subtitles"))),
        workspace.path().join("work"),
    ));

    let (queue, deliveries) = mpsc::channel(16);
    let worker = TranscriptionWorker::new(
        deliveries,
        Arc::clone(&jobs) as Arc<dyn JobRepository>,
        pipeline,
        Arc::clone(&notifier) as Arc<dyn EventNotifier>,
        2,
        CancellationToken::new(),
    );
    tokio::spawn(worker.run());

    Harness {
        jobs,
        notifier,
        queue,
        _workspace: workspace,
    }
}

async fn await_terminal(jobs: &MemoryJobRepository, id: JobId) -> Job {
    for _ in 0..100 {
        if let Some(job) = jobs.get(id).await.unwrap() {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {} never reached a terminal state", id);
}

#[tokio::test]
async fn given_delivered_job_when_pipeline_succeeds_then_complete_with_both_events() {
    let harness = start_worker(false);

    let job = Job::new("https://x/v/2");
    harness.jobs.create(&job).await.unwrap();
    harness
        .queue
        .send(JobMessage {
            job_id: job.id,
            source_url: job.source_url.clone(),
        })
        .await
        .unwrap();

    let done = await_terminal(&harness.jobs, job.id).await;
    assert_eq!(done.status, JobStatus::Complete);
    assert_eq!(done.transcript.as_deref(), Some("hello world"));
    assert_eq!(done.segments.as_ref().map(|s| s.len()), Some(2));
    assert!(done.artifacts.is_some());
    assert!(done.completed_at.unwrap() >= done.created_at);

    assert_eq!(
        harness.notifier.kinds(),
        vec!["job.started".to_string(), "job.completed".to_string()]
    );
}

#[tokio::test]
async fn given_terminal_job_when_redelivered_then_single_completion_webhook() {
    let harness = start_worker(false);

    let job = Job::new("https://x/v/2");
    harness.jobs.create(&job).await.unwrap();

    let message = JobMessage {
        job_id: job.id,
        source_url: job.source_url.clone(),
    };
    harness.queue.send(message.clone()).await.unwrap();
    await_terminal(&harness.jobs, job.id).await;

    // Second delivery of the same job: terminal state short-circuits.
    harness.queue.send(message).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let kinds = harness.notifier.kinds();
    assert_eq!(
        kinds.iter().filter(|k| *k == "job.completed").count(),
        1,
        "duplicate delivery must not re-fire webhooks: {:?}",
        kinds
    );
    assert_eq!(kinds.iter().filter(|k| *k == "job.started").count(), 1);
}

#[tokio::test]
async fn given_running_job_when_redelivered_then_no_duplicate_started_event() {
    let harness = start_worker(false);

    // A job stranded in `running` (say, by a worker killed mid-pipeline)
    // is fair game to restart, but the no-op transition must not re-fire
    // the started webhook.
    let job = Job::new("https://x/v/2");
    harness.jobs.create(&job).await.unwrap();
    harness.jobs.mark_running(job.id).await.unwrap();

    harness
        .queue
        .send(JobMessage {
            job_id: job.id,
            source_url: job.source_url.clone(),
        })
        .await
        .unwrap();

    let done = await_terminal(&harness.jobs, job.id).await;
    assert_eq!(done.status, JobStatus::Complete);
    assert_eq!(harness.notifier.kinds(), vec!["job.completed".to_string()]);
}

#[tokio::test]
async fn given_failing_pipeline_when_delivered_then_error_with_failure_event() {
    let harness = start_worker(true);

    let job = Job::new("https://x/v/3");
    harness.jobs.create(&job).await.unwrap();
    harness
        .queue
        .send(JobMessage {
            job_id: job.id,
            source_url: job.source_url.clone(),
        })
        .await
        .unwrap();

    let done = await_terminal(&harness.jobs, job.id).await;
    assert_eq!(done.status, JobStatus::Error);
    assert!(done
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("DownloadFailed"));
    assert!(done.transcript.is_none());
    assert!(done.segments.is_none());

    assert_eq!(
        harness.notifier.kinds(),
        vec!["job.started".to_string(), "job.failed".to_string()]
    );
}

#[tokio::test]
async fn given_delivery_without_record_when_processed_then_dropped_silently() {
    let harness = start_worker(false);

    harness
        .queue
        .send(JobMessage {
            job_id: JobId::new(),
            source_url: "https://x/v/9".to_string(),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(harness.notifier.kinds().is_empty());
    assert_eq!(harness.jobs.len(), 0);
}
