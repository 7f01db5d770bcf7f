use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{EventNotifier, JobEvent, JobRepository, RepositoryError};
use crate::application::services::{JobMessage, PipelineError, PipelineRunner};
use crate::domain::Job;

/// Everything a delivery needs, shared by every in-flight job task.
struct WorkerContext {
    jobs: Arc<dyn JobRepository>,
    pipeline: Arc<PipelineRunner>,
    notifier: Arc<dyn EventNotifier>,
    shutdown: CancellationToken,
}

/// Consumes the job topic. Deliveries run on spawned tasks bounded by a
/// semaphore of `worker_concurrency` permits; the subscription contract
/// is at-least-once, so a delivered job already in a terminal state is
/// acknowledged without re-running.
pub struct TranscriptionWorker {
    receiver: mpsc::Receiver<JobMessage>,
    concurrency: Arc<Semaphore>,
    max_permits: u32,
    ctx: Arc<WorkerContext>,
}

impl TranscriptionWorker {
    pub fn new(
        receiver: mpsc::Receiver<JobMessage>,
        jobs: Arc<dyn JobRepository>,
        pipeline: Arc<PipelineRunner>,
        notifier: Arc<dyn EventNotifier>,
        worker_concurrency: usize,
        shutdown: CancellationToken,
    ) -> Self {
        let max_permits = worker_concurrency.max(1) as u32;
        Self {
            receiver,
            concurrency: Arc::new(Semaphore::new(max_permits as usize)),
            max_permits,
            ctx: Arc::new(WorkerContext {
                jobs,
                pipeline,
                notifier,
                shutdown,
            }),
        }
    }

    pub async fn run(mut self) {
        tracing::info!(concurrency = self.max_permits, "Transcription worker started");
        loop {
            let msg = tokio::select! {
                _ = self.ctx.shutdown.cancelled() => break,
                msg = self.receiver.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };

            let permit = match Arc::clone(&self.concurrency).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                process_delivery(ctx, msg).await;
                drop(permit);
            });
        }

        // Drain: wait for in-flight deliveries before reporting stopped.
        let _ = self.concurrency.acquire_many(self.max_permits).await;
        tracing::info!("Transcription worker stopped");
    }
}

async fn process_delivery(ctx: Arc<WorkerContext>, msg: JobMessage) {
    let span = tracing::info_span!("transcription_job", job_id = %msg.job_id, url = %msg.source_url);
    handle_delivery(ctx, msg).instrument(span).await
}

async fn handle_delivery(ctx: Arc<WorkerContext>, msg: JobMessage) {
    let started = Instant::now();

    let job = match ctx.jobs.get(msg.job_id).await {
        Ok(Some(job)) => job,
        Ok(None) => {
            tracing::warn!("Delivered job has no record, dropping");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load delivered job");
            return;
        }
    };

    if job.status.is_terminal() {
        tracing::debug!(status = %job.status, "Duplicate delivery of terminal job, skipping");
        return;
    }

    // Non-terminal redeliveries (including jobs stranded in `running`
    // by a killed worker) restart from stage one. A no-op transition
    // fires no event.
    match ctx.jobs.mark_running(msg.job_id).await {
        Ok(Some(running)) => ctx.notifier.notify(&JobEvent::started(&running)).await,
        Ok(None) => {
            tracing::debug!("Job already running, restarting without a started event");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to mark job running");
            return;
        }
    }

    let result = AssertUnwindSafe(ctx.pipeline.run(job.id, &job.source_url, &ctx.shutdown))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| Err(PipelineError::Internal("pipeline panicked".to_string())));

    let processing_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(output) => {
            match ctx
                .jobs
                .mark_complete(job.id, &output.transcript, &output.segments, output.artifacts)
                .await
            {
                Ok(Some(job)) => {
                    tracing::info!(processing_ms, "Job completed");
                    ctx.notifier.notify(&JobEvent::completed(&job, processing_ms)).await;
                }
                Ok(None) => {
                    tracing::debug!("Job already complete, skipping webhook");
                }
                Err(e) => log_store_failure(&job, e),
            }
        }
        Err(e) if e.is_cancelled() => {
            // Shutdown mid-pipeline: the job stays `running` so a later
            // redelivery can restart it.
            tracing::info!("Pipeline cancelled, leaving job running for redelivery");
        }
        Err(e) => {
            match ctx.jobs.mark_error(job.id, &e.to_string()).await {
                Ok(Some(job)) => {
                    tracing::error!(error = %e, processing_ms, "Job failed");
                    ctx.notifier.notify(&JobEvent::failed(&job, processing_ms)).await;
                }
                Ok(None) => {
                    tracing::debug!("Job already failed, skipping webhook");
                }
                Err(store_err) => log_store_failure(&job, store_err),
            }
        }
    }
}

fn log_store_failure(job: &Job, e: RepositoryError) {
    tracing::error!(job_id = %job.id, error = %e, "Failed to persist job outcome");
}
