use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use skald::application::ports::{
    AudioNormalizer, EventNotifier, JobRepository, MediaDownloader, NoopNotifier, SubtitleWriter,
    Transcriber,
};
use skald::application::services::{
    PipelineRunner, SchedulerPolicy, TranscriptionService, TranscriptionWorker,
};
use skald::infrastructure::media::{
    self, FfmpegNormalizer, WhisperTranscriber, YtDlpDownloader,
};
use skald::infrastructure::observability::{init_tracing, TracingConfig};
use skald::infrastructure::persistence::{create_pool, MemoryJobRepository, PgJobRepository};
use skald::infrastructure::subtitles::FsSubtitleWriter;
use skald::infrastructure::webhook::{WebhookConfig, WebhookNotifier};
use skald::presentation::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    init_tracing(TracingConfig {
        level: settings.logging.level.clone(),
        json_format: settings.logging.enable_json,
    });

    media::verify_tools(
        &settings.media.ytdlp_bin,
        &settings.media.ffmpeg_bin,
        &settings.media.whisper_bin,
        &settings.media.whisper_model,
    )
    .await?;

    let shutdown = CancellationToken::new();

    let jobs: Arc<dyn JobRepository> = match &settings.database.url {
        Some(url) => {
            let pool = create_pool(
                url,
                settings.database.max_connections,
                settings.database.connect_attempts,
            )
            .await?;
            Arc::new(PgJobRepository::new(pool))
        }
        None => Arc::new(MemoryJobRepository::new()),
    };

    let downloader: Arc<dyn MediaDownloader> =
        Arc::new(YtDlpDownloader::new(settings.media.ytdlp_bin.clone()));
    let normalizer: Arc<dyn AudioNormalizer> =
        Arc::new(FfmpegNormalizer::new(settings.media.ffmpeg_bin.clone()));
    let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::new(
        settings.media.whisper_bin.clone(),
        settings.media.whisper_model.clone(),
    ));
    let subtitles: Arc<dyn SubtitleWriter> =
        Arc::new(FsSubtitleWriter::new(settings.media.output_dir.clone()));

    let pipeline = Arc::new(PipelineRunner::new(
        Arc::clone(&downloader),
        normalizer,
        transcriber,
        subtitles,
        settings.media.work_dir.clone(),
    ));

    let notifier: Arc<dyn EventNotifier> = match &settings.webhook.url {
        Some(url) => Arc::new(WebhookNotifier::new(WebhookConfig {
            url: url.clone(),
            events: settings.webhook.events.clone(),
            secret: settings.webhook.secret.clone(),
            timeout: Duration::from_secs(settings.webhook.timeout_seconds),
            max_retries: settings.webhook.max_retries,
        })),
        None => Arc::new(NoopNotifier),
    };

    let (queue, deliveries) = mpsc::channel(settings.scheduler.queue_capacity);

    let worker = TranscriptionWorker::new(
        deliveries,
        Arc::clone(&jobs),
        Arc::clone(&pipeline),
        notifier,
        settings.scheduler.worker_concurrency,
        shutdown.clone(),
    );
    let worker_handle = tokio::spawn(worker.run());

    let transcription_service = Arc::new(TranscriptionService::new(
        downloader,
        pipeline,
        Arc::clone(&jobs),
        queue,
        SchedulerPolicy {
            sync_threshold_seconds: settings.scheduler.sync_threshold_seconds,
            max_video_length: settings.media.max_video_length,
            free_job_limit: settings.scheduler.free_job_limit,
        },
        shutdown.clone(),
    ));

    let state = AppState {
        transcription_service,
        jobs,
        api_key: settings.auth.api_key.clone(),
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!(%addr, "Listening");

    let listener = TcpListener::bind(addr).await?;
    let signal_token = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            signal_token.cancel();
        })
        .await?;

    // In case the server exited without the signal firing.
    shutdown.cancel();
    let _ = worker_handle.await;

    Ok(())
}
