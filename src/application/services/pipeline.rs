use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    AudioNormalizer, MediaDownloader, MediaToolError, SubtitleWriter, Transcriber,
};
use crate::domain::{ArtifactPaths, JobId, Segment};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Tool(#[from] MediaToolError),
    #[error("Internal: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Tool(MediaToolError::Cancelled))
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub transcript: String,
    pub segments: Vec<Segment>,
    pub artifacts: Option<ArtifactPaths>,
}

/// The three-stage composition: download, normalize, transcribe, then
/// best-effort subtitle emission. One instance is shared by the sync
/// path and every worker.
pub struct PipelineRunner {
    downloader: Arc<dyn MediaDownloader>,
    normalizer: Arc<dyn AudioNormalizer>,
    transcriber: Arc<dyn Transcriber>,
    subtitles: Arc<dyn SubtitleWriter>,
    work_root: PathBuf,
}

impl PipelineRunner {
    pub fn new(
        downloader: Arc<dyn MediaDownloader>,
        normalizer: Arc<dyn AudioNormalizer>,
        transcriber: Arc<dyn Transcriber>,
        subtitles: Arc<dyn SubtitleWriter>,
        work_root: PathBuf,
    ) -> Self {
        Self {
            downloader,
            normalizer,
            transcriber,
            subtitles,
            work_root,
        }
    }

    /// Run the full pipeline for one job. The per-job working directory
    /// is removed on every exit path; subtitle files live outside it.
    pub async fn run(
        &self,
        id: JobId,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput, PipelineError> {
        let work_dir = WorkDir::create(self.work_root.join(id.to_string()))?;

        let audio = self
            .downloader
            .download_audio(url, work_dir.path(), cancel)
            .await?;
        tracing::debug!(job_id = %id, audio = %audio.display(), "Audio downloaded");

        let wav = self
            .normalizer
            .normalize(&audio, work_dir.path(), cancel)
            .await?;
        tracing::debug!(job_id = %id, wav = %wav.display(), "Audio normalized");

        let (transcript, segments) = self.transcriber.transcribe(&wav, cancel).await?;
        tracing::info!(
            job_id = %id,
            segments = segments.len(),
            chars = transcript.len(),
            "Transcription finished"
        );

        let artifacts = if segments.is_empty() {
            None
        } else {
            self.write_artifacts(id, &segments).await
        };

        Ok(PipelineOutput {
            transcript,
            segments,
            artifacts,
        })
    }

    /// Artifact emission is best-effort: an I/O failure is logged and
    /// the job still completes without artifact paths.
    async fn write_artifacts(&self, id: JobId, segments: &[Segment]) -> Option<ArtifactPaths> {
        let srt = match self.subtitles.write_srt(id, segments).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "SRT emission failed");
                return None;
            }
        };
        let vtt = match self.subtitles.write_vtt(id, segments).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "VTT emission failed");
                return None;
            }
        };
        Some(ArtifactPaths { srt, vtt })
    }
}

/// Per-job working directory, removed when dropped.
struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    fn create(path: PathBuf) -> Result<Self, PipelineError> {
        std::fs::create_dir_all(&path)
            .map_err(|e| PipelineError::Internal(format!("work dir {}: {}", path.display(), e)))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove work dir");
        }
    }
}
