use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::{JobId, Segment};

#[derive(Debug, thiserror::Error)]
pub enum SubtitleError {
    #[error("ArtifactIO: {path}: {source}")]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders a completed job's segments to subtitle files on disk. Both
/// writers are idempotent: identical input overwrites with byte-identical
/// output.
#[async_trait]
pub trait SubtitleWriter: Send + Sync {
    async fn write_srt(&self, id: JobId, segments: &[Segment]) -> Result<PathBuf, SubtitleError>;

    async fn write_vtt(&self, id: JobId, segments: &[Segment]) -> Result<PathBuf, SubtitleError>;
}
