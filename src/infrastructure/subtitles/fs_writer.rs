use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::application::ports::{SubtitleError, SubtitleWriter};
use crate::domain::{JobId, Segment};

use super::{render_srt, render_vtt};

/// Writes `<output_dir>/<job_id>.srt|.vtt`. Rendering is pure, so a
/// rewrite with identical segments is byte-identical.
pub struct FsSubtitleWriter {
    output_dir: PathBuf,
}

impl FsSubtitleWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    async fn write(&self, path: &Path, content: String) -> Result<(), SubtitleError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| SubtitleError::ArtifactIo {
                path: self.output_dir.clone(),
                source,
            })?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| SubtitleError::ArtifactIo {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl SubtitleWriter for FsSubtitleWriter {
    async fn write_srt(&self, id: JobId, segments: &[Segment]) -> Result<PathBuf, SubtitleError> {
        let path = self.output_dir.join(format!("{}.srt", id));
        self.write(&path, render_srt(segments, None)).await?;
        Ok(path)
    }

    async fn write_vtt(&self, id: JobId, segments: &[Segment]) -> Result<PathBuf, SubtitleError> {
        let path = self.output_dir.join(format!("{}.vtt", id));
        self.write(&path, render_vtt(segments, None)).await?;
        Ok(path)
    }
}
