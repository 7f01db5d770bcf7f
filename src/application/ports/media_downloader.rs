use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::MediaToolError;

/// Source-side tool seam: duration metadata and audio extraction.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Probe the source's duration in seconds without downloading it.
    ///
    /// Fails with `InvalidSource` when the tool exits non-zero or its
    /// output does not parse as a positive number, `ProbeTimeout` past
    /// the probe deadline.
    async fn probe_duration(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<f64, MediaToolError>;

    /// Extract the source's audio track into `work_dir` and return the
    /// produced file's path.
    async fn download_audio(
        &self,
        url: &str,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, MediaToolError>;
}
