use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::MediaToolError;

/// Resamples downloaded audio into the single-channel 16 kHz WAV the
/// transcriber expects.
#[async_trait]
pub trait AudioNormalizer: Send + Sync {
    async fn normalize(
        &self,
        input: &Path,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, MediaToolError>;
}
