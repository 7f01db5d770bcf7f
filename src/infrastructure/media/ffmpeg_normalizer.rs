use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{AudioNormalizer, MediaToolError};

use super::process::{describe_failure, run_tool, ToolRunError};

const NORMALIZE_TIMEOUT: Duration = Duration::from_secs(120);

/// ffmpeg resample to the transcriber's input format: one channel at
/// 16 kHz.
pub struct FfmpegNormalizer {
    bin: String,
}

impl FfmpegNormalizer {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl AudioNormalizer for FfmpegNormalizer {
    async fn normalize(
        &self,
        input: &Path,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, MediaToolError> {
        let wav = work_dir.join("audio.wav");
        let mut command = Command::new(&self.bin);
        command
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-vn")
            .arg("-ac")
            .arg("1")
            .arg("-ar")
            .arg("16000")
            .arg(&wav);

        run_tool(command, NORMALIZE_TIMEOUT, cancel)
            .await
            .map_err(|e| match e {
                ToolRunError::Spawn(e) => {
                    MediaToolError::NormalizeFailed(format!("ffmpeg unavailable: {}", e))
                }
                ToolRunError::NonZero { code, stderr } => {
                    MediaToolError::NormalizeFailed(describe_failure(code, &stderr))
                }
                ToolRunError::TimedOut => {
                    MediaToolError::NormalizeTimeout(NORMALIZE_TIMEOUT.as_secs())
                }
                ToolRunError::Cancelled => MediaToolError::Cancelled,
            })?;

        if !wav.is_file() {
            return Err(MediaToolError::NormalizeFailed(format!(
                "expected wav missing: {}",
                wav.display()
            )));
        }
        Ok(wav)
    }
}
