use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{MediaDownloader, MediaToolError};

use super::process::{describe_failure, run_tool, ToolRunError};

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Drives yt-dlp for both metadata probing and audio extraction. The
/// binary churns often, so every argument template lives here and
/// nowhere else.
pub struct YtDlpDownloader {
    bin: String,
}

impl YtDlpDownloader {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl MediaDownloader for YtDlpDownloader {
    async fn probe_duration(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<f64, MediaToolError> {
        let mut command = Command::new(&self.bin);
        command
            .arg("--no-warnings")
            .arg("--skip-download")
            .arg("--print")
            .arg("duration")
            .arg(url);

        let output = run_tool(command, PROBE_TIMEOUT, cancel)
            .await
            .map_err(|e| match e {
                ToolRunError::Spawn(e) => {
                    MediaToolError::InvalidSource(format!("yt-dlp unavailable: {}", e))
                }
                ToolRunError::NonZero { code, stderr } => {
                    MediaToolError::InvalidSource(describe_failure(code, &stderr))
                }
                ToolRunError::TimedOut => MediaToolError::ProbeTimeout(PROBE_TIMEOUT.as_secs()),
                ToolRunError::Cancelled => MediaToolError::Cancelled,
            })?;

        let duration: f64 = output
            .stdout
            .trim()
            .parse()
            .map_err(|_| {
                MediaToolError::InvalidSource(format!(
                    "unparseable duration: {:?}",
                    output.stdout.trim()
                ))
            })?;

        if duration <= 0.0 || !duration.is_finite() {
            return Err(MediaToolError::InvalidSource(format!(
                "non-positive duration: {}",
                duration
            )));
        }

        Ok(duration)
    }

    async fn download_audio(
        &self,
        url: &str,
        work_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, MediaToolError> {
        let template = work_dir.join("audio.%(ext)s");
        let mut command = Command::new(&self.bin);
        command
            .arg("--no-warnings")
            .arg("--quiet")
            .arg("--no-progress")
            .arg("-x")
            .arg("--audio-format")
            .arg("m4a")
            .arg("-o")
            .arg(&template)
            .arg(url);

        run_tool(command, DOWNLOAD_TIMEOUT, cancel)
            .await
            .map_err(|e| match e {
                ToolRunError::Spawn(e) => {
                    MediaToolError::DownloadFailed(format!("yt-dlp unavailable: {}", e))
                }
                ToolRunError::NonZero { code, stderr } => {
                    MediaToolError::DownloadFailed(describe_failure(code, &stderr))
                }
                ToolRunError::TimedOut => {
                    MediaToolError::DownloadTimeout(DOWNLOAD_TIMEOUT.as_secs())
                }
                ToolRunError::Cancelled => MediaToolError::Cancelled,
            })?;

        let audio = work_dir.join("audio.m4a");
        if !audio.is_file() {
            return Err(MediaToolError::DownloadFailed(format!(
                "expected audio file missing: {}",
                audio.display()
            )));
        }
        Ok(audio)
    }
}
