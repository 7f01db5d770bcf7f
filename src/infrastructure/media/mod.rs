mod ffmpeg_normalizer;
mod process;
mod whisper_transcriber;
mod ytdlp_downloader;

pub use ffmpeg_normalizer::FfmpegNormalizer;
pub use whisper_transcriber::WhisperTranscriber;
pub use ytdlp_downloader::YtDlpDownloader;

use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use process::run_tool;

const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Startup verification that every configured binary answers a version
/// or help invocation. Failure here aborts startup.
pub async fn verify_tools(
    ytdlp_bin: &str,
    ffmpeg_bin: &str,
    whisper_bin: &str,
    whisper_model: &Path,
) -> anyhow::Result<()> {
    check_binary(ytdlp_bin, "--version").await?;
    check_binary(ffmpeg_bin, "-version").await?;
    check_binary(whisper_bin, "--help").await?;

    if !whisper_model.is_file() {
        anyhow::bail!("whisper model not found: {}", whisper_model.display());
    }

    tracing::info!(
        ytdlp = ytdlp_bin,
        ffmpeg = ffmpeg_bin,
        whisper = whisper_bin,
        "External tools verified"
    );
    Ok(())
}

async fn check_binary(bin: &str, flag: &str) -> anyhow::Result<()> {
    let mut command = Command::new(bin);
    command.arg(flag);
    run_tool(command, VERSION_CHECK_TIMEOUT, &CancellationToken::new())
        .await
        .map_err(|e| anyhow::anyhow!("{} {} failed: {:?}", bin, flag, e))?;
    Ok(())
}
