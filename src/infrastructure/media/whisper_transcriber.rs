use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{MediaToolError, Transcriber};
use crate::domain::{normalize_segments, transcript_from_segments, Segment};

use super::process::{describe_failure, run_tool, ToolRunError};

const MIN_TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(180);

/// whisper.cpp CLI backend. Requests JSON output and parses the segment
/// list. The CLI reports millisecond offsets; times leave this module
/// as seconds.
pub struct WhisperTranscriber {
    bin: String,
    model: PathBuf,
}

impl WhisperTranscriber {
    pub fn new(bin: impl Into<String>, model: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(
        &self,
        wav: &Path,
        cancel: &CancellationToken,
    ) -> Result<(String, Vec<Segment>), MediaToolError> {
        let work_dir = wav.parent().ok_or_else(|| {
            MediaToolError::TranscribeFailed(format!("wav has no parent dir: {}", wav.display()))
        })?;
        let output_prefix = work_dir.join("transcript");

        let timeout = transcribe_timeout(wav).await;

        let mut command = Command::new(&self.bin);
        command
            .arg("-m")
            .arg(&self.model)
            .arg("-f")
            .arg(wav)
            .arg("-oj")
            .arg("-of")
            .arg(&output_prefix);

        run_tool(command, timeout, cancel).await.map_err(|e| match e {
            ToolRunError::Spawn(e) => {
                MediaToolError::TranscribeFailed(format!("transcriber unavailable: {}", e))
            }
            ToolRunError::NonZero { code, stderr } => {
                MediaToolError::TranscribeFailed(describe_failure(code, &stderr))
            }
            ToolRunError::TimedOut => MediaToolError::TranscribeTimeout(timeout.as_secs()),
            ToolRunError::Cancelled => MediaToolError::Cancelled,
        })?;

        let json_path = output_prefix.with_extension("json");
        let raw = tokio::fs::read_to_string(&json_path).await.map_err(|e| {
            MediaToolError::TranscribeFailed(format!(
                "missing transcript output {}: {}",
                json_path.display(),
                e
            ))
        })?;

        parse_whisper_json(&raw)
    }
}

/// Transcription wall-clock scales with input length:
/// max(180 s, 4 x audio duration).
async fn transcribe_timeout(wav: &Path) -> Duration {
    let duration_secs = match tokio::fs::metadata(wav).await {
        // 16 kHz mono s16le payload after the 44-byte header.
        Ok(meta) => meta.len().saturating_sub(44) as f64 / (16_000.0 * 2.0),
        Err(_) => 0.0,
    };
    MIN_TRANSCRIBE_TIMEOUT.max(Duration::from_secs_f64(duration_secs * 4.0))
}

#[derive(Deserialize)]
struct WhisperOutput {
    transcription: Vec<WhisperSegment>,
}

#[derive(Deserialize)]
struct WhisperSegment {
    offsets: WhisperOffsets,
    text: String,
}

/// Millisecond offsets as emitted by whisper.cpp's JSON writer.
#[derive(Deserialize)]
struct WhisperOffsets {
    from: i64,
    to: i64,
}

fn parse_whisper_json(raw: &str) -> Result<(String, Vec<Segment>), MediaToolError> {
    let output: WhisperOutput = serde_json::from_str(raw)
        .map_err(|e| MediaToolError::TranscribeFailed(format!("unparseable transcript json: {}", e)))?;

    let segments = normalize_segments(
        output
            .transcription
            .into_iter()
            .map(|s| Segment::new(s.offsets.from as f64 / 1000.0, s.offsets.to as f64 / 1000.0, s.text))
            .collect(),
    );
    let transcript = transcript_from_segments(&segments);
    Ok((transcript, segments))
}
