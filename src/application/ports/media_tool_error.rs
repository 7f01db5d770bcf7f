/// Shared failure taxonomy for the three external tools. Display output
/// always begins with the kind name so stored error messages and HTTP
/// error bodies can be matched on it.
#[derive(Debug, thiserror::Error)]
pub enum MediaToolError {
    #[error("InvalidSource: {0}")]
    InvalidSource(String),
    #[error("ProbeTimeout: duration probe exceeded {0}s")]
    ProbeTimeout(u64),
    #[error("DownloadFailed: {0}")]
    DownloadFailed(String),
    #[error("DownloadTimeout: audio download exceeded {0}s")]
    DownloadTimeout(u64),
    #[error("NormalizeFailed: {0}")]
    NormalizeFailed(String),
    #[error("NormalizeTimeout: audio normalization exceeded {0}s")]
    NormalizeTimeout(u64),
    #[error("TranscribeFailed: {0}")]
    TranscribeFailed(String),
    #[error("TranscribeTimeout: transcription exceeded {0}s")]
    TranscribeTimeout(u64),
    #[error("Cancelled: tool invocation interrupted")]
    Cancelled,
}
