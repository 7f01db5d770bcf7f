use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::MediaToolError;
use crate::domain::Segment;

/// Speech-to-text seam. Implementations return the full transcript and
/// the canonical (normalized, start-sorted) segment sequence.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        wav: &Path,
        cancel: &CancellationToken,
    ) -> Result<(String, Vec<Segment>), MediaToolError>;
}
