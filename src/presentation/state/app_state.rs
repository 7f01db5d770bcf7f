use std::sync::Arc;

use crate::application::ports::JobRepository;
use crate::application::services::TranscriptionService;

#[derive(Clone)]
pub struct AppState {
    pub transcription_service: Arc<TranscriptionService>,
    pub jobs: Arc<dyn JobRepository>,
    pub api_key: String,
}
