use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::services::{SubmitError, SubmitOutcome};
use crate::domain::Segment;
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct TranscribeRequest {
    pub url: String,
}

#[derive(Serialize)]
pub struct TranscribeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn transcribe_handler(
    State(state): State<AppState>,
    Json(request): Json<TranscribeRequest>,
) -> Response {
    tracing::info!(url = %request.url, "Transcribe request");

    match state.transcription_service.submit(&request.url).await {
        Ok(SubmitOutcome::Sync {
            transcript,
            segments,
        }) => (
            StatusCode::OK,
            Json(TranscribeResponse {
                job_id: None,
                transcript: Some(transcript),
                segments: Some(segments),
            }),
        )
            .into_response(),
        Ok(SubmitOutcome::Queued { job_id }) => (
            StatusCode::OK,
            Json(TranscribeResponse {
                job_id: Some(job_id.to_string()),
                transcript: None,
                segments: None,
            }),
        )
            .into_response(),
        Err(e) => submit_error_response(e),
    }
}

/// Pre-pipeline failures (validation, probe) are the caller's problem;
/// sync pipeline failures and infrastructure errors are ours.
fn submit_error_response(e: SubmitError) -> Response {
    let (status, error) = match &e {
        SubmitError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        SubmitError::Probe(err) => (
            StatusCode::BAD_REQUEST,
            format!("InvalidArgument: {}", err),
        ),
        SubmitError::Pipeline(err) => {
            tracing::error!(error = %err, "Synchronous transcription failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        SubmitError::Internal(_) => {
            tracing::error!(error = %e, "Submission failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    };
    (status, Json(ErrorResponse { error })).into_response()
}
