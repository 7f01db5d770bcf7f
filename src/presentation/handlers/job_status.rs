use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{Job, JobId, JobStatus, Segment};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct SubtitleFiles {
    pub srt_url: String,
    pub vtt_url: String,
}

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub id: String,
    pub status: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_files: Option<SubtitleFiles>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    // An id that does not even parse is simply unknown.
    let id: JobId = match job_id.parse() {
        Ok(id) => id,
        Err(_) => return not_found(&job_id),
    };

    match state.jobs.get(id).await {
        Ok(Some(job)) => (StatusCode::OK, Json(job_response(job))).into_response(),
        Ok(None) => not_found(&job_id),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch job status");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Internal: failed to fetch job: {}", e),
                }),
            )
                .into_response()
        }
    }
}

fn job_response(job: Job) -> JobStatusResponse {
    let mut response = JobStatusResponse {
        id: job.id.to_string(),
        status: job.status.as_str().to_string(),
        created_at: job.created_at.to_rfc3339(),
        completed_at: None,
        transcript: None,
        segments: None,
        error: None,
        subtitle_files: None,
    };

    match job.status {
        JobStatus::Complete => {
            response.completed_at = job.completed_at.map(|t| t.to_rfc3339());
            response.transcript = job.transcript;
            response.segments = job.segments;
            response.subtitle_files = job.artifacts.map(|a| SubtitleFiles {
                srt_url: a.srt.display().to_string(),
                vtt_url: a.vtt.display().to_string(),
            });
        }
        JobStatus::Error => {
            response.completed_at = job.completed_at.map(|t| t.to_rfc3339());
            response.error = job.error_message;
        }
        JobStatus::Queued | JobStatus::Running => {}
    }

    response
}

fn not_found(job_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("NotFound: no such job: {}", job_id),
        }),
    )
        .into_response()
}
