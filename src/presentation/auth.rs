use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Bearer-token gate for the transcription routes. There is no user
/// model: any holder of the configured key is "authenticated".
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if token != Some(state.api_key.as_str()) {
        tracing::warn!(uri = %request.uri().path(), "Rejected request with missing or wrong bearer token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Unauthenticated: invalid api key".to_string(),
            }),
        )
            .into_response();
    }

    next.run(request).await
}
