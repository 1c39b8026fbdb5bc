// handlers/media.rs
use std::sync::Arc;

use axum::{response::IntoResponse, routing::post, Extension, Json, Router};

use crate::{
    dtos::trackingdtos::{ApiResponse, TranscriptionCallbackDto},
    error::HttpError,
    AppState,
};

pub fn media_handler() -> Router {
    Router::new().route("/transcriptions", post(attach_transcription))
}

/// Callback endpoint for the transcription collaborator. The payload
/// carries the media reference handed out at upload time.
pub async fn attach_transcription(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<TranscriptionCallbackDto>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .media_service
        .attach_transcription(
            &body.reference,
            body.transcription_primary,
            body.transcription_secondary,
        )
        .await?;

    Ok(Json(ApiResponse::success("Transcription attached", ())))
}
