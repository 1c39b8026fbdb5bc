// handlers/tracking.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::trackingdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn tracking_handler() -> Router {
    Router::new()
        // Job lifecycle
        .route("/jobs", post(assign_job))
        .route("/jobs/:job_id", get(get_job_tracking))
        .route("/jobs/:job_id/start", post(start_job))
        .route("/jobs/:job_id/pause", post(request_pause))
        .route("/jobs/:job_id/resume", post(resume_job))
        .route("/jobs/:job_id/complete", post(complete_job))
        .route("/jobs/:job_id/incomplete", post(mark_incomplete))
        .route("/jobs/:job_id/consume-materials", post(consume_materials))
        // Pause adjudication
        .route("/pause-requests/:request_id/approve", post(approve_pause))
        .route("/pause-requests/:request_id/reject", post(reject_pause))
}

pub async fn assign_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<AssignJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .tracking_service
        .assign_job(
            &auth.user,
            body.work_order,
            body.engineer_id,
            body.assigned_to,
            body.job_date,
            body.shift,
            body.planned_hours,
        )
        .await?;

    Ok(Json(ApiResponse::success("Job assigned successfully", job)))
}

pub async fn get_job_tracking(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let detail = app_state.tracking_service.get_job_detail(job_id).await?;

    Ok(Json(ApiResponse::success(
        "Job tracking retrieved successfully",
        detail,
    )))
}

pub async fn start_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<StartJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .tracking_service
        .start(job_id, &auth.user, body.idempotency_key.as_deref())
        .await?;

    Ok(Json(ApiResponse::success("Job started", job)))
}

pub async fn request_pause(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<RequestPauseDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let request = app_state
        .tracking_service
        .request_pause(
            job_id,
            &auth.user,
            body.reason,
            body.details,
            body.idempotency_key.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success(
        "Pause requested; awaiting review",
        request,
    )))
}

pub async fn resume_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<ResumeJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .tracking_service
        .resume(job_id, &auth.user, body.idempotency_key.as_deref())
        .await?;

    Ok(Json(ApiResponse::success("Job resumed", job)))
}

pub async fn complete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<CompleteJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .tracking_service
        .complete(
            job_id,
            &auth.user,
            body.work_notes,
            body.completion_photo_b64,
            body.idempotency_key.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success("Job completed", job)))
}

pub async fn mark_incomplete(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<IncompleteJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .tracking_service
        .mark_incomplete(
            job_id,
            &auth.user,
            body.reason,
            body.details,
            body.handover_voice_b64,
            body.idempotency_key.as_deref(),
        )
        .await?;

    Ok(Json(ApiResponse::success("Job marked incomplete", job)))
}

pub async fn consume_materials(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<ConsumeMaterialsDto>,
) -> Result<impl IntoResponse, HttpError> {
    let log = app_state
        .tracking_service
        .consume_materials(job_id, &auth.user, body.items)
        .await?;

    Ok(Json(ApiResponse::success("Materials recorded", log)))
}

pub async fn approve_pause(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReviewPauseDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let request = app_state
        .pause_service
        .review_pause(request_id, &auth.user, true, body.notes)
        .await?;

    Ok(Json(ApiResponse::success("Pause request approved", request)))
}

pub async fn reject_pause(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ReviewPauseDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let request = app_state
        .pause_service
        .review_pause(request_id, &auth.user, false, body.notes)
        .await?;

    Ok(Json(ApiResponse::success("Pause request rejected", request)))
}
