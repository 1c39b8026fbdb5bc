// handlers/review.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        ratingdtos::RateJobDto,
        trackingdtos::{ApiResponse, CarryOverDto, DailyReviewQuery},
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn review_handler() -> Router {
    Router::new()
        .route("/daily", get(get_daily_review))
        .route("/daily/:review_id/rate-job", post(rate_job))
        .route("/daily/:review_id/submit", post(submit_review))
        .route("/carry-over", post(create_carry_over))
}

pub async fn get_daily_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(query): Query<DailyReviewQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let detail = app_state
        .review_service
        .get_daily_review(&auth.user, query.date, query.shift)
        .await?;

    Ok(Json(ApiResponse::success(
        "Daily review retrieved successfully",
        detail,
    )))
}

pub async fn rate_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(_review_id): Path<Uuid>,
    Json(body): Json<RateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let rating = app_state
        .rating_service
        .rate_job(
            body.job_id,
            &auth.user,
            body.user_id,
            body.qc_rating,
            body.cleaning_rating,
            body.qc_voice_b64,
        )
        .await?;

    Ok(Json(ApiResponse::success("Job rated", rating)))
}

pub async fn submit_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(review_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let review = app_state
        .review_service
        .submit_review(review_id, &auth.user)
        .await?;

    Ok(Json(ApiResponse::success("Daily review submitted", review)))
}

pub async fn create_carry_over(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CarryOverDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .carryover_service
        .create_carry_over(
            body.original_job_id,
            &auth.user,
            body.reason,
            body.details,
            body.engineer_voice_b64,
            body.reassign_to,
        )
        .await?;

    Ok(Json(ApiResponse::success("Carry-over created", result)))
}
