// handlers/rating.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{ratingdtos::*, trackingdtos::ApiResponse},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn rating_handler() -> Router {
    Router::new()
        .route("/:rating_id/override-time", post(override_time_rating))
        .route("/:rating_id/approve-override", post(approve_override))
        .route("/:rating_id/admin-bonus", post(admin_bonus))
        .route("/:rating_id/dispute", post(dispute_rating))
        .route("/:rating_id/resolve-dispute", post(resolve_dispute))
}

pub async fn override_time_rating(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(rating_id): Path<Uuid>,
    Json(body): Json<OverrideTimeRatingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let rating = app_state
        .rating_service
        .override_time_rating(rating_id, &auth.user, body.new_value, body.reason)
        .await?;

    Ok(Json(ApiResponse::success(
        "Override requested; awaiting approval",
        rating,
    )))
}

pub async fn approve_override(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(rating_id): Path<Uuid>,
    Json(body): Json<ApproveOverrideDto>,
) -> Result<impl IntoResponse, HttpError> {
    let rating = app_state
        .rating_service
        .approve_override(rating_id, &auth.user, body.approved)
        .await?;

    let message = if body.approved {
        "Override approved"
    } else {
        "Override declined"
    };

    Ok(Json(ApiResponse::success(message, rating)))
}

pub async fn admin_bonus(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(rating_id): Path<Uuid>,
    Json(body): Json<AdminBonusDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let rating = app_state
        .rating_service
        .admin_bonus(rating_id, &auth.user, body.points, body.reason)
        .await?;

    Ok(Json(ApiResponse::success("Bonus points awarded", rating)))
}

pub async fn dispute_rating(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(rating_id): Path<Uuid>,
    Json(body): Json<DisputeRatingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let rating = app_state
        .rating_service
        .dispute_rating(rating_id, &auth.user, body.reason)
        .await?;

    Ok(Json(ApiResponse::success("Dispute raised", rating)))
}

pub async fn resolve_dispute(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(rating_id): Path<Uuid>,
    Json(body): Json<ResolveDisputeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let rating = app_state
        .rating_service
        .resolve_dispute(
            rating_id,
            &auth.user,
            body.resolution,
            body.revised_qc,
            body.revised_cleaning,
        )
        .await?;

    Ok(Json(ApiResponse::success("Dispute resolved", rating)))
}
