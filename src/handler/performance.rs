// handlers/performance.rs
use std::sync::Arc;

use axum::{
    extract::Query,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::{
        performancedtos::{ComputePerformanceDto, DateRangeQuery, PerformanceQuery},
        trackingdtos::ApiResponse,
    },
    error::{ErrorMessage, HttpError},
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn performance_handler() -> Router {
    Router::new()
        .route("/compute", post(compute_performance))
        .route("/", get(get_performance))
        .route("/streaks", get(get_streaks))
        .route("/heat-map", get(get_heat_map))
        .route("/comparison", get(get_comparison))
}

/// Resolves the subject of a performance query. Non-admins may only
/// query themselves.
fn resolve_subject(auth: &JWTAuthMiddeware, requested: Option<Uuid>) -> Result<Uuid, HttpError> {
    match requested {
        Some(user_id) if user_id != auth.user.id && !auth.user.role.is_admin() => {
            Err(HttpError::unauthorized(ErrorMessage::PermissionDenied.to_string()))
        }
        Some(user_id) => Ok(user_id),
        None => Ok(auth.user.id),
    }
}

pub async fn compute_performance(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<ComputePerformanceDto>,
) -> Result<impl IntoResponse, HttpError> {
    if !auth.user.role.is_admin() {
        return Err(HttpError::unauthorized(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    let summary = app_state
        .performance_service
        .compute_performance(body.period_type, body.period_start)
        .await?;

    Ok(Json(ApiResponse::success(
        "Performance aggregation completed",
        summary,
    )))
}

pub async fn get_performance(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(query): Query<PerformanceQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = resolve_subject(&auth, query.user_id)?;

    let performance = app_state
        .performance_service
        .get_performance(user_id, query.period_type, query.period_start)
        .await?;

    Ok(Json(ApiResponse::success(
        "Performance retrieved successfully",
        performance,
    )))
}

pub async fn get_streaks(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = resolve_subject(&auth, query.user_id)?;

    let streaks = app_state
        .performance_service
        .get_streaks(user_id, query.start, query.end)
        .await?;

    Ok(Json(ApiResponse::success(
        "Streaks retrieved successfully",
        streaks,
    )))
}

pub async fn get_heat_map(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = resolve_subject(&auth, query.user_id)?;

    let heat_map = app_state
        .performance_service
        .get_heat_map(user_id, query.start, query.end)
        .await?;

    Ok(Json(ApiResponse::success(
        "Heat map retrieved successfully",
        heat_map,
    )))
}

pub async fn get_comparison(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(query): Query<PerformanceQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = resolve_subject(&auth, query.user_id)?;

    let comparison = app_state
        .performance_service
        .get_comparison(user_id, query.period_type, query.period_start)
        .await?;

    Ok(Json(ApiResponse::success(
        "Comparison retrieved successfully",
        comparison,
    )))
}
