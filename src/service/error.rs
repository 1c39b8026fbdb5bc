use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{error::HttpError, models::trackingmodel::TrackingStatus};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Pause request {0} not found")]
    PauseRequestNotFound(Uuid),

    #[error("Rating {0} not found")]
    RatingNotFound(Uuid),

    #[error("Daily review {0} not found")]
    ReviewNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Operation not allowed for job {job_id}: current status is {current:?}")]
    InvalidTransition {
        job_id: Uuid,
        current: TrackingStatus,
    },

    #[error("Job {0} already has an open pause request")]
    PauseAlreadyPending(Uuid),

    #[error("Job {0} has no approved, unresumed pause request")]
    NoActivePause(Uuid),

    #[error("Pause request {0} has already been reviewed")]
    AlreadyReviewed(Uuid),

    #[error("Review {review_id} is not ready to submit: {}", .blockers.join("; "))]
    ReviewNotReady { review_id: Uuid, blockers: Vec<String> },

    #[error("Review {0} has already been submitted")]
    ReviewSubmitted(Uuid),

    #[error("Rating {0} is already under dispute")]
    AlreadyDisputed(Uuid),

    #[error("Dispute on rating {0} is already resolved")]
    AlreadyResolved(Uuid),

    #[error("No pending override on rating {0}")]
    NoPendingOverride(Uuid),

    #[error("Job {0} already has a carry-over")]
    CarryOverAlreadyExists(Uuid),

    #[error("Job {job_id} has been carried over {count} times; the limit is {limit}")]
    CarryOverLimitExceeded { job_id: Uuid, count: i32, limit: i32 },

    #[error("User {0} is not authorized to perform this action on job {1}")]
    UnauthorizedJobAccess(Uuid, Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Media service error: {0}")]
    Media(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::JobNotFound(_)
            | ServiceError::PauseRequestNotFound(_)
            | ServiceError::RatingNotFound(_)
            | ServiceError::ReviewNotFound(_)
            | ServiceError::UserNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidTransition { .. }
            | ServiceError::NoActivePause(_)
            | ServiceError::ReviewNotReady { .. }
            | ServiceError::NoPendingOverride(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::PauseAlreadyPending(_)
            | ServiceError::AlreadyReviewed(_)
            | ServiceError::ReviewSubmitted(_)
            | ServiceError::AlreadyDisputed(_)
            | ServiceError::AlreadyResolved(_)
            | ServiceError::CarryOverAlreadyExists(_)
            | ServiceError::CarryOverLimitExceeded { .. } => StatusCode::CONFLICT,

            ServiceError::UnauthorizedJobAccess(_, _) => StatusCode::UNAUTHORIZED,

            ServiceError::Database(_) | ServiceError::Media(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        HttpError::new(error.to_string(), status)
    }
}
