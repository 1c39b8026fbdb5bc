use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::trackingmodel::*;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AssignJobDto {
    #[validate(length(min = 1, max = 200, message = "Work order must be between 1 and 200 characters"))]
    pub work_order: String,

    pub engineer_id: Uuid,

    pub assigned_to: Uuid,

    pub job_date: NaiveDate,

    pub shift: ShiftType,

    #[validate(range(min = 0.1, max = 24.0, message = "Planned hours must be between 0.1 and 24"))]
    pub planned_hours: f64,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct StartJobDto {
    #[validate(length(max = 100, message = "Idempotency key too long"))]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RequestPauseDto {
    pub reason: PauseReason,

    #[validate(length(max = 1000, message = "Details must be at most 1000 characters"))]
    pub details: Option<String>,

    #[validate(length(max = 100, message = "Idempotency key too long"))]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReviewPauseDto {
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResumeJobDto {
    #[validate(length(max = 100, message = "Idempotency key too long"))]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CompleteJobDto {
    #[validate(length(max = 2000, message = "Work notes must be at most 2000 characters"))]
    pub work_notes: Option<String>,

    pub completion_photo_b64: Option<String>,

    #[validate(length(max = 100, message = "Idempotency key too long"))]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct IncompleteJobDto {
    pub reason: IncompleteReason,

    #[validate(length(max = 1000, message = "Details must be at most 1000 characters"))]
    pub details: Option<String>,

    pub handover_voice_b64: Option<String>,

    #[validate(length(max = 100, message = "Idempotency key too long"))]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CarryOverDto {
    pub original_job_id: Uuid,

    pub reason: IncompleteReason,

    #[validate(length(max = 1000, message = "Details must be at most 1000 characters"))]
    pub details: Option<String>,

    pub engineer_voice_b64: Option<String>,

    pub reassign_to: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConsumeMaterialsDto {
    pub items: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailyReviewQuery {
    pub date: NaiveDate,
    pub shift: ShiftType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptionCallbackDto {
    pub reference: String,
    pub transcription_primary: Option<String>,
    pub transcription_secondary: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn error(message: &str) -> ApiResponse<()> {
        ApiResponse {
            status: "error".to_string(),
            message: message.to_string(),
            data: None,
        }
    }
}
