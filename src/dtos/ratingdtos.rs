use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RateJobDto {
    pub job_id: Uuid,

    /// The participant being rated; a multi-person job gets one row
    /// per team member.
    pub user_id: Uuid,

    #[validate(range(min = 1, max = 5, message = "QC rating must be between 1 and 5"))]
    pub qc_rating: Option<i16>,

    #[validate(range(min = 1, max = 5, message = "Cleaning rating must be between 1 and 5"))]
    pub cleaning_rating: Option<i16>,

    pub qc_voice_b64: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OverrideTimeRatingDto {
    #[validate(range(min = 1, max = 5, message = "Override value must be between 1 and 5"))]
    pub new_value: i16,

    #[validate(length(min = 5, max = 1000, message = "Reason must be between 5 and 1000 characters"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveOverrideDto {
    pub approved: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AdminBonusDto {
    #[validate(range(min = 1, max = 100, message = "Bonus must be between 1 and 100 points"))]
    pub points: i32,

    #[validate(length(min = 5, max = 1000, message = "Reason must be between 5 and 1000 characters"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DisputeRatingDto {
    #[validate(length(min = 5, max = 1000, message = "Reason must be between 5 and 1000 characters"))]
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ResolveDisputeDto {
    #[validate(length(min = 5, max = 2000, message = "Resolution must be between 5 and 2000 characters"))]
    pub resolution: String,

    #[validate(range(min = 1, max = 5, message = "Revised QC rating must be between 1 and 5"))]
    pub revised_qc: Option<i16>,

    #[validate(range(min = 1, max = 5, message = "Revised cleaning rating must be between 1 and 5"))]
    pub revised_cleaning: Option<i16>,
}
