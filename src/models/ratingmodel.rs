use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trackingmodel::ShiftType;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "review_status", rename_all = "snake_case")]
pub enum ReviewStatus {
    Open,
    Submitted,
}

/// One rating row per (job, participant). Time rating is machine
/// computed; QC and cleaning are entered by the reviewing engineer.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobRating {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub rated_by: Uuid,
    pub time_rating: i16,
    pub qc_rating: Option<i16>,
    pub cleaning_rating: Option<i16>,
    pub qc_voice: Option<String>,
    pub override_value: Option<i16>,
    pub override_reason: Option<String>,
    pub override_approved: Option<bool>,
    pub bonus_points: i32,
    pub bonus_reason: Option<String>,
    pub dispute_raised: bool,
    pub dispute_reason: Option<String>,
    pub dispute_resolved: bool,
    pub dispute_resolution: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl JobRating {
    /// The approved override value if one exists, else the raw rating.
    pub fn effective_time_rating(&self) -> i16 {
        match (self.override_value, self.override_approved) {
            (Some(v), Some(true)) => v,
            _ => self.time_rating,
        }
    }

    pub fn has_open_dispute(&self) -> bool {
        self.dispute_raised && !self.dispute_resolved
    }
}

/// Per (engineer, date, shift) sign-off gate. `can_submit` is never
/// persisted; it is recomputed from job/pause/dispute state on read.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyReview {
    pub id: Uuid,
    pub engineer_id: Uuid,
    pub review_date: NaiveDate,
    pub shift: ShiftType,
    pub status: ReviewStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
