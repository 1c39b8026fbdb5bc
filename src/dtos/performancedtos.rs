use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::performancemodel::PeriodType;

#[derive(Debug, Serialize, Deserialize)]
pub struct ComputePerformanceDto {
    pub period_type: PeriodType,
    pub period_start: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PerformanceQuery {
    /// Defaults to the calling user; admins may query anyone.
    pub user_id: Option<Uuid>,
    pub period_type: PeriodType,
    pub period_start: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DateRangeQuery {
    pub user_id: Option<Uuid>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}
