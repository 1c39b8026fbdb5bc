use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "period_type", rename_all = "snake_case")]
pub enum PeriodType {
    Daily,
    Weekly,
    Monthly,
}

impl PeriodType {
    pub fn to_str(&self) -> &str {
        match self {
            PeriodType::Daily => "daily",
            PeriodType::Weekly => "weekly",
            PeriodType::Monthly => "monthly",
        }
    }

    /// Exclusive end of the window starting at `start`.
    pub fn period_end(&self, start: NaiveDate) -> NaiveDate {
        match self {
            PeriodType::Daily => start + chrono::Duration::days(1),
            PeriodType::Weekly => start + chrono::Duration::days(7),
            PeriodType::Monthly => {
                let (y, m) = (start.year(), start.month());
                if m == 12 {
                    NaiveDate::from_ymd_opt(y + 1, 1, 1).unwrap_or(start)
                } else {
                    NaiveDate::from_ymd_opt(y, m + 1, 1).unwrap_or(start)
                }
            }
        }
    }
}

/// Derived rollup, recreated wholesale by each aggregator run and
/// keyed by (user, period type, period start). Never hand-edited.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Performance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub period_type: PeriodType,
    pub period_start: NaiveDate,
    pub jobs_assigned: i32,
    pub jobs_completed: i32,
    pub jobs_incomplete: i32,
    pub jobs_carried_over: i32,
    pub hours_worked: f64,
    pub paused_minutes: i32,
    pub avg_time_rating: Option<f64>,
    pub avg_qc_rating: Option<f64>,
    pub avg_cleaning_rating: Option<f64>,
    pub total_points: i32,
    pub computed_at: Option<DateTime<Utc>>,
}
