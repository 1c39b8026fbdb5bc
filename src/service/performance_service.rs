// service/performance_service.rs
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, performancedb::PerformanceExt, ratingdb::RatingExt},
    models::{
        performancemodel::{Performance, PeriodType},
        ratingmodel::JobRating,
        trackingmodel::{JobTracking, TrackingStatus},
    },
    service::error::ServiceError,
};

#[derive(Debug, Serialize)]
pub struct PerformanceRunSummary {
    pub period_type: PeriodType,
    pub period_start: NaiveDate,
    pub users_processed: usize,
    pub failures: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StreakSummary {
    pub current_streak_days: i32,
    pub best_streak_days: i32,
}

#[derive(Debug, Serialize)]
pub struct HeatMapEntry {
    pub date: NaiveDate,
    pub completed: i64,
}

#[derive(Debug, Serialize)]
pub struct ComparisonSummary {
    pub user: Performance,
    pub team_avg_time_rating: Option<f64>,
    pub team_avg_qc_rating: Option<f64>,
    pub team_avg_cleaning_rating: Option<f64>,
}

/// Fold one user's window of jobs and ratings into a rollup row. Pure
/// so two runs over the same rows produce identical output; the upsert
/// replaces rather than increments, which is what makes the aggregator
/// safe to re-run.
pub fn fold_performance(
    user_id: Uuid,
    period_type: PeriodType,
    period_start: NaiveDate,
    jobs: &[JobTracking],
    ratings: &[JobRating],
) -> Performance {
    let jobs_assigned = jobs.len() as i32;
    let jobs_completed = jobs
        .iter()
        .filter(|j| j.status == TrackingStatus::Completed)
        .count() as i32;
    let jobs_incomplete = jobs
        .iter()
        .filter(|j| j.status == TrackingStatus::Incomplete)
        .count() as i32;
    let jobs_carried_over = jobs.iter().filter(|j| j.is_carry_over).count() as i32;
    let hours_worked: f64 = jobs.iter().filter_map(|j| j.actual_hours).sum();
    let paused_minutes: i32 = jobs.iter().map(|j| j.total_paused_minutes).sum();

    let user_ratings: Vec<&JobRating> =
        ratings.iter().filter(|r| r.user_id == user_id).collect();

    let avg = |values: Vec<f64>| -> Option<f64> {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    let avg_time_rating = avg(user_ratings
        .iter()
        .map(|r| r.effective_time_rating() as f64)
        .collect());
    let avg_qc_rating = avg(user_ratings
        .iter()
        .filter_map(|r| r.qc_rating.map(|v| v as f64))
        .collect());
    let avg_cleaning_rating = avg(user_ratings
        .iter()
        .filter_map(|r| r.cleaning_rating.map(|v| v as f64))
        .collect());

    let total_points: i32 = user_ratings
        .iter()
        .map(|r| {
            r.effective_time_rating() as i32
                + r.qc_rating.unwrap_or(0) as i32
                + r.cleaning_rating.unwrap_or(0) as i32
                + r.bonus_points
        })
        .sum();

    Performance {
        id: Uuid::nil(), // assigned by the database on upsert
        user_id,
        period_type,
        period_start,
        jobs_assigned,
        jobs_completed,
        jobs_incomplete,
        jobs_carried_over,
        hours_worked,
        paused_minutes,
        avg_time_rating,
        avg_qc_rating,
        avg_cleaning_rating,
        total_points,
        computed_at: None,
    }
}

/// Consecutive-day streaks over (assigned, completed) day counts. A
/// day counts toward a streak when every assigned job that day was
/// completed.
pub fn compute_streaks(daily_counts: &[(NaiveDate, i64, i64)]) -> StreakSummary {
    let mut current = 0i32;
    let mut best = 0i32;
    let mut prev_date: Option<NaiveDate> = None;

    for &(date, assigned, completed) in daily_counts {
        let perfect = assigned > 0 && assigned == completed;
        let contiguous = prev_date
            .map(|p| (date - p).num_days() == 1)
            .unwrap_or(true);

        if perfect {
            current = if contiguous { current + 1 } else { 1 };
            best = best.max(current);
        } else {
            current = 0;
        }
        prev_date = Some(date);
    }

    StreakSummary {
        current_streak_days: current,
        best_streak_days: best,
    }
}

#[derive(Debug, Clone)]
pub struct PerformanceService {
    db_client: Arc<DBClient>,
}

impl PerformanceService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    /// Recompute-and-replace over a window. Safe to run concurrently
    /// with itself or twice for the same window; each user's row is
    /// replaced wholesale. A bad user does not abort the batch.
    pub async fn compute_performance(
        &self,
        period_type: PeriodType,
        period_start: NaiveDate,
    ) -> Result<PerformanceRunSummary, ServiceError> {
        let period_end = period_type.period_end(period_start);
        let users = self
            .db_client
            .get_active_users_in_window(period_start, period_end)
            .await?;

        let mut users_processed = 0usize;
        let mut failures = Vec::new();

        for user_id in users {
            match self
                .compute_for_user(user_id, period_type, period_start, period_end)
                .await
            {
                Ok(_) => users_processed += 1,
                Err(e) => {
                    tracing::error!(
                        "Performance compute failed for user {}: {}",
                        user_id,
                        e
                    );
                    failures.push(format!("{}: {}", user_id, e));
                }
            }
        }

        Ok(PerformanceRunSummary {
            period_type,
            period_start,
            users_processed,
            failures,
        })
    }

    async fn compute_for_user(
        &self,
        user_id: Uuid,
        period_type: PeriodType,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Performance, ServiceError> {
        let jobs = self
            .db_client
            .get_user_jobs_in_window(user_id, period_start, period_end)
            .await?;
        let job_ids: Vec<Uuid> = jobs.iter().map(|j| j.id).collect();
        let ratings = self.db_client.get_ratings_for_jobs(&job_ids).await?;

        let perf = fold_performance(user_id, period_type, period_start, &jobs, &ratings);
        Ok(self.db_client.upsert_performance(&perf).await?)
    }

    pub async fn get_performance(
        &self,
        user_id: Uuid,
        period_type: PeriodType,
        period_start: NaiveDate,
    ) -> Result<Option<Performance>, ServiceError> {
        Ok(self
            .db_client
            .get_performance(user_id, period_type, period_start)
            .await?)
    }

    pub async fn get_streaks(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<StreakSummary, ServiceError> {
        let counts = self
            .db_client
            .get_daily_assignment_counts(user_id, start, end)
            .await?;
        Ok(compute_streaks(&counts))
    }

    pub async fn get_heat_map(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HeatMapEntry>, ServiceError> {
        let counts = self
            .db_client
            .get_daily_completed_counts(user_id, start, end)
            .await?;
        Ok(counts
            .into_iter()
            .map(|(date, completed)| HeatMapEntry { date, completed })
            .collect())
    }

    pub async fn get_comparison(
        &self,
        user_id: Uuid,
        period_type: PeriodType,
        period_start: NaiveDate,
    ) -> Result<ComparisonSummary, ServiceError> {
        let period_end = period_type.period_end(period_start);

        // Always compare against a fresh fold, not a possibly stale
        // stored row.
        let user = self
            .compute_for_user(user_id, period_type, period_start, period_end)
            .await?;

        let (team_time, team_qc, team_cleaning) = self
            .db_client
            .get_team_averages(period_start, period_end)
            .await?;

        Ok(ComparisonSummary {
            user,
            team_avg_time_rating: team_time,
            team_avg_qc_rating: team_qc,
            team_avg_cleaning_rating: team_cleaning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trackingmodel::ShiftType;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn job(
        user_id: Uuid,
        status: TrackingStatus,
        actual_hours: Option<f64>,
        paused: i32,
        carry_over: bool,
    ) -> JobTracking {
        JobTracking {
            id: Uuid::new_v4(),
            work_order: "pump seal replacement".to_string(),
            engineer_id: Uuid::new_v4(),
            assigned_to: user_id,
            job_date: d(3),
            shift: ShiftType::Day,
            planned_hours: 4.0,
            status,
            started_at: None,
            completed_at: None,
            paused_at: None,
            total_paused_minutes: paused,
            actual_hours,
            work_notes: None,
            completion_photo: None,
            handover_voice: None,
            incomplete_reason: None,
            incomplete_details: None,
            is_carry_over: carry_over,
            original_job_id: None,
            carry_over_count: 0,
            auto_flagged: false,
            auto_flagged_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn rating_for(job: &JobTracking, time: i16, bonus: i32) -> JobRating {
        JobRating {
            id: Uuid::new_v4(),
            job_id: job.id,
            user_id: job.assigned_to,
            rated_by: Uuid::new_v4(),
            time_rating: time,
            qc_rating: Some(4),
            cleaning_rating: Some(3),
            qc_voice: None,
            override_value: None,
            override_reason: None,
            override_approved: None,
            bonus_points: bonus,
            bonus_reason: None,
            dispute_raised: false,
            dispute_reason: None,
            dispute_resolved: false,
            dispute_resolution: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn fold_counts_and_sums() {
        let user = Uuid::new_v4();
        let jobs = vec![
            job(user, TrackingStatus::Completed, Some(3.5), 30, false),
            job(user, TrackingStatus::Completed, Some(2.0), 0, true),
            job(user, TrackingStatus::Incomplete, Some(1.0), 15, false),
        ];
        let ratings = vec![
            rating_for(&jobs[0], 5, 0),
            rating_for(&jobs[1], 3, 10),
        ];

        let perf = fold_performance(user, PeriodType::Daily, d(3), &jobs, &ratings);

        assert_eq!(perf.jobs_assigned, 3);
        assert_eq!(perf.jobs_completed, 2);
        assert_eq!(perf.jobs_incomplete, 1);
        assert_eq!(perf.jobs_carried_over, 1);
        assert!((perf.hours_worked - 6.5).abs() < f64::EPSILON);
        assert_eq!(perf.paused_minutes, 45);
        assert_eq!(perf.avg_time_rating, Some(4.0));
        // (5+4+3) + (3+4+3) + 10 bonus
        assert_eq!(perf.total_points, 32);
    }

    #[test]
    fn fold_is_idempotent_over_same_rows() {
        let user = Uuid::new_v4();
        let jobs = vec![job(user, TrackingStatus::Completed, Some(4.0), 10, false)];
        let ratings = vec![rating_for(&jobs[0], 4, 5)];

        let a = fold_performance(user, PeriodType::Weekly, d(3), &jobs, &ratings);
        let b = fold_performance(user, PeriodType::Weekly, d(3), &jobs, &ratings);

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn fold_ignores_other_participants_ratings() {
        let user = Uuid::new_v4();
        let jobs = vec![job(user, TrackingStatus::Completed, Some(4.0), 0, false)];
        let mut other = rating_for(&jobs[0], 1, 100);
        other.user_id = Uuid::new_v4();

        let perf = fold_performance(user, PeriodType::Daily, d(3), &jobs, &[other]);
        assert_eq!(perf.total_points, 0);
        assert_eq!(perf.avg_time_rating, None);
    }

    #[test]
    fn approved_override_feeds_the_fold() {
        let user = Uuid::new_v4();
        let jobs = vec![job(user, TrackingStatus::Completed, Some(4.0), 0, false)];
        let mut r = rating_for(&jobs[0], 2, 0);
        r.override_value = Some(5);
        r.override_approved = Some(true);

        let perf = fold_performance(user, PeriodType::Daily, d(3), &jobs, &[r]);
        assert_eq!(perf.avg_time_rating, Some(5.0));
    }

    #[test]
    fn streaks_reset_on_imperfect_or_gap_days() {
        let counts = vec![
            (d(1), 2, 2),
            (d(2), 3, 3),
            (d(3), 2, 1), // imperfect day resets
            (d(4), 1, 1),
            (d(5), 1, 1),
            (d(7), 1, 1), // gap resets
        ];
        let s = compute_streaks(&counts);
        assert_eq!(s.current_streak_days, 1);
        assert_eq!(s.best_streak_days, 2);
    }

    #[test]
    fn streaks_empty_input() {
        let s = compute_streaks(&[]);
        assert_eq!(s.current_streak_days, 0);
        assert_eq!(s.best_streak_days, 0);
    }
}
