// db/performancedb.rs
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    performancemodel::{Performance, PeriodType},
    trackingmodel::JobTracking,
};

#[async_trait]
pub trait PerformanceExt {
    /// Users with any job activity in [start, end).
    async fn get_active_users_in_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Uuid>, Error>;

    async fn get_user_jobs_in_window(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<JobTracking>, Error>;

    /// Replace-not-increment upsert keyed by (user, period type,
    /// period start); re-running a window is idempotent.
    async fn upsert_performance(&self, perf: &Performance) -> Result<Performance, Error>;

    async fn get_performance(
        &self,
        user_id: Uuid,
        period_type: PeriodType,
        period_start: NaiveDate,
    ) -> Result<Option<Performance>, Error>;

    /// Per-day completed counts for a user over [start, end).
    async fn get_daily_completed_counts(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, i64)>, Error>;

    /// Per-day (assigned, completed) counts for a user over
    /// [start, end), for streak computation.
    async fn get_daily_assignment_counts(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, i64, i64)>, Error>;

    /// Team-wide averages over a window, for the comparison view.
    async fn get_team_averages(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Option<f64>, Option<f64>, Option<f64>), Error>;
}

const PERF_COLUMNS: &str = r#"
    id, user_id, period_type, period_start, jobs_assigned, jobs_completed,
    jobs_incomplete, jobs_carried_over, hours_worked, paused_minutes,
    avg_time_rating, avg_qc_rating, avg_cleaning_rating, total_points,
    computed_at
"#;

#[async_trait]
impl PerformanceExt for DBClient {
    async fn get_active_users_in_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Uuid>, Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT assigned_to
            FROM job_trackings
            WHERE job_date >= $1 AND job_date < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn get_user_jobs_in_window(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<JobTracking>, Error> {
        sqlx::query_as::<_, JobTracking>(
            r#"
            SELECT id, work_order, engineer_id, assigned_to, job_date, shift,
                   planned_hours, status, started_at, completed_at, paused_at,
                   total_paused_minutes, actual_hours, work_notes,
                   completion_photo, handover_voice, incomplete_reason,
                   incomplete_details, is_carry_over, original_job_id,
                   carry_over_count, auto_flagged, auto_flagged_at,
                   created_at, updated_at
            FROM job_trackings
            WHERE assigned_to = $1 AND job_date >= $2 AND job_date < $3
            ORDER BY job_date ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }

    async fn upsert_performance(&self, perf: &Performance) -> Result<Performance, Error> {
        sqlx::query_as::<_, Performance>(&format!(
            r#"
            INSERT INTO performances
            (user_id, period_type, period_start, jobs_assigned, jobs_completed,
             jobs_incomplete, jobs_carried_over, hours_worked, paused_minutes,
             avg_time_rating, avg_qc_rating, avg_cleaning_rating, total_points,
             computed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW())
            ON CONFLICT (user_id, period_type, period_start) DO UPDATE
            SET jobs_assigned = EXCLUDED.jobs_assigned,
                jobs_completed = EXCLUDED.jobs_completed,
                jobs_incomplete = EXCLUDED.jobs_incomplete,
                jobs_carried_over = EXCLUDED.jobs_carried_over,
                hours_worked = EXCLUDED.hours_worked,
                paused_minutes = EXCLUDED.paused_minutes,
                avg_time_rating = EXCLUDED.avg_time_rating,
                avg_qc_rating = EXCLUDED.avg_qc_rating,
                avg_cleaning_rating = EXCLUDED.avg_cleaning_rating,
                total_points = EXCLUDED.total_points,
                computed_at = NOW()
            RETURNING {PERF_COLUMNS}
            "#
        ))
        .bind(perf.user_id)
        .bind(perf.period_type)
        .bind(perf.period_start)
        .bind(perf.jobs_assigned)
        .bind(perf.jobs_completed)
        .bind(perf.jobs_incomplete)
        .bind(perf.jobs_carried_over)
        .bind(perf.hours_worked)
        .bind(perf.paused_minutes)
        .bind(perf.avg_time_rating)
        .bind(perf.avg_qc_rating)
        .bind(perf.avg_cleaning_rating)
        .bind(perf.total_points)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_performance(
        &self,
        user_id: Uuid,
        period_type: PeriodType,
        period_start: NaiveDate,
    ) -> Result<Option<Performance>, Error> {
        sqlx::query_as::<_, Performance>(&format!(
            r#"
            SELECT {PERF_COLUMNS}
            FROM performances
            WHERE user_id = $1 AND period_type = $2 AND period_start = $3
            "#
        ))
        .bind(user_id)
        .bind(period_type)
        .bind(period_start)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_daily_completed_counts(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, i64)>, Error> {
        sqlx::query_as(
            r#"
            SELECT job_date, COUNT(*) FILTER (WHERE status = 'completed')
            FROM job_trackings
            WHERE assigned_to = $1 AND job_date >= $2 AND job_date < $3
            GROUP BY job_date
            ORDER BY job_date ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_daily_assignment_counts(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, i64, i64)>, Error> {
        sqlx::query_as(
            r#"
            SELECT job_date,
                   COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'completed')
            FROM job_trackings
            WHERE assigned_to = $1 AND job_date >= $2 AND job_date < $3
            GROUP BY job_date
            ORDER BY job_date ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_team_averages(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Option<f64>, Option<f64>, Option<f64>), Error> {
        sqlx::query_as(
            r#"
            SELECT AVG(CASE
                         WHEN r.override_value IS NOT NULL AND r.override_approved = TRUE
                         THEN r.override_value::DOUBLE PRECISION
                         ELSE r.time_rating::DOUBLE PRECISION
                       END),
                   AVG(r.qc_rating::DOUBLE PRECISION),
                   AVG(r.cleaning_rating::DOUBLE PRECISION)
            FROM job_ratings r
            JOIN job_trackings j ON j.id = r.job_id
            WHERE j.job_date >= $1 AND j.job_date < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
    }
}
