// db/reviewdb.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{ratingmodel::DailyReview, trackingmodel::ShiftType};

#[async_trait]
pub trait ReviewExt {
    /// Materialize the review row for (engineer, date, shift) on first
    /// access.
    async fn get_or_create_daily_review(
        &self,
        engineer_id: Uuid,
        review_date: NaiveDate,
        shift: ShiftType,
    ) -> Result<DailyReview, Error>;

    async fn get_daily_review(&self, review_id: Uuid)
        -> Result<Option<DailyReview>, Error>;

    /// Flip to submitted; only matches a row still `open`, so a second
    /// submit attempt returns None.
    async fn submit_review_cas(
        &self,
        review_id: Uuid,
        submitted_at: DateTime<Utc>,
    ) -> Result<Option<DailyReview>, Error>;

    /// The submitted review covering a job's (engineer, date, shift)
    /// key, if any. Used to freeze rate/override calls after sign-off.
    async fn get_submitted_review_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Option<DailyReview>, Error>;
}

const REVIEW_COLUMNS: &str = r#"
    id, engineer_id, review_date, shift, status, submitted_at,
    created_at, updated_at
"#;

#[async_trait]
impl ReviewExt for DBClient {
    async fn get_or_create_daily_review(
        &self,
        engineer_id: Uuid,
        review_date: NaiveDate,
        shift: ShiftType,
    ) -> Result<DailyReview, Error> {
        sqlx::query_as::<_, DailyReview>(&format!(
            r#"
            INSERT INTO daily_reviews (engineer_id, review_date, shift)
            VALUES ($1, $2, $3)
            ON CONFLICT (engineer_id, review_date, shift)
            DO UPDATE SET updated_at = NOW()
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(engineer_id)
        .bind(review_date)
        .bind(shift)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_daily_review(
        &self,
        review_id: Uuid,
    ) -> Result<Option<DailyReview>, Error> {
        sqlx::query_as::<_, DailyReview>(&format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM daily_reviews
            WHERE id = $1
            "#
        ))
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn submit_review_cas(
        &self,
        review_id: Uuid,
        submitted_at: DateTime<Utc>,
    ) -> Result<Option<DailyReview>, Error> {
        sqlx::query_as::<_, DailyReview>(&format!(
            r#"
            UPDATE daily_reviews
            SET status = 'submitted', submitted_at = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'open'
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(review_id)
        .bind(submitted_at)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_submitted_review_for_job(
        &self,
        job_id: Uuid,
    ) -> Result<Option<DailyReview>, Error> {
        sqlx::query_as::<_, DailyReview>(
            r#"
            SELECT r.id, r.engineer_id, r.review_date, r.shift, r.status,
                   r.submitted_at, r.created_at, r.updated_at
            FROM daily_reviews r
            JOIN job_trackings j
              ON j.engineer_id = r.engineer_id
             AND j.job_date = r.review_date
             AND j.shift = r.shift
            WHERE j.id = $1 AND r.status = 'submitted'
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }
}
