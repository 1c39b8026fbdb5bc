// db/ratingdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ratingmodel::JobRating;

#[async_trait]
pub trait RatingExt {
    /// One rating row per (job, participant); re-rating before review
    /// submission updates the human-entered fields in place.
    async fn upsert_rating(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        rated_by: Uuid,
        time_rating: i16,
        qc_rating: Option<i16>,
        cleaning_rating: Option<i16>,
        qc_voice: Option<String>,
    ) -> Result<JobRating, Error>;

    async fn get_rating(&self, rating_id: Uuid) -> Result<Option<JobRating>, Error>;

    async fn get_ratings_for_job(&self, job_id: Uuid) -> Result<Vec<JobRating>, Error>;

    async fn get_ratings_for_jobs(
        &self,
        job_ids: &[Uuid],
    ) -> Result<Vec<JobRating>, Error>;

    /// Record an override request; only one may be pending at a time.
    async fn request_override_cas(
        &self,
        rating_id: Uuid,
        new_value: i16,
        reason: String,
    ) -> Result<Option<JobRating>, Error>;

    /// Decide a pending override. None when no undecided override
    /// exists on the row.
    async fn decide_override_cas(
        &self,
        rating_id: Uuid,
        approved: bool,
    ) -> Result<Option<JobRating>, Error>;

    async fn add_bonus_points(
        &self,
        rating_id: Uuid,
        points: i32,
        reason: String,
    ) -> Result<JobRating, Error>;

    /// Raise a dispute; at most once per rating.
    async fn raise_dispute_cas(
        &self,
        rating_id: Uuid,
        reason: String,
    ) -> Result<Option<JobRating>, Error>;

    /// Resolve an open dispute, optionally revising the entered
    /// ratings. None when no open dispute exists.
    async fn resolve_dispute_cas(
        &self,
        rating_id: Uuid,
        resolution: String,
        revised_qc: Option<i16>,
        revised_cleaning: Option<i16>,
    ) -> Result<Option<JobRating>, Error>;
}

const RATING_COLUMNS: &str = r#"
    id, job_id, user_id, rated_by, time_rating, qc_rating, cleaning_rating,
    qc_voice, override_value, override_reason, override_approved,
    bonus_points, bonus_reason, dispute_raised, dispute_reason,
    dispute_resolved, dispute_resolution, created_at, updated_at
"#;

#[async_trait]
impl RatingExt for DBClient {
    async fn upsert_rating(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        rated_by: Uuid,
        time_rating: i16,
        qc_rating: Option<i16>,
        cleaning_rating: Option<i16>,
        qc_voice: Option<String>,
    ) -> Result<JobRating, Error> {
        sqlx::query_as::<_, JobRating>(&format!(
            r#"
            INSERT INTO job_ratings
            (job_id, user_id, rated_by, time_rating, qc_rating, cleaning_rating, qc_voice)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (job_id, user_id) DO UPDATE
            SET rated_by = EXCLUDED.rated_by,
                qc_rating = COALESCE(EXCLUDED.qc_rating, job_ratings.qc_rating),
                cleaning_rating = COALESCE(EXCLUDED.cleaning_rating, job_ratings.cleaning_rating),
                qc_voice = COALESCE(EXCLUDED.qc_voice, job_ratings.qc_voice),
                updated_at = NOW()
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(user_id)
        .bind(rated_by)
        .bind(time_rating)
        .bind(qc_rating)
        .bind(cleaning_rating)
        .bind(qc_voice)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_rating(&self, rating_id: Uuid) -> Result<Option<JobRating>, Error> {
        sqlx::query_as::<_, JobRating>(&format!(
            r#"
            SELECT {RATING_COLUMNS}
            FROM job_ratings
            WHERE id = $1
            "#
        ))
        .bind(rating_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_ratings_for_job(&self, job_id: Uuid) -> Result<Vec<JobRating>, Error> {
        sqlx::query_as::<_, JobRating>(&format!(
            r#"
            SELECT {RATING_COLUMNS}
            FROM job_ratings
            WHERE job_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_ratings_for_jobs(
        &self,
        job_ids: &[Uuid],
    ) -> Result<Vec<JobRating>, Error> {
        sqlx::query_as::<_, JobRating>(&format!(
            r#"
            SELECT {RATING_COLUMNS}
            FROM job_ratings
            WHERE job_id = ANY($1)
            ORDER BY created_at ASC
            "#
        ))
        .bind(job_ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn request_override_cas(
        &self,
        rating_id: Uuid,
        new_value: i16,
        reason: String,
    ) -> Result<Option<JobRating>, Error> {
        sqlx::query_as::<_, JobRating>(&format!(
            r#"
            UPDATE job_ratings
            SET override_value = $2,
                override_reason = $3,
                override_approved = NULL,
                updated_at = NOW()
            WHERE id = $1
              AND (override_value IS NULL OR override_approved IS NOT NULL)
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(rating_id)
        .bind(new_value)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
    }

    async fn decide_override_cas(
        &self,
        rating_id: Uuid,
        approved: bool,
    ) -> Result<Option<JobRating>, Error> {
        sqlx::query_as::<_, JobRating>(&format!(
            r#"
            UPDATE job_ratings
            SET override_approved = $2, updated_at = NOW()
            WHERE id = $1
              AND override_value IS NOT NULL
              AND override_approved IS NULL
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(rating_id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await
    }

    async fn add_bonus_points(
        &self,
        rating_id: Uuid,
        points: i32,
        reason: String,
    ) -> Result<JobRating, Error> {
        sqlx::query_as::<_, JobRating>(&format!(
            r#"
            UPDATE job_ratings
            SET bonus_points = bonus_points + $2,
                bonus_reason = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(rating_id)
        .bind(points)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
    }

    async fn raise_dispute_cas(
        &self,
        rating_id: Uuid,
        reason: String,
    ) -> Result<Option<JobRating>, Error> {
        sqlx::query_as::<_, JobRating>(&format!(
            r#"
            UPDATE job_ratings
            SET dispute_raised = TRUE, dispute_reason = $2, updated_at = NOW()
            WHERE id = $1 AND dispute_raised = FALSE
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(rating_id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
    }

    async fn resolve_dispute_cas(
        &self,
        rating_id: Uuid,
        resolution: String,
        revised_qc: Option<i16>,
        revised_cleaning: Option<i16>,
    ) -> Result<Option<JobRating>, Error> {
        sqlx::query_as::<_, JobRating>(&format!(
            r#"
            UPDATE job_ratings
            SET dispute_resolved = TRUE,
                dispute_resolution = $2,
                qc_rating = COALESCE($3, qc_rating),
                cleaning_rating = COALESCE($4, cleaning_rating),
                updated_at = NOW()
            WHERE id = $1 AND dispute_raised = TRUE AND dispute_resolved = FALSE
            RETURNING {RATING_COLUMNS}
            "#
        ))
        .bind(rating_id)
        .bind(resolution)
        .bind(revised_qc)
        .bind(revised_cleaning)
        .fetch_optional(&self.pool)
        .await
    }
}
