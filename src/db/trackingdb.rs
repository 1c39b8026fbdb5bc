// db/trackingdb.rs
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::trackingmodel::*;

#[async_trait]
pub trait TrackingExt {
    async fn create_job_tracking(
        &self,
        work_order: String,
        engineer_id: Uuid,
        assigned_to: Uuid,
        job_date: NaiveDate,
        shift: ShiftType,
        planned_hours: f64,
    ) -> Result<JobTracking, Error>;

    async fn get_job_tracking(&self, job_id: Uuid) -> Result<Option<JobTracking>, Error>;

    async fn get_jobs_for_shift(
        &self,
        engineer_id: Uuid,
        job_date: NaiveDate,
        shift: ShiftType,
    ) -> Result<Vec<JobTracking>, Error>;

    /// Compare-and-swap start: succeeds only if the row is still
    /// `not_started`. Returns None when another writer got there first
    /// or the job never existed.
    async fn start_job_cas(
        &self,
        job_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<Option<JobTracking>, Error>;

    /// Compare-and-swap completion from `in_progress`.
    async fn complete_job_cas(
        &self,
        job_id: Uuid,
        completed_at: DateTime<Utc>,
        actual_hours: f64,
        work_notes: Option<String>,
        completion_photo: Option<String>,
    ) -> Result<Option<JobTracking>, Error>;

    /// Compare-and-swap incomplete from `in_progress`.
    async fn mark_incomplete_cas(
        &self,
        job_id: Uuid,
        ended_at: DateTime<Utc>,
        actual_hours: f64,
        reason: IncompleteReason,
        details: Option<String>,
        handover_voice: Option<String>,
    ) -> Result<Option<JobTracking>, Error>;

    /// Stamp `paused_at` when a pause request is approved.
    async fn stamp_paused_at(
        &self,
        job_id: Uuid,
        paused_at: DateTime<Utc>,
    ) -> Result<JobTracking, Error>;

    /// Add charged pause minutes on resume and clear `paused_at`.
    /// `total_paused_minutes` only ever grows.
    async fn apply_resume(
        &self,
        job_id: Uuid,
        charged_minutes: i32,
    ) -> Result<JobTracking, Error>;

    /// One sweep statement: advisory-flag every in-progress job whose
    /// active elapsed minutes exceed planned_hours * multiplier.
    /// Already-flagged jobs are excluded, so re-running is a no-op.
    async fn flag_overrun_jobs(
        &self,
        now: DateTime<Utc>,
        multiplier: f64,
    ) -> Result<Vec<JobTracking>, Error>;

    async fn append_job_log(
        &self,
        job_id: Uuid,
        actor_id: Uuid,
        event: JobEvent,
        payload: Option<serde_json::Value>,
    ) -> Result<JobLog, Error>;

    async fn get_job_logs(&self, job_id: Uuid) -> Result<Vec<JobLog>, Error>;

    /// Record a client idempotency key. Returns false when the key was
    /// seen before, in which case the command must not be re-applied.
    async fn record_command(
        &self,
        idempotency_key: &str,
        actor_id: Uuid,
        job_id: Uuid,
        command: &str,
    ) -> Result<bool, Error>;

    async fn get_carry_over_by_original(
        &self,
        original_job_id: Uuid,
    ) -> Result<Option<CarryOver>, Error>;

    /// Create the continuation job and its immutable link row in one
    /// transaction.
    async fn create_carry_over(
        &self,
        original: &JobTracking,
        created_by: Uuid,
        reason: IncompleteReason,
        details: Option<String>,
        handover_voice: Option<String>,
        hours_spent: f64,
        new_date: NaiveDate,
        reassign_to: Option<Uuid>,
    ) -> Result<(JobTracking, CarryOver), Error>;
}

const JOB_COLUMNS: &str = r#"
    id, work_order, engineer_id, assigned_to, job_date, shift, planned_hours,
    status, started_at, completed_at, paused_at, total_paused_minutes,
    actual_hours, work_notes, completion_photo, handover_voice,
    incomplete_reason, incomplete_details, is_carry_over, original_job_id,
    carry_over_count, auto_flagged, auto_flagged_at, created_at, updated_at
"#;

/// Guard shared by the terminal-transition statements. The service
/// checks for an open pause before calling, but that read races with a
/// concurrent pause insert; repeating the predicate inside the UPDATE
/// makes the database arbitrate, so a job can never go terminal while
/// an open request exists.
const NO_OPEN_PAUSE_GUARD: &str = r#"
              AND NOT EXISTS (
                  SELECT 1 FROM pause_requests
                  WHERE job_id = $1
                    AND status IN ('pending', 'approved')
                    AND resumed_at IS NULL
              )"#;

fn complete_job_sql() -> String {
    format!(
        r#"
        UPDATE job_trackings
        SET status = 'completed',
            completed_at = $2,
            actual_hours = $3,
            work_notes = COALESCE($4, work_notes),
            completion_photo = COALESCE($5, completion_photo),
            updated_at = NOW()
        WHERE id = $1 AND status = 'in_progress'{NO_OPEN_PAUSE_GUARD}
        RETURNING {JOB_COLUMNS}
        "#
    )
}

fn mark_incomplete_sql() -> String {
    format!(
        r#"
        UPDATE job_trackings
        SET status = 'incomplete',
            completed_at = $2,
            actual_hours = $3,
            incomplete_reason = $4,
            incomplete_details = $5,
            handover_voice = COALESCE($6, handover_voice),
            updated_at = NOW()
        WHERE id = $1 AND status = 'in_progress'{NO_OPEN_PAUSE_GUARD}
        RETURNING {JOB_COLUMNS}
        "#
    )
}

#[async_trait]
impl TrackingExt for DBClient {
    async fn create_job_tracking(
        &self,
        work_order: String,
        engineer_id: Uuid,
        assigned_to: Uuid,
        job_date: NaiveDate,
        shift: ShiftType,
        planned_hours: f64,
    ) -> Result<JobTracking, Error> {
        sqlx::query_as::<_, JobTracking>(&format!(
            r#"
            INSERT INTO job_trackings
            (work_order, engineer_id, assigned_to, job_date, shift, planned_hours)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(work_order)
        .bind(engineer_id)
        .bind(assigned_to)
        .bind(job_date)
        .bind(shift)
        .bind(planned_hours)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_job_tracking(&self, job_id: Uuid) -> Result<Option<JobTracking>, Error> {
        sqlx::query_as::<_, JobTracking>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM job_trackings
            WHERE id = $1
            "#
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_jobs_for_shift(
        &self,
        engineer_id: Uuid,
        job_date: NaiveDate,
        shift: ShiftType,
    ) -> Result<Vec<JobTracking>, Error> {
        sqlx::query_as::<_, JobTracking>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM job_trackings
            WHERE engineer_id = $1 AND job_date = $2 AND shift = $3
            ORDER BY created_at ASC
            "#
        ))
        .bind(engineer_id)
        .bind(job_date)
        .bind(shift)
        .fetch_all(&self.pool)
        .await
    }

    async fn start_job_cas(
        &self,
        job_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<Option<JobTracking>, Error> {
        sqlx::query_as::<_, JobTracking>(&format!(
            r#"
            UPDATE job_trackings
            SET status = 'in_progress', started_at = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'not_started'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(started_at)
        .fetch_optional(&self.pool)
        .await
    }

    async fn complete_job_cas(
        &self,
        job_id: Uuid,
        completed_at: DateTime<Utc>,
        actual_hours: f64,
        work_notes: Option<String>,
        completion_photo: Option<String>,
    ) -> Result<Option<JobTracking>, Error> {
        sqlx::query_as::<_, JobTracking>(&complete_job_sql())
        .bind(job_id)
        .bind(completed_at)
        .bind(actual_hours)
        .bind(work_notes)
        .bind(completion_photo)
        .fetch_optional(&self.pool)
        .await
    }

    async fn mark_incomplete_cas(
        &self,
        job_id: Uuid,
        ended_at: DateTime<Utc>,
        actual_hours: f64,
        reason: IncompleteReason,
        details: Option<String>,
        handover_voice: Option<String>,
    ) -> Result<Option<JobTracking>, Error> {
        sqlx::query_as::<_, JobTracking>(&mark_incomplete_sql())
        .bind(job_id)
        .bind(ended_at)
        .bind(actual_hours)
        .bind(reason)
        .bind(details)
        .bind(handover_voice)
        .fetch_optional(&self.pool)
        .await
    }

    async fn stamp_paused_at(
        &self,
        job_id: Uuid,
        paused_at: DateTime<Utc>,
    ) -> Result<JobTracking, Error> {
        sqlx::query_as::<_, JobTracking>(&format!(
            r#"
            UPDATE job_trackings
            SET paused_at = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(paused_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn apply_resume(
        &self,
        job_id: Uuid,
        charged_minutes: i32,
    ) -> Result<JobTracking, Error> {
        sqlx::query_as::<_, JobTracking>(&format!(
            r#"
            UPDATE job_trackings
            SET total_paused_minutes = total_paused_minutes + GREATEST($2, 0),
                paused_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(charged_minutes)
        .fetch_one(&self.pool)
        .await
    }

    async fn flag_overrun_jobs(
        &self,
        now: DateTime<Utc>,
        multiplier: f64,
    ) -> Result<Vec<JobTracking>, Error> {
        sqlx::query_as::<_, JobTracking>(&format!(
            r#"
            UPDATE job_trackings
            SET auto_flagged = TRUE, auto_flagged_at = $1, updated_at = NOW()
            WHERE status = 'in_progress'
              AND auto_flagged = FALSE
              AND started_at IS NOT NULL
              AND planned_hours > 0
              AND (EXTRACT(EPOCH FROM ($1 - started_at)) / 60.0 - total_paused_minutes)
                  > planned_hours * 60.0 * $2
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(multiplier)
        .fetch_all(&self.pool)
        .await
    }

    async fn append_job_log(
        &self,
        job_id: Uuid,
        actor_id: Uuid,
        event: JobEvent,
        payload: Option<serde_json::Value>,
    ) -> Result<JobLog, Error> {
        sqlx::query_as::<_, JobLog>(
            r#"
            INSERT INTO job_logs (job_id, actor_id, event, payload)
            VALUES ($1, $2, $3, $4)
            RETURNING id, job_id, actor_id, event, payload, created_at
            "#,
        )
        .bind(job_id)
        .bind(actor_id)
        .bind(event)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_job_logs(&self, job_id: Uuid) -> Result<Vec<JobLog>, Error> {
        sqlx::query_as::<_, JobLog>(
            r#"
            SELECT id, job_id, actor_id, event, payload, created_at
            FROM job_logs
            WHERE job_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn record_command(
        &self,
        idempotency_key: &str,
        actor_id: Uuid,
        job_id: Uuid,
        command: &str,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO command_log (idempotency_key, actor_id, job_id, command)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (idempotency_key) DO NOTHING
            "#,
        )
        .bind(idempotency_key)
        .bind(actor_id)
        .bind(job_id)
        .bind(command)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_carry_over_by_original(
        &self,
        original_job_id: Uuid,
    ) -> Result<Option<CarryOver>, Error> {
        sqlx::query_as::<_, CarryOver>(
            r#"
            SELECT id, original_job_id, new_job_id, created_by, reason, details,
                   handover_voice, hours_spent, created_at
            FROM carry_overs
            WHERE original_job_id = $1
            "#,
        )
        .bind(original_job_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_carry_over(
        &self,
        original: &JobTracking,
        created_by: Uuid,
        reason: IncompleteReason,
        details: Option<String>,
        handover_voice: Option<String>,
        hours_spent: f64,
        new_date: NaiveDate,
        reassign_to: Option<Uuid>,
    ) -> Result<(JobTracking, CarryOver), Error> {
        let mut tx = self.pool.begin().await?;

        let new_job = sqlx::query_as::<_, JobTracking>(&format!(
            r#"
            INSERT INTO job_trackings
            (work_order, engineer_id, assigned_to, job_date, shift, planned_hours,
             is_carry_over, original_job_id, carry_over_count)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $8)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&original.work_order)
        .bind(original.engineer_id)
        .bind(reassign_to.unwrap_or(original.assigned_to))
        .bind(new_date)
        .bind(original.shift)
        .bind(original.planned_hours)
        .bind(original.id)
        .bind(original.carry_over_count + 1)
        .fetch_one(&mut *tx)
        .await?;

        // UNIQUE (original_job_id) makes a second link insert fail the
        // whole transaction, so racing callers cannot fork the chain.
        let link = sqlx::query_as::<_, CarryOver>(
            r#"
            INSERT INTO carry_overs
            (original_job_id, new_job_id, created_by, reason, details,
             handover_voice, hours_spent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, original_job_id, new_job_id, created_by, reason, details,
                      handover_voice, hours_spent, created_at
            "#,
        )
        .bind(original.id)
        .bind(new_job.id)
        .bind(created_by)
        .bind(reason)
        .bind(details)
        .bind(handover_voice)
        .bind(hours_spent)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((new_job, link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Both terminal transitions must let the database re-check the
    // open-pause predicate inside the UPDATE itself; a service-layer
    // read alone races with a concurrent pause insert.
    #[test]
    fn terminal_transitions_exclude_jobs_with_open_pauses() {
        for sql in [complete_job_sql(), mark_incomplete_sql()] {
            assert!(sql.contains("status = 'in_progress'"));
            assert!(sql.contains("NOT EXISTS"));
            assert!(sql.contains("FROM pause_requests"));
            assert!(sql.contains("resumed_at IS NULL"));
        }
    }
}
