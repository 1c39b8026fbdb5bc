// service/tracking_service.rs
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{
        db::DBClient, pausedb::PauseExt, ratingdb::RatingExt, trackingdb::TrackingExt,
    },
    models::{trackingmodel::*, ratingmodel::JobRating, usermodel::User},
    service::{
        clock::Clock,
        error::ServiceError,
        media_service::FileStore,
        notification_service::NotificationService,
        timeline,
    },
};

#[derive(Debug, Serialize)]
pub struct JobTrackingDetail {
    pub job: JobTracking,
    pub logs: Vec<JobLog>,
    pub pause_requests: Vec<PauseRequest>,
    pub ratings: Vec<JobRating>,
    pub carry_over: Option<CarryOver>,
    /// Derived from the open request; never stored.
    pub has_pending_pause: bool,
}

/// Response for a replayed pause command: the still-open request when
/// one exists, otherwise the most recent one, which is what the
/// original call produced. A replay after the pause was approved and
/// resumed is a no-op, not an error. Requests arrive oldest first.
fn replayed_pause_request(mut requests: Vec<PauseRequest>) -> Option<PauseRequest> {
    if let Some(open) = requests.iter().position(|r| r.is_open()) {
        return Some(requests.swap_remove(open));
    }
    requests.pop()
}

/// Owns the per-job state machine. Every transition is validated
/// against the persisted status with a compare-and-swap in the db
/// layer, so two racing writers get exactly one success.
#[derive(Debug, Clone)]
pub struct TrackingService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
    file_store: Arc<dyn FileStore>,
    clock: Arc<dyn Clock>,
}

impl TrackingService {
    pub fn new(
        db_client: Arc<DBClient>,
        notification_service: Arc<NotificationService>,
        file_store: Arc<dyn FileStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            file_store,
            clock,
        }
    }

    pub async fn assign_job(
        &self,
        actor: &User,
        work_order: String,
        engineer_id: Uuid,
        assigned_to: Uuid,
        job_date: NaiveDate,
        shift: ShiftType,
        planned_hours: f64,
    ) -> Result<JobTracking, ServiceError> {
        if !actor.role.can_review_pauses() {
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, Uuid::nil()));
        }

        let job = self
            .db_client
            .create_job_tracking(
                work_order,
                engineer_id,
                assigned_to,
                job_date,
                shift,
                planned_hours,
            )
            .await?;

        self.db_client
            .append_job_log(
                job.id,
                actor.id,
                JobEvent::Assigned,
                Some(serde_json::json!({ "assigned_to": assigned_to })),
            )
            .await?;

        Ok(job)
    }

    pub async fn start(
        &self,
        job_id: Uuid,
        actor: &User,
        idempotency_key: Option<&str>,
    ) -> Result<JobTracking, ServiceError> {
        let job = self.require_job(job_id).await?;
        self.require_participant(actor, &job)?;

        if !self.claim_command(idempotency_key, actor.id, job_id, "start").await? {
            return Ok(job);
        }

        let started = self
            .db_client
            .start_job_cas(job_id, self.clock.now())
            .await?;

        match started {
            Some(job) => {
                self.db_client
                    .append_job_log(job_id, actor.id, JobEvent::Started, None)
                    .await?;
                Ok(job)
            }
            None => Err(self.invalid_transition(job_id).await),
        }
    }

    pub async fn request_pause(
        &self,
        job_id: Uuid,
        actor: &User,
        reason: PauseReason,
        details: Option<String>,
        idempotency_key: Option<&str>,
    ) -> Result<PauseRequest, ServiceError> {
        let job = self.require_job(job_id).await?;
        self.require_participant(actor, &job)?;

        if job.status != TrackingStatus::InProgress {
            return Err(ServiceError::InvalidTransition {
                job_id,
                current: job.status,
            });
        }

        if let Some(key) = idempotency_key {
            if !self
                .db_client
                .record_command(key, actor.id, job_id, "request_pause")
                .await?
            {
                let requests = self.db_client.get_pause_requests_for_job(job_id).await?;
                return replayed_pause_request(requests)
                    .ok_or(ServiceError::PauseAlreadyPending(job_id));
            }
        }

        // The request does not change job status; elapsed time keeps
        // accruing until a reviewer approves and the worker resumes.
        let request = match self
            .db_client
            .create_pause_request(job_id, actor.id, reason, details)
            .await?
        {
            Some(request) => request,
            // The insert re-checks both guards itself; distinguish an
            // already-open request from a job that left in_progress
            // since the read above.
            None => {
                if self
                    .db_client
                    .get_open_pause_request(job_id)
                    .await?
                    .is_some()
                {
                    return Err(ServiceError::PauseAlreadyPending(job_id));
                }
                return Err(self.invalid_transition(job_id).await);
            }
        };

        self.db_client
            .append_job_log(
                job_id,
                actor.id,
                JobEvent::PauseRequested,
                Some(serde_json::json!({
                    "request_id": request.id,
                    "reason": request.reason,
                })),
            )
            .await?;

        self.notification_service
            .notify_pause_requested(job.engineer_id, &job, &request)
            .await?;

        Ok(request)
    }

    pub async fn resume(
        &self,
        job_id: Uuid,
        actor: &User,
        idempotency_key: Option<&str>,
    ) -> Result<JobTracking, ServiceError> {
        let job = self.require_job(job_id).await?;
        self.require_participant(actor, &job)?;

        if !self.claim_command(idempotency_key, actor.id, job_id, "resume").await? {
            return Ok(job);
        }

        // Exactly one approved-but-unresumed request must exist; the
        // CAS matches it or nothing.
        let closed = self
            .db_client
            .resume_pause_cas(job_id, self.clock.now())
            .await?
            .ok_or(ServiceError::NoActivePause(job_id))?;

        let charged = closed.duration_minutes.unwrap_or(0);
        let job = self.db_client.apply_resume(job_id, charged).await?;

        self.db_client
            .append_job_log(
                job_id,
                actor.id,
                JobEvent::Resumed,
                Some(serde_json::json!({
                    "request_id": closed.id,
                    "charged_minutes": charged,
                })),
            )
            .await?;

        Ok(job)
    }

    pub async fn complete(
        &self,
        job_id: Uuid,
        actor: &User,
        work_notes: Option<String>,
        completion_photo_b64: Option<String>,
        idempotency_key: Option<&str>,
    ) -> Result<JobTracking, ServiceError> {
        let job = self.require_job(job_id).await?;
        self.require_participant(actor, &job)?;
        self.require_no_open_pause(&job).await?;

        if !self.claim_command(idempotency_key, actor.id, job_id, "complete").await? {
            return Ok(job);
        }

        let photo_ref = match completion_photo_b64 {
            Some(b64) => Some(self.file_store.store_photo(&b64).await?),
            None => None,
        };

        let now = self.clock.now();
        let started_at = job.started_at.ok_or(ServiceError::InvalidTransition {
            job_id,
            current: job.status,
        })?;
        let hours = timeline::actual_hours(started_at, now, job.total_paused_minutes);

        let completed = self
            .db_client
            .complete_job_cas(job_id, now, hours, work_notes, photo_ref)
            .await?;

        match completed {
            Some(job) => {
                self.db_client
                    .append_job_log(
                        job_id,
                        actor.id,
                        JobEvent::Completed,
                        Some(serde_json::json!({ "actual_hours": hours })),
                    )
                    .await?;
                Ok(job)
            }
            None => Err(self.invalid_transition(job_id).await),
        }
    }

    pub async fn mark_incomplete(
        &self,
        job_id: Uuid,
        actor: &User,
        reason: IncompleteReason,
        details: Option<String>,
        handover_voice_b64: Option<String>,
        idempotency_key: Option<&str>,
    ) -> Result<JobTracking, ServiceError> {
        let job = self.require_job(job_id).await?;
        self.require_participant(actor, &job)?;
        self.require_no_open_pause(&job).await?;

        if !self
            .claim_command(idempotency_key, actor.id, job_id, "mark_incomplete")
            .await?
        {
            return Ok(job);
        }

        let voice_ref = match handover_voice_b64 {
            Some(b64) => Some(self.file_store.store_voice(&b64).await?),
            None => None,
        };

        let now = self.clock.now();
        let started_at = job.started_at.ok_or(ServiceError::InvalidTransition {
            job_id,
            current: job.status,
        })?;
        let hours = timeline::actual_hours(started_at, now, job.total_paused_minutes);

        let marked = self
            .db_client
            .mark_incomplete_cas(job_id, now, hours, reason, details, voice_ref)
            .await?;

        match marked {
            Some(job) => {
                self.db_client
                    .append_job_log(
                        job_id,
                        actor.id,
                        JobEvent::MarkedIncomplete,
                        Some(serde_json::json!({
                            "reason": reason,
                            "hours_spent": hours,
                        })),
                    )
                    .await?;
                Ok(job)
            }
            None => Err(self.invalid_transition(job_id).await),
        }
    }

    pub async fn consume_materials(
        &self,
        job_id: Uuid,
        actor: &User,
        items: serde_json::Value,
    ) -> Result<JobLog, ServiceError> {
        let job = self.require_job(job_id).await?;
        self.require_participant(actor, &job)?;

        let log = self
            .db_client
            .append_job_log(
                job_id,
                actor.id,
                JobEvent::MaterialsConsumed,
                Some(items),
            )
            .await?;

        Ok(log)
    }

    pub async fn get_job_detail(
        &self,
        job_id: Uuid,
    ) -> Result<JobTrackingDetail, ServiceError> {
        let job = self.require_job(job_id).await?;
        let logs = self.db_client.get_job_logs(job_id).await?;
        let pause_requests = self.db_client.get_pause_requests_for_job(job_id).await?;
        let ratings = self.db_client.get_ratings_for_job(job_id).await?;
        let carry_over = self.db_client.get_carry_over_by_original(job_id).await?;
        let has_pending_pause = pause_requests.iter().any(|p| p.is_open());

        Ok(JobTrackingDetail {
            job,
            logs,
            pause_requests,
            ratings,
            carry_over,
            has_pending_pause,
        })
    }

    async fn require_job(&self, job_id: Uuid) -> Result<JobTracking, ServiceError> {
        self.db_client
            .get_job_tracking(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    fn require_participant(
        &self,
        actor: &User,
        job: &JobTracking,
    ) -> Result<(), ServiceError> {
        let involved = actor.id == job.assigned_to
            || actor.id == job.engineer_id
            || actor.role.is_admin();
        if !involved {
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, job.id));
        }
        Ok(())
    }

    /// A job with an open pause request can never reach a terminal
    /// status.
    async fn require_no_open_pause(&self, job: &JobTracking) -> Result<(), ServiceError> {
        if self
            .db_client
            .get_open_pause_request(job.id)
            .await?
            .is_some()
        {
            return Err(ServiceError::InvalidTransition {
                job_id: job.id,
                current: job.status,
            });
        }
        Ok(())
    }

    /// Returns true when the command should be applied: either no key
    /// was supplied, or the key is fresh. A replayed key is a no-op.
    async fn claim_command(
        &self,
        key: Option<&str>,
        actor_id: Uuid,
        job_id: Uuid,
        command: &str,
    ) -> Result<bool, ServiceError> {
        match key {
            Some(key) => Ok(self
                .db_client
                .record_command(key, actor_id, job_id, command)
                .await?),
            None => Ok(true),
        }
    }

    async fn invalid_transition(&self, job_id: Uuid) -> ServiceError {
        match self.db_client.get_job_tracking(job_id).await {
            Ok(Some(job)) => ServiceError::InvalidTransition {
                job_id,
                current: job.status,
            },
            Ok(None) => ServiceError::JobNotFound(job_id),
            Err(e) => ServiceError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::replayed_pause_request;
    use crate::models::trackingmodel::{PauseReason, PauseRequest, PauseStatus, TrackingStatus};

    fn pause(status: PauseStatus, resumed: bool) -> PauseRequest {
        let now = Utc::now();
        PauseRequest {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            requested_by: Uuid::new_v4(),
            reason: PauseReason::MaterialShortage,
            details: None,
            status,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            resumed_at: resumed.then_some(now),
            duration_minutes: resumed.then_some(10),
            created_at: Some(now),
        }
    }

    #[test]
    fn replay_returns_the_open_request_when_one_exists() {
        let open = pause(PauseStatus::Pending, false);
        let requests = vec![pause(PauseStatus::Rejected, false), open.clone()];

        let replayed = replayed_pause_request(requests).unwrap();
        assert_eq!(replayed.id, open.id);
    }

    #[test]
    fn replay_after_approval_and_resume_returns_the_closed_request() {
        // The command already ran to completion; replaying it must not
        // surface a pending-pause conflict.
        let closed = pause(PauseStatus::Approved, true);
        let requests = vec![pause(PauseStatus::Rejected, false), closed.clone()];

        let replayed = replayed_pause_request(requests).unwrap();
        assert_eq!(replayed.id, closed.id);
        assert!(replayed.resumed_at.is_some());
    }

    #[test]
    fn replay_with_no_requests_is_empty() {
        assert!(replayed_pause_request(Vec::new()).is_none());
    }

    #[test]
    fn transition_table_matches_lifecycle() {
        use TrackingStatus::*;

        assert!(NotStarted.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Incomplete));

        // Duplicate or out-of-order calls are illegal.
        assert!(!NotStarted.can_transition_to(Completed));
        assert!(!NotStarted.can_transition_to(Incomplete));
        assert!(!InProgress.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Incomplete));
        assert!(!Incomplete.can_transition_to(Completed));
    }

    #[test]
    fn terminal_statuses() {
        assert!(TrackingStatus::Completed.is_terminal());
        assert!(TrackingStatus::Incomplete.is_terminal());
        assert!(!TrackingStatus::NotStarted.is_terminal());
        assert!(!TrackingStatus::InProgress.is_terminal());
    }
}
