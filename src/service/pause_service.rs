// service/pause_service.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, pausedb::PauseExt, trackingdb::TrackingExt},
    models::{trackingmodel::*, usermodel::User},
    service::{clock::Clock, error::ServiceError, notification_service::NotificationService},
};

/// Adjudicates pause requests. Exactly one decision is accepted per
/// request; the compare-and-swap on `status = 'pending'` protects two
/// reviewers racing on the same notification.
#[derive(Debug, Clone)]
pub struct PauseService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
}

impl PauseService {
    pub fn new(
        db_client: Arc<DBClient>,
        notification_service: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            clock,
        }
    }

    pub async fn review_pause(
        &self,
        request_id: Uuid,
        reviewer: &User,
        approve: bool,
        notes: Option<String>,
    ) -> Result<PauseRequest, ServiceError> {
        let request = self
            .db_client
            .get_pause_request(request_id)
            .await?
            .ok_or(ServiceError::PauseRequestNotFound(request_id))?;

        let job = self
            .db_client
            .get_job_tracking(request.job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(request.job_id))?;

        let can_review =
            reviewer.role.is_admin() || reviewer.id == job.engineer_id;
        if !can_review {
            return Err(ServiceError::UnauthorizedJobAccess(reviewer.id, job.id));
        }

        let decision = if approve {
            PauseStatus::Approved
        } else {
            PauseStatus::Rejected
        };
        let now = self.clock.now();

        let reviewed = self
            .db_client
            .review_pause_cas(request_id, reviewer.id, decision, notes, now)
            .await?
            .ok_or(ServiceError::AlreadyReviewed(request_id))?;

        let event = if approve {
            // The approval moment is where the billable clock stops;
            // duration is charged from here once the worker resumes.
            self.db_client.stamp_paused_at(job.id, now).await?;
            JobEvent::PauseApproved
        } else {
            // Rejected requests contribute zero paused minutes and the
            // job stays fully in progress.
            JobEvent::PauseRejected
        };

        self.db_client
            .append_job_log(
                job.id,
                reviewer.id,
                event,
                Some(serde_json::json!({ "request_id": request_id })),
            )
            .await?;

        self.notification_service
            .notify_pause_reviewed(request.requested_by, &job, &reviewed, approve)
            .await?;

        Ok(reviewed)
    }
}
