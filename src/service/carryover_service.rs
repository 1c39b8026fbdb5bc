// service/carryover_service.rs
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, trackingdb::TrackingExt},
    models::{trackingmodel::*, usermodel::User},
    service::{
        clock::Clock, error::ServiceError, media_service::FileStore,
        notification_service::NotificationService,
    },
};

/// Preconditions for deferring a job. Only an incomplete job may be
/// carried over, at most once, and never past the chain limit.
fn carry_over_blockers(
    original: &JobTracking,
    has_existing_link: bool,
    limit: i32,
) -> Result<(), ServiceError> {
    if original.status != TrackingStatus::Incomplete {
        return Err(ServiceError::InvalidTransition {
            job_id: original.id,
            current: original.status,
        });
    }

    if has_existing_link {
        return Err(ServiceError::CarryOverAlreadyExists(original.id));
    }

    if original.carry_over_count >= limit {
        return Err(ServiceError::CarryOverLimitExceeded {
            job_id: original.id,
            count: original.carry_over_count,
            limit,
        });
    }

    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CarryOverResult {
    pub original_job: JobTracking,
    pub new_job: JobTracking,
    pub link: CarryOver,
}

/// Converts an incomplete job into a fresh job instance for the next
/// day, preserving linkage and hand-off context. Carry-over is an
/// explicit engineer decision, never an automatic consequence of
/// marking a job incomplete.
#[derive(Debug, Clone)]
pub struct CarryOverService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
    file_store: Arc<dyn FileStore>,
    clock: Arc<dyn Clock>,
    carry_over_limit: i32,
}

impl CarryOverService {
    pub fn new(
        db_client: Arc<DBClient>,
        notification_service: Arc<NotificationService>,
        file_store: Arc<dyn FileStore>,
        clock: Arc<dyn Clock>,
        carry_over_limit: i32,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            file_store,
            clock,
            carry_over_limit,
        }
    }

    pub async fn create_carry_over(
        &self,
        original_job_id: Uuid,
        actor: &User,
        reason: IncompleteReason,
        details: Option<String>,
        engineer_voice_b64: Option<String>,
        reassign_to: Option<Uuid>,
    ) -> Result<CarryOverResult, ServiceError> {
        let original = self
            .db_client
            .get_job_tracking(original_job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(original_job_id))?;

        let can_defer = actor.role.is_admin() || actor.id == original.engineer_id;
        if !can_defer {
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, original.id));
        }

        let has_existing_link = self
            .db_client
            .get_carry_over_by_original(original_job_id)
            .await?
            .is_some();
        carry_over_blockers(&original, has_existing_link, self.carry_over_limit)?;

        let voice_ref = match engineer_voice_b64 {
            Some(b64) => Some(self.file_store.store_voice(&b64).await?),
            None => None,
        };

        let hours_spent = original.actual_hours.unwrap_or(0.0);
        let new_date = self.clock.now().date_naive() + Duration::days(1);

        let (new_job, link) = self
            .db_client
            .create_carry_over(
                &original,
                actor.id,
                reason,
                details,
                voice_ref,
                hours_spent,
                new_date,
                reassign_to,
            )
            .await?;

        self.db_client
            .append_job_log(
                original.id,
                actor.id,
                JobEvent::CarriedOver,
                Some(serde_json::json!({
                    "new_job_id": new_job.id,
                    "carry_over_count": new_job.carry_over_count,
                })),
            )
            .await?;

        self.notification_service
            .notify_carry_over_created(new_job.assigned_to, &new_job)
            .await?;

        Ok(CarryOverResult {
            original_job: original,
            new_job,
            link,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::carry_over_blockers;
    use crate::{
        models::trackingmodel::{JobTracking, ShiftType, TrackingStatus},
        service::error::ServiceError,
    };

    fn job(status: TrackingStatus, carry_over_count: i32) -> JobTracking {
        JobTracking {
            id: Uuid::new_v4(),
            work_order: "Pump P-204 seal replacement".to_string(),
            engineer_id: Uuid::new_v4(),
            assigned_to: Uuid::new_v4(),
            job_date: Utc::now().date_naive(),
            shift: ShiftType::Day,
            planned_hours: 4.0,
            status,
            started_at: None,
            completed_at: None,
            paused_at: None,
            total_paused_minutes: 0,
            actual_hours: None,
            work_notes: None,
            completion_photo: None,
            handover_voice: None,
            incomplete_reason: None,
            incomplete_details: None,
            is_carry_over: false,
            original_job_id: None,
            carry_over_count,
            auto_flagged: false,
            auto_flagged_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn only_incomplete_jobs_can_be_carried_over() {
        for status in [
            TrackingStatus::NotStarted,
            TrackingStatus::InProgress,
            TrackingStatus::Completed,
        ] {
            let original = job(status, 0);
            match carry_over_blockers(&original, false, 3) {
                Err(ServiceError::InvalidTransition { job_id, current }) => {
                    assert_eq!(job_id, original.id);
                    assert_eq!(current, status);
                }
                other => panic!("expected InvalidTransition, got {:?}", other),
            }
        }
    }

    #[test]
    fn a_job_can_be_carried_over_only_once() {
        let original = job(TrackingStatus::Incomplete, 0);
        match carry_over_blockers(&original, true, 3) {
            Err(ServiceError::CarryOverAlreadyExists(job_id)) => {
                assert_eq!(job_id, original.id)
            }
            other => panic!("expected CarryOverAlreadyExists, got {:?}", other),
        }
    }

    #[test]
    fn chain_at_the_limit_is_rejected() {
        let original = job(TrackingStatus::Incomplete, 3);
        match carry_over_blockers(&original, false, 3) {
            Err(ServiceError::CarryOverLimitExceeded {
                job_id,
                count,
                limit,
            }) => {
                assert_eq!(job_id, original.id);
                assert_eq!(count, 3);
                assert_eq!(limit, 3);
            }
            other => panic!("expected CarryOverLimitExceeded, got {:?}", other),
        }
    }

    #[test]
    fn incomplete_job_under_the_limit_passes() {
        let original = job(TrackingStatus::Incomplete, 2);
        assert!(carry_over_blockers(&original, false, 3).is_ok());
    }
}
