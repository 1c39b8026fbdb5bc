// service/rating_service.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{
        db::DBClient, ratingdb::RatingExt, reviewdb::ReviewExt, trackingdb::TrackingExt,
    },
    models::{ratingmodel::JobRating, usermodel::User},
    service::{
        error::ServiceError, media_service::FileStore,
        notification_service::NotificationService, timeline,
    },
};

/// Ratings, overrides and disputes. Time rating is machine computed
/// from planned-vs-actual hours; QC and cleaning are human entered.
/// Overrides only take effect after an admin approves them.
#[derive(Debug, Clone)]
pub struct RatingService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
    file_store: Arc<dyn FileStore>,
}

impl RatingService {
    pub fn new(
        db_client: Arc<DBClient>,
        notification_service: Arc<NotificationService>,
        file_store: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            file_store,
        }
    }

    pub async fn rate_job(
        &self,
        job_id: Uuid,
        actor: &User,
        user_id: Uuid,
        qc_rating: Option<i16>,
        cleaning_rating: Option<i16>,
        qc_voice_b64: Option<String>,
    ) -> Result<JobRating, ServiceError> {
        let job = self
            .db_client
            .get_job_tracking(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        let can_rate = actor.role.is_admin() || actor.id == job.engineer_id;
        if !can_rate {
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, job_id));
        }

        // In-flight work cannot be rated.
        if !job.status.is_terminal() {
            return Err(ServiceError::InvalidTransition {
                job_id,
                current: job.status,
            });
        }

        self.require_review_open(job_id).await?;

        for value in [qc_rating, cleaning_rating].into_iter().flatten() {
            if !(1..=5).contains(&value) {
                return Err(ServiceError::Validation(
                    "Ratings must be between 1 and 5".to_string(),
                ));
            }
        }

        let qc_voice = match qc_voice_b64 {
            Some(b64) => Some(self.file_store.store_voice(&b64).await?),
            None => None,
        };

        let time_rating =
            timeline::time_rating(job.planned_hours, job.actual_hours.unwrap_or(0.0));

        let rating = self
            .db_client
            .upsert_rating(
                job_id,
                user_id,
                actor.id,
                time_rating,
                qc_rating,
                cleaning_rating,
                qc_voice,
            )
            .await?;

        Ok(rating)
    }

    pub async fn override_time_rating(
        &self,
        rating_id: Uuid,
        actor: &User,
        new_value: i16,
        reason: String,
    ) -> Result<JobRating, ServiceError> {
        let rating = self.require_rating(rating_id).await?;
        self.require_engineer_or_admin(actor, rating.job_id).await?;
        self.require_review_open(rating.job_id).await?;

        if !(1..=5).contains(&new_value) {
            return Err(ServiceError::Validation(
                "Override value must be between 1 and 5".to_string(),
            ));
        }

        // effective_time_rating stays at the original value until an
        // admin approves; this is the two-step gate.
        self.db_client
            .request_override_cas(rating_id, new_value, reason)
            .await?
            .ok_or(ServiceError::Validation(
                "An override is already awaiting approval".to_string(),
            ))
    }

    pub async fn approve_override(
        &self,
        rating_id: Uuid,
        actor: &User,
        approved: bool,
    ) -> Result<JobRating, ServiceError> {
        if !actor.role.is_admin() {
            let rating = self.require_rating(rating_id).await?;
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, rating.job_id));
        }

        self.db_client
            .decide_override_cas(rating_id, approved)
            .await?
            .ok_or(ServiceError::NoPendingOverride(rating_id))
    }

    pub async fn admin_bonus(
        &self,
        rating_id: Uuid,
        actor: &User,
        points: i32,
        reason: String,
    ) -> Result<JobRating, ServiceError> {
        if !actor.role.is_admin() {
            let rating = self.require_rating(rating_id).await?;
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, rating.job_id));
        }
        self.require_rating(rating_id).await?;

        Ok(self
            .db_client
            .add_bonus_points(rating_id, points, reason)
            .await?)
    }

    pub async fn dispute_rating(
        &self,
        rating_id: Uuid,
        actor: &User,
        reason: String,
    ) -> Result<JobRating, ServiceError> {
        let rating = self.require_rating(rating_id).await?;

        // Only the rated worker may dispute their own rating.
        if actor.id != rating.user_id {
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, rating.job_id));
        }

        let disputed = self
            .db_client
            .raise_dispute_cas(rating_id, reason)
            .await?
            .ok_or(ServiceError::AlreadyDisputed(rating_id))?;

        let job = self
            .db_client
            .get_job_tracking(disputed.job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(disputed.job_id))?;

        self.notification_service
            .notify_rating_disputed(job.engineer_id, rating_id, job.id)
            .await?;

        Ok(disputed)
    }

    pub async fn resolve_dispute(
        &self,
        rating_id: Uuid,
        actor: &User,
        resolution: String,
        revised_qc: Option<i16>,
        revised_cleaning: Option<i16>,
    ) -> Result<JobRating, ServiceError> {
        if !actor.role.is_admin() {
            let rating = self.require_rating(rating_id).await?;
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, rating.job_id));
        }

        let rating = self.require_rating(rating_id).await?;
        if !rating.dispute_raised {
            return Err(ServiceError::Validation(
                "Rating has no dispute to resolve".to_string(),
            ));
        }

        self.db_client
            .resolve_dispute_cas(rating_id, resolution, revised_qc, revised_cleaning)
            .await?
            .ok_or(ServiceError::AlreadyResolved(rating_id))
    }

    async fn require_rating(&self, rating_id: Uuid) -> Result<JobRating, ServiceError> {
        self.db_client
            .get_rating(rating_id)
            .await?
            .ok_or(ServiceError::RatingNotFound(rating_id))
    }

    async fn require_engineer_or_admin(
        &self,
        actor: &User,
        job_id: Uuid,
    ) -> Result<(), ServiceError> {
        let job = self
            .db_client
            .get_job_tracking(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;
        if !(actor.role.is_admin() || actor.id == job.engineer_id) {
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, job_id));
        }
        Ok(())
    }

    /// Rate and override calls are frozen once the covering daily
    /// review has been submitted.
    async fn require_review_open(&self, job_id: Uuid) -> Result<(), ServiceError> {
        if let Some(review) = self.db_client.get_submitted_review_for_job(job_id).await? {
            return Err(ServiceError::ReviewSubmitted(review.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::models::ratingmodel::JobRating;
    use uuid::Uuid;

    fn rating() -> JobRating {
        JobRating {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rated_by: Uuid::new_v4(),
            time_rating: 4,
            qc_rating: Some(5),
            cleaning_rating: Some(3),
            qc_voice: None,
            override_value: None,
            override_reason: None,
            override_approved: None,
            bonus_points: 0,
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
    fn effective_rating_ignores_unapproved_override() {
        let mut r = rating();
        assert_eq!(r.effective_time_rating(), 4);

        // Requested but undecided: original value holds.
        r.override_value = Some(2);
        r.override_approved = None;
        assert_eq!(r.effective_time_rating(), 4);

        // Rejected: original value holds.
        r.override_approved = Some(false);
        assert_eq!(r.effective_time_rating(), 4);

        // Approved: override wins.
        r.override_approved = Some(true);
        assert_eq!(r.effective_time_rating(), 2);
    }

    #[test]
    fn open_dispute_tracking() {
        let mut r = rating();
        assert!(!r.has_open_dispute());
        r.dispute_raised = true;
        assert!(r.has_open_dispute());
        r.dispute_resolved = true;
        assert!(!r.has_open_dispute());
    }
}
