// service/review_service.rs
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{
        db::DBClient, pausedb::PauseExt, ratingdb::RatingExt, reviewdb::ReviewExt,
        trackingdb::TrackingExt,
    },
    models::{
        ratingmodel::{DailyReview, JobRating, ReviewStatus},
        trackingmodel::{JobTracking, PauseRequest, ShiftType},
        usermodel::User,
    },
    service::{clock::Clock, error::ServiceError},
};

#[derive(Debug, Serialize)]
pub struct DailyReviewDetail {
    pub review: DailyReview,
    pub jobs: Vec<JobTracking>,
    pub ratings: Vec<JobRating>,
    /// Computed on every read; never persisted.
    pub can_submit: bool,
    pub blockers: Vec<String>,
}

/// Checks whether a shift is ready for sign-off. `can_submit` is a
/// projection over job, pause and dispute state; storing it would let
/// a cached flag drift from reality.
pub fn submit_blockers(
    jobs: &[JobTracking],
    open_pauses: &[PauseRequest],
    ratings: &[JobRating],
) -> Vec<String> {
    let mut blockers = Vec::new();

    for job in jobs {
        if !job.status.is_terminal() {
            blockers.push(format!(
                "Job {} ({}) is still {}",
                job.id,
                job.work_order,
                job.status.to_str()
            ));
        }
    }

    for pause in open_pauses {
        blockers.push(format!(
            "Job {} has an open pause request",
            pause.job_id
        ));
    }

    for rating in ratings {
        if rating.has_open_dispute() {
            blockers.push(format!(
                "Rating {} on job {} has an unresolved dispute",
                rating.id, rating.job_id
            ));
        }
    }

    blockers
}

#[derive(Debug, Clone)]
pub struct ReviewService {
    db_client: Arc<DBClient>,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
    pub fn new(db_client: Arc<DBClient>, clock: Arc<dyn Clock>) -> Self {
        Self { db_client, clock }
    }

    pub async fn get_daily_review(
        &self,
        engineer: &User,
        review_date: NaiveDate,
        shift: ShiftType,
    ) -> Result<DailyReviewDetail, ServiceError> {
        let review = self
            .db_client
            .get_or_create_daily_review(engineer.id, review_date, shift)
            .await?;

        self.load_detail(review).await
    }

    pub async fn submit_review(
        &self,
        review_id: Uuid,
        actor: &User,
    ) -> Result<DailyReview, ServiceError> {
        let review = self
            .db_client
            .get_daily_review(review_id)
            .await?
            .ok_or(ServiceError::ReviewNotFound(review_id))?;

        if !(actor.role.is_admin() || actor.id == review.engineer_id) {
            return Err(ServiceError::UnauthorizedJobAccess(actor.id, review_id));
        }

        if review.status == ReviewStatus::Submitted {
            return Err(ServiceError::ReviewSubmitted(review_id));
        }

        let detail = self.load_detail(review).await?;
        if !detail.can_submit {
            return Err(ServiceError::ReviewNotReady {
                review_id,
                blockers: detail.blockers,
            });
        }

        self.db_client
            .submit_review_cas(review_id, self.clock.now())
            .await?
            .ok_or(ServiceError::ReviewSubmitted(review_id))
    }

    async fn load_detail(
        &self,
        review: DailyReview,
    ) -> Result<DailyReviewDetail, ServiceError> {
        let jobs = self
            .db_client
            .get_jobs_for_shift(review.engineer_id, review.review_date, review.shift)
            .await?;

        let mut open_pauses = Vec::new();
        for job in &jobs {
            if let Some(open) = self.db_client.get_open_pause_request(job.id).await? {
                open_pauses.push(open);
            }
        }

        let job_ids: Vec<Uuid> = jobs.iter().map(|j| j.id).collect();
        let ratings = self.db_client.get_ratings_for_jobs(&job_ids).await?;

        let blockers = submit_blockers(&jobs, &open_pauses, &ratings);

        Ok(DailyReviewDetail {
            can_submit: blockers.is_empty(),
            review,
            jobs,
            ratings,
            blockers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trackingmodel::{
        IncompleteReason, PauseReason, PauseStatus, TrackingStatus,
    };
    use chrono::Utc;

    fn job(status: TrackingStatus) -> JobTracking {
        JobTracking {
            id: Uuid::new_v4(),
            work_order: "AHU-12 belt inspection".to_string(),
            engineer_id: Uuid::new_v4(),
            assigned_to: Uuid::new_v4(),
            job_date: Utc::now().date_naive(),
            shift: ShiftType::Day,
            planned_hours: 2.0,
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
            carry_over_count: 0,
            auto_flagged: false,
            auto_flagged_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn pending_pause(job_id: Uuid) -> PauseRequest {
        PauseRequest {
            id: Uuid::new_v4(),
            job_id,
            requested_by: Uuid::new_v4(),
            reason: PauseReason::MaterialShortage,
            details: None,
            status: PauseStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            resumed_at: None,
            duration_minutes: None,
            created_at: None,
        }
    }

    fn rating(job_id: Uuid) -> JobRating {
        JobRating {
            id: Uuid::new_v4(),
            job_id,
            user_id: Uuid::new_v4(),
            rated_by: Uuid::new_v4(),
            time_rating: 4,
            qc_rating: Some(4),
            cleaning_rating: Some(4),
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
    fn ready_when_all_jobs_terminal_and_nothing_open() {
        let jobs = vec![
            job(TrackingStatus::Completed),
            job(TrackingStatus::Incomplete),
        ];
        let ratings = vec![rating(jobs[0].id)];
        assert!(submit_blockers(&jobs, &[], &ratings).is_empty());
    }

    #[test]
    fn in_flight_job_blocks_submission() {
        let jobs = vec![job(TrackingStatus::InProgress)];
        let blockers = submit_blockers(&jobs, &[], &[]);
        assert_eq!(blockers.len(), 1);
        assert!(blockers[0].contains("in_progress"));
    }

    #[test]
    fn open_pause_blocks_submission() {
        let jobs = vec![job(TrackingStatus::Completed)];
        let pauses = vec![pending_pause(jobs[0].id)];
        assert_eq!(submit_blockers(&jobs, &pauses, &[]).len(), 1);
    }

    #[test]
    fn dispute_blocks_until_resolved() {
        let jobs = vec![job(TrackingStatus::Completed)];
        let mut r = rating(jobs[0].id);
        r.dispute_raised = true;

        let blockers = submit_blockers(&jobs, &[], &[r.clone()]);
        assert_eq!(blockers.len(), 1);

        // Resolving the dispute clears the gate.
        r.dispute_resolved = true;
        assert!(submit_blockers(&jobs, &[], &[r]).is_empty());
    }

    #[test]
    fn incomplete_without_carry_over_does_not_block() {
        let mut j = job(TrackingStatus::Incomplete);
        j.incomplete_reason = Some(IncompleteReason::Cancelled);
        assert!(submit_blockers(&[j], &[], &[]).is_empty());
    }
}
