// service/notification_service.rs
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::db::DBClient,
    models::trackingmodel::{JobTracking, PauseRequest},
    service::error::ServiceError,
};

/// Persists notification rows and pushes them to the external
/// notification collaborator. Callers never await delivery; the push
/// happens on a detached task and failures are only logged.
#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
    push_client: reqwest::Client,
    push_url: Option<String>,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>, push_url: Option<String>) -> Self {
        Self {
            db_client,
            push_client: reqwest::Client::new(),
            push_url,
        }
    }

    pub async fn notify_pause_requested(
        &self,
        engineer_id: Uuid,
        job: &JobTracking,
        request: &PauseRequest,
    ) -> Result<(), ServiceError> {
        tracing::info!(
            "Pause requested on job {} by {}",
            job.id,
            request.requested_by
        );

        self.store_notification(
            Some(engineer_id),
            "pause_requested",
            Some(job.id),
            Some(serde_json::json!({
                "request_id": request.id,
                "reason": request.reason,
                "work_order": job.work_order,
            })),
            format!("Pause requested on {}", job.work_order),
        )
        .await
    }

    pub async fn notify_pause_reviewed(
        &self,
        worker_id: Uuid,
        job: &JobTracking,
        request: &PauseRequest,
        approved: bool,
    ) -> Result<(), ServiceError> {
        let verdict = if approved { "approved" } else { "rejected" };
        tracing::info!("Pause request {} {}", request.id, verdict);

        self.store_notification(
            Some(worker_id),
            "pause_reviewed",
            Some(job.id),
            Some(serde_json::json!({
                "request_id": request.id,
                "approved": approved,
            })),
            format!("Your pause request on {} was {}", job.work_order, verdict),
        )
        .await
    }

    pub async fn notify_job_auto_flagged(
        &self,
        job: &JobTracking,
    ) -> Result<(), ServiceError> {
        tracing::warn!(
            "Job {} auto-flagged: running past {}h estimate",
            job.id,
            job.planned_hours
        );

        self.store_notification(
            Some(job.engineer_id),
            "job_auto_flagged",
            Some(job.id),
            Some(serde_json::json!({
                "planned_hours": job.planned_hours,
                "work_order": job.work_order,
            })),
            format!("Job {} is running far past its estimate", job.work_order),
        )
        .await
    }

    pub async fn notify_carry_over_created(
        &self,
        worker_id: Uuid,
        new_job: &JobTracking,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            Some(worker_id),
            "carry_over_created",
            Some(new_job.id),
            Some(serde_json::json!({
                "original_job_id": new_job.original_job_id,
                "carry_over_count": new_job.carry_over_count,
            })),
            format!(
                "Unfinished work on {} was carried over to {}",
                new_job.work_order, new_job.job_date
            ),
        )
        .await
    }

    pub async fn notify_rating_disputed(
        &self,
        engineer_id: Uuid,
        rating_id: Uuid,
        job_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            Some(engineer_id),
            "rating_disputed",
            Some(job_id),
            Some(serde_json::json!({ "rating_id": rating_id })),
            "A worker disputed a rating under your review".to_string(),
        )
        .await
    }

    async fn store_notification(
        &self,
        user_id: Option<Uuid>,
        kind: &str,
        job_id: Option<Uuid>,
        payload: Option<serde_json::Value>,
        message: String,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, job_id, payload, message)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(job_id)
        .bind(&payload)
        .bind(&message)
        .execute(&self.db_client.pool)
        .await?;

        // Fire-and-forget push; the request path never waits on the
        // collaborator.
        if let Some(url) = &self.push_url {
            let client = self.push_client.clone();
            let url = url.clone();
            let body = serde_json::json!({
                "user_id": user_id,
                "kind": kind,
                "job_id": job_id,
                "message": message,
                "payload": payload,
            });
            tokio::spawn(async move {
                if let Err(e) = client.post(&url).json(&body).send().await {
                    tracing::warn!("Notification push failed: {}", e);
                }
            });
        }

        Ok(())
    }
}
