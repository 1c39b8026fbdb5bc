// service/background_jobs.rs
use chrono::Datelike;
use rand::Rng;
use std::sync::Arc;
use tokio::time::{interval, Duration};

use crate::{
    db::trackingdb::TrackingExt,
    models::{performancemodel::PeriodType, trackingmodel::JobEvent},
    AppState,
};

/// Periodic sweep that advisory-flags in-progress jobs running far
/// past their estimate. Flagging never forces a transition, and the
/// sweep only touches unflagged rows, so overlapping ticks are
/// harmless.
pub async fn start_auto_flag_sweep(app_state: Arc<AppState>) {
    // Small startup jitter so replicas don't sweep in lockstep.
    let jitter = rand::rng().random_range(0..30);
    tokio::time::sleep(Duration::from_secs(jitter)).await;

    let mut interval = interval(Duration::from_secs(
        app_state.env.auto_flag_interval_secs,
    ));

    loop {
        interval.tick().await;

        let now = app_state.clock.now();
        tracing::info!("Running auto-flag sweep at {}", now);

        let flagged = match app_state
            .db_client
            .flag_overrun_jobs(now, app_state.env.auto_flag_multiplier)
            .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("Auto-flag sweep failed: {}", e);
                continue;
            }
        };

        for job in flagged {
            // Failures here are isolated per job and retried by the
            // next tick only for jobs that were never flagged; the
            // flag itself is already durable.
            if let Err(e) = app_state
                .db_client
                .append_job_log(
                    job.id,
                    job.engineer_id,
                    JobEvent::AutoFlagged,
                    Some(serde_json::json!({
                        "planned_hours": job.planned_hours,
                        "flagged_at": job.auto_flagged_at,
                    })),
                )
                .await
            {
                tracing::error!("Failed to log auto-flag for job {}: {}", job.id, e);
            }

            if let Err(e) = app_state
                .notification_service
                .notify_job_auto_flagged(&job)
                .await
            {
                tracing::error!("Failed to notify auto-flag for job {}: {}", job.id, e);
            }
        }
    }
}

/// Periodic recompute of the current daily/weekly/monthly rollups.
/// Recompute-and-replace makes an overlapping or repeated run a no-op
/// in effect.
pub async fn start_performance_aggregation(app_state: Arc<AppState>) {
    let mut interval = interval(Duration::from_secs(
        app_state.env.performance_interval_secs,
    ));

    loop {
        interval.tick().await;

        let today = app_state.clock.now().date_naive();
        tracing::info!("Running performance aggregation for {}", today);

        let week_start =
            today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64);
        let month_start = today.with_day(1).unwrap_or(today);

        for (period_type, period_start) in [
            (PeriodType::Daily, today),
            (PeriodType::Weekly, week_start),
            (PeriodType::Monthly, month_start),
        ] {
            match app_state
                .performance_service
                .compute_performance(period_type, period_start)
                .await
            {
                Ok(summary) => {
                    if summary.failures.is_empty() {
                        tracing::info!(
                            "Performance aggregation ({}) processed {} users",
                            period_type.to_str(),
                            summary.users_processed
                        );
                    } else {
                        tracing::warn!(
                            "Performance aggregation ({}) processed {} users with {} failures",
                            period_type.to_str(),
                            summary.users_processed,
                            summary.failures.len()
                        );
                    }
                }
                Err(e) => tracing::error!(
                    "Performance aggregation ({}) failed: {}",
                    period_type.to_str(),
                    e
                ),
            }
        }
    }
}
