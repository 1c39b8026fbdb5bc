use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "tracking_status", rename_all = "snake_case")]
pub enum TrackingStatus {
    NotStarted,
    InProgress,
    Completed,
    Incomplete,
}

impl TrackingStatus {
    pub fn to_str(&self) -> &str {
        match self {
            TrackingStatus::NotStarted => "not_started",
            TrackingStatus::InProgress => "in_progress",
            TrackingStatus::Completed => "completed",
            TrackingStatus::Incomplete => "incomplete",
        }
    }

    /// Central transition table. Every status write is additionally
    /// guarded by a compare-and-swap in the db layer; this is the
    /// single place the legal edges are spelled out.
    pub fn can_transition_to(&self, next: TrackingStatus) -> bool {
        use TrackingStatus::*;
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (InProgress, Completed)
                | (InProgress, Incomplete)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackingStatus::Completed | TrackingStatus::Incomplete)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "shift_type", rename_all = "snake_case")]
pub enum ShiftType {
    Day,
    Night,
}

impl ShiftType {
    pub fn to_str(&self) -> &str {
        match self {
            ShiftType::Day => "day",
            ShiftType::Night => "night",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "pause_status", rename_all = "snake_case")]
pub enum PauseStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "pause_reason", rename_all = "snake_case")]
pub enum PauseReason {
    MaterialShortage,
    EquipmentFault,
    SafetyHold,
    WeatherDelay,
    PersonalBreak,
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "incomplete_reason", rename_all = "snake_case")]
pub enum IncompleteReason {
    OutOfTime,
    MaterialShortage,
    EquipmentUnavailable,
    AccessDenied,
    Cancelled,
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "job_event", rename_all = "snake_case")]
pub enum JobEvent {
    Assigned,
    Started,
    PauseRequested,
    PauseApproved,
    PauseRejected,
    Resumed,
    Completed,
    MarkedIncomplete,
    CarriedOver,
    AutoFlagged,
    MaterialsConsumed,
}

impl JobEvent {
    pub fn to_str(&self) -> &str {
        match self {
            JobEvent::Assigned => "assigned",
            JobEvent::Started => "started",
            JobEvent::PauseRequested => "pause_requested",
            JobEvent::PauseApproved => "pause_approved",
            JobEvent::PauseRejected => "pause_rejected",
            JobEvent::Resumed => "resumed",
            JobEvent::Completed => "completed",
            JobEvent::MarkedIncomplete => "marked_incomplete",
            JobEvent::CarriedOver => "carried_over",
            JobEvent::AutoFlagged => "auto_flagged",
            JobEvent::MaterialsConsumed => "materials_consumed",
        }
    }
}

/// One row per work-plan job; mutated only through the state-machine
/// operations in TrackingService.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobTracking {
    pub id: Uuid,
    pub work_order: String,
    pub engineer_id: Uuid,
    pub assigned_to: Uuid,
    pub job_date: NaiveDate,
    pub shift: ShiftType,
    pub planned_hours: f64,
    pub status: TrackingStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub total_paused_minutes: i32,
    pub actual_hours: Option<f64>,
    pub work_notes: Option<String>,
    pub completion_photo: Option<String>,
    pub handover_voice: Option<String>,
    pub incomplete_reason: Option<IncompleteReason>,
    pub incomplete_details: Option<String>,
    pub is_carry_over: bool,
    pub original_job_id: Option<Uuid>,
    pub carry_over_count: i32,
    pub auto_flagged: bool,
    pub auto_flagged_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>, // Database has DEFAULT NOW()
    pub updated_at: Option<DateTime<Utc>>,
}

/// Append-only audit record. Write-once; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobLog {
    pub id: Uuid,
    pub job_id: Uuid,
    pub actor_id: Uuid,
    pub event: JobEvent,
    pub payload: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PauseRequest {
    pub id: Uuid,
    pub job_id: Uuid,
    pub requested_by: Uuid,
    pub reason: PauseReason,
    pub details: Option<String>,
    pub status: PauseStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub resumed_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
}

impl PauseRequest {
    /// Pending, or approved but not yet resumed. At most one such
    /// request may exist per job at any time.
    pub fn is_open(&self) -> bool {
        match self.status {
            PauseStatus::Pending => true,
            PauseStatus::Approved => self.resumed_at.is_none(),
            PauseStatus::Rejected => false,
        }
    }
}

/// Immutable link between an incomplete job and its continuation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CarryOver {
    pub id: Uuid,
    pub original_job_id: Uuid,
    pub new_job_id: Uuid,
    pub created_by: Uuid,
    pub reason: IncompleteReason,
    pub details: Option<String>,
    pub handover_voice: Option<String>,
    pub hours_spent: f64,
    pub created_at: Option<DateTime<Utc>>,
}
