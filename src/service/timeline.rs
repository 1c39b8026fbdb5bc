//! Pure time accounting for job tracking. Everything here is a plain
//! function over timestamps so the properties (non-negative hours,
//! approved-only pause charging) can be tested without a database.
//!
//! Two of these computations also run inside SQL statements, where the
//! database clock and the row's own columns are authoritative:
//! pause charging lives in `resume_pause_cas` and elapsed-time
//! flagging in `flag_overrun_jobs`. The SQL is the live path;
//! `pause_duration_minutes` and `active_elapsed_minutes` state the
//! same rules as plain functions and pin them down in the tests below.
//! A change to either must land in both places.

use chrono::{DateTime, Utc};

/// Minutes charged for a pause: approval moment to resume moment.
/// Adjudication latency before approval is never charged. The live
/// computation is the GREATEST/FLOOR expression in `resume_pause_cas`;
/// this is its reference form.
pub fn pause_duration_minutes(
    approved_at: DateTime<Utc>,
    resumed_at: DateTime<Utc>,
) -> i32 {
    let minutes = (resumed_at - approved_at).num_minutes();
    minutes.max(0) as i32
}

/// Hours actually worked: wall time minus approved pauses, floored at
/// zero to guard against clock skew between writers.
pub fn actual_hours(
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total_paused_minutes: i32,
) -> f64 {
    let wall_minutes = (completed_at - started_at).num_minutes();
    let active_minutes = wall_minutes - total_paused_minutes as i64;
    (active_minutes.max(0) as f64) / 60.0
}

/// Active elapsed minutes of an in-progress job, as seen by the
/// auto-flag sweep. A job sitting on an approved-unresumed pause is
/// still accruing here; only closed (resumed) pauses are subtracted,
/// which matches how `total_paused_minutes` is maintained. The sweep
/// evaluates this inside `flag_overrun_jobs`; this is its reference
/// form.
pub fn active_elapsed_minutes(
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
    total_paused_minutes: i32,
) -> i64 {
    let wall = (now - started_at).num_minutes();
    (wall - total_paused_minutes as i64).max(0)
}

/// Deterministic time rating from planned-vs-actual hours. A job with
/// no meaningful estimate rates neutral.
pub fn time_rating(planned_hours: f64, actual_hours: f64) -> i16 {
    if planned_hours <= 0.0 {
        return 3;
    }
    let ratio = actual_hours / planned_hours;
    if ratio <= 0.8 {
        5
    } else if ratio <= 1.0 {
        4
    } else if ratio <= 1.2 {
        3
    } else if ratio <= 1.5 {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        t0() + chrono::Duration::minutes(minutes)
    }

    #[test]
    fn pause_charged_from_approval_not_request() {
        // Requested at +10, approved at +15, resumed at +25.
        let charged = pause_duration_minutes(at(15), at(25));
        assert_eq!(charged, 10);
    }

    #[test]
    fn pause_duration_never_negative() {
        assert_eq!(pause_duration_minutes(at(30), at(20)), 0);
    }

    #[test]
    fn full_shift_timeline_with_one_pause() {
        // Start T0, pause requested +10, approved +15, resumed +25,
        // completed +40. Paused = 10 minutes, actual = 0.5h.
        let paused = pause_duration_minutes(at(15), at(25));
        assert_eq!(paused, 10);
        let hours = actual_hours(t0(), at(40), paused);
        assert!((hours - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn actual_hours_floored_at_zero_on_clock_skew() {
        let hours = actual_hours(at(40), at(10), 0);
        assert_eq!(hours, 0.0);
        let hours = actual_hours(t0(), at(10), 30);
        assert_eq!(hours, 0.0);
    }

    #[test]
    fn active_elapsed_subtracts_closed_pauses() {
        assert_eq!(active_elapsed_minutes(t0(), at(120), 30), 90);
        assert_eq!(active_elapsed_minutes(t0(), at(20), 30), 0);
    }

    #[test]
    fn time_rating_is_deterministic_over_ratio_bands() {
        assert_eq!(time_rating(10.0, 7.0), 5);
        assert_eq!(time_rating(10.0, 8.0), 5);
        assert_eq!(time_rating(10.0, 9.5), 4);
        assert_eq!(time_rating(10.0, 10.0), 4);
        assert_eq!(time_rating(10.0, 11.0), 3);
        assert_eq!(time_rating(10.0, 14.0), 2);
        assert_eq!(time_rating(10.0, 20.0), 1);
        // No estimate rates neutral.
        assert_eq!(time_rating(0.0, 5.0), 3);
    }
}
