use chrono::{DateTime, Utc};

/// Injected time source. Every timestamp the services write goes
/// through this trait so pause/resume/complete sequences can be
/// driven deterministically in tests without real sleeps.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub mod test_clock {
    use super::*;
    use std::sync::Mutex;

    /// Manually advanced clock for tests.
    #[derive(Debug)]
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub fn starting_at(start: DateTime<Utc>) -> Self {
            ManualClock {
                now: Mutex::new(start),
            }
        }

        pub fn advance_minutes(&self, minutes: i64) {
            let mut guard = self.now.lock().unwrap();
            *guard += chrono::Duration::minutes(minutes);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::ManualClock;
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_advances_deterministically() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        let clock = ManualClock::starting_at(start);
        assert_eq!(clock.now(), start);

        clock.advance_minutes(25);
        assert_eq!(clock.now(), start + chrono::Duration::minutes(25));
    }
}
