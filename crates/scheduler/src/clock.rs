use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Time source for the background loops. The seam exists so loop tests can
/// drive time deterministically instead of sleeping through real seconds.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The host's wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock: starts at a fixed instant and advances by a fixed
/// step on every read, so a polling loop always makes progress.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    pub fn starting_at(start: DateTime<Utc>, step: Duration) -> Self {
        Self { now: Mutex::new(start), step }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now_utc(&self) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let current = *now;
        *now += self.step;
        current
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn manual_clock_steps_forward_on_every_read() {
        let start = Utc.with_ymd_and_hms(2026, 7, 20, 12, 0, 0).single().expect("timestamp");
        let clock = ManualClock::starting_at(start, Duration::seconds(1));

        assert_eq!(clock.now_utc(), start);
        assert_eq!(clock.now_utc(), start + Duration::seconds(1));

        clock.set(start + Duration::hours(1));
        assert_eq!(clock.now_utc(), start + Duration::hours(1));
    }
}
