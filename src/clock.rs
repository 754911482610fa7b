//! Time sources for the scheduler.
//!
//! Calendar days are UTC days, so `today()` is the UTC date of `now()`.

use chrono::{DateTime, Duration, NaiveDate, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Wall-clock time shifted forward by a whole number of days.
///
/// Backs the "Next Day" control: the offset is persisted in `app_state`
/// and a fresh clock is built whenever it changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedClock {
    pub offset_days: i64,
}

impl SimulatedClock {
    pub fn new(offset_days: i64) -> Self {
        Self { offset_days }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now() + Duration::days(self.offset_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_today_is_utc_date() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 9, 23, 59, 0).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }

    #[test]
    fn test_simulated_clock_runs_ahead() {
        let clock = SimulatedClock::new(3);
        let ahead = clock.now() - Utc::now();
        assert!(ahead >= Duration::days(3) - Duration::seconds(5));
        assert!(ahead <= Duration::days(3) + Duration::seconds(5));
    }
}
