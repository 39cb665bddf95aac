//! Time source injected into the [`Engine`](crate::Engine).
//!
//! Every "today"-relative computation (burn rate windows, forecasts, goal
//! pace, adjustment dates) reads the clock instead of the wall time, so
//! reports are reproducible.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

pub trait Clock: fmt::Debug + Send + Sync {
    /// Current instant, used for audit timestamps.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock in UTC.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen on a given date (midday UTC).
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    today: NaiveDate,
}

impl FixedClock {
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.today
            .and_hms_opt(12, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or_default()
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}
