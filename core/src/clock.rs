//! Ledger clock: the single source of "now" and "today".
//!
//! RULE: nothing in the core calls `Utc::now()` directly.
//! Tests and backfills pin the clock with `LedgerClock::Fixed`.

use crate::error::{LedgerError, LedgerResult};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerClock {
    /// Wall-clock UTC.
    #[default]
    System,
    /// A pinned instant.
    Fixed(NaiveDateTime),
}

impl LedgerClock {
    /// Pin the clock to midnight of the given date.
    pub fn fixed_date(date: NaiveDate) -> Self {
        Self::Fixed(date.and_time(chrono::NaiveTime::MIN))
    }

    pub fn now(&self) -> NaiveDateTime {
        match self {
            Self::System   => Utc::now().naive_utc(),
            Self::Fixed(t) => *t,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Inclusive `[today, today + days]` window. Fails if the end date
    /// is not representable.
    pub fn window(&self, days: i64) -> LedgerResult<(NaiveDate, NaiveDate)> {
        let today = self.today();
        let end = Duration::try_days(days)
            .and_then(|span| today.checked_add_signed(span))
            .ok_or_else(|| {
                LedgerError::validation(format!("window of {days} days from {today} is out of range"))
            })?;
        Ok((today, end))
    }

    /// Move a pinned clock forward. No-op on the system clock.
    pub fn advance(&mut self, by: Duration) {
        if let Self::Fixed(t) = self {
            *t += by;
        }
    }
}
