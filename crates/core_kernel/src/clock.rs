//! Business clock
//!
//! Invoice numbers, transaction dates and payment dates are all expressed in
//! the business's local calendar, which may differ from UTC. The `Clock`
//! trait lets services ask "what day is it here?" and lets tests pin time.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;

use crate::error::CoreError;

/// Source of the current instant and the current business date
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar date in the business timezone
    fn today(&self) -> NaiveDate;
}

/// Wall clock bound to a business timezone
#[derive(Debug, Clone, Copy)]
pub struct BusinessClock {
    timezone: Tz,
}

impl BusinessClock {
    /// Creates a clock for the given timezone
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Creates a clock from an IANA timezone name such as `Asia/Jakarta`
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        let timezone: Tz = name
            .parse()
            .map_err(|e| CoreError::configuration(format!("unknown timezone '{}': {}", name, e)))?;
        Ok(Self::new(timezone))
    }

    /// Creates a UTC clock
    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// Returns the business timezone
    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

impl Clock for BusinessClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

/// Clock pinned to one instant, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
    timezone: Tz,
}

impl FixedClock {
    /// Pins the clock to `instant`, interpreting dates in UTC
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            instant,
            timezone: Tz::UTC,
        }
    }

    /// Interprets dates in the given timezone
    pub fn in_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }

    fn today(&self) -> NaiveDate {
        self.instant.with_timezone(&self.timezone).date_naive()
    }
}
