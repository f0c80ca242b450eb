//! Study-time aggregation.
//!
//! Everything in here is a pure function of its arguments: callers pass the
//! month they are looking at explicitly and get back plain values. Record
//! lists are expected to be fetched (and usually filtered) by the caller.
//!
//! Invalid numeric input (negative durations, non-finite hours, a month
//! outside 1..=12) is rejected with [`StatsError::InvalidArgument`]; nothing
//! is clamped silently.

mod aggregate;
mod calendar;
mod duration;
mod goal;

use chrono::NaiveDate;

pub use aggregate::{Bucket, bucketize, group_totals, total_minutes};
pub use calendar::{
    BucketKey, BucketMode, TRAILING_MONTHS, WEEKDAY_LABELS, YearMonth, assign, bucket_keys,
    week_of_month, weekday_index,
};
pub use duration::{MINUTES_PER_HOUR, minutes_to_hours, round_tenth, to_hours_minutes, to_minutes};
pub use goal::{GoalProgress, achievement_percent, daily_goal, exact_hours, remaining_days};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl StatsError {
    pub(crate) fn invalid<T: Into<String>>(msg: T) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// A dated study duration, the only shape the aggregation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationEntry {
    pub date: NaiveDate,
    pub hours: i64,
    pub minutes: i64,
}

impl DurationEntry {
    pub fn new(date: NaiveDate, hours: i64, minutes: i64) -> Self {
        Self {
            date,
            hours,
            minutes,
        }
    }

    pub fn total_minutes(&self) -> Result<i64, StatsError> {
        to_minutes(self.hours, self.minutes)
    }
}
