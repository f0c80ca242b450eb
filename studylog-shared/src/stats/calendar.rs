use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::StatsError;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Size of the month-over-month window, reference month included.
pub const TRAILING_MONTHS: u32 = 12;

/// Weekday bucket labels, indexed by [`weekday_index`] (0 = Sunday).
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A calendar month. Always valid once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first: NaiveDate,
    last: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, StatsError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(StatsError::invalid(format!(
                "year {year} outside {MIN_YEAR}..={MAX_YEAR}"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(StatsError::invalid(format!("month {month} outside 1..=12")));
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| StatsError::invalid(format!("no such month: {year}-{month}")))?;
        let last = NaiveDate::from_ymd_opt(year, month, days_in(year, month))
            .ok_or_else(|| StatsError::invalid(format!("no such month: {year}-{month}")))?;
        Ok(Self { first, last })
    }

    /// The month a date falls in.
    pub fn of(date: NaiveDate) -> Result<Self, StatsError> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    pub fn days_in_month(&self) -> u32 {
        self.last.day()
    }

    /// `ceil(days_in_month / 7)`; the last week may be short.
    pub fn week_count(&self) -> u32 {
        self.days_in_month().div_ceil(7)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    /// Moves by `delta` months, rolling the year over as needed.
    pub fn offset(&self, delta: i64) -> Result<Self, StatsError> {
        let idx = month_index(self.year(), self.month()) + delta;
        let year = i32::try_from(idx.div_euclid(12))
            .map_err(|_| StatsError::invalid(format!("month offset {delta} out of range")))?;
        let month = idx.rem_euclid(12) as u32 + 1;
        Self::new(year, month)
    }

    /// Oldest month of the `count`-month window ending at `self`.
    pub fn window_start(&self, count: u32) -> Result<Self, StatsError> {
        let back = i64::from(count.saturating_sub(1));
        if month_index(self.year(), self.month()) - back < month_index(MIN_YEAR, 1) {
            return Err(StatsError::invalid(format!(
                "{count}-month window ending at {self} starts before {MIN_YEAR:04}-01"
            )));
        }
        self.offset(-back)
    }

    pub fn prev(&self) -> Result<Self, StatsError> {
        self.offset(-1)
    }

    pub fn next(&self) -> Result<Self, StatsError> {
        self.offset(1)
    }

    /// `count` consecutive months ending at `self`, oldest first.
    ///
    /// Fails when the window would start before year 1.
    pub fn trailing(&self, count: u32) -> Result<Vec<Self>, StatsError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        self.window_start(count)?;
        (0..i64::from(count))
            .rev()
            .map(|back| self.offset(-back))
            .collect()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = StatsError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s
            .split_once('-')
            .ok_or_else(|| StatsError::invalid(format!("expected YYYY-MM, got {s:?}")))?;
        let year = y
            .parse::<i32>()
            .map_err(|_| StatsError::invalid(format!("bad year in {s:?}")))?;
        let month = m
            .parse::<u32>()
            .map_err(|_| StatsError::invalid(format!("bad month in {s:?}")))?;
        Self::new(year, month)
    }
}

fn days_in(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap(year) => 29,
        2 => 28,
        _ => 31,
    }
}

fn is_leap(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn month_index(year: i32, month: u32) -> i64 {
    i64::from(year) * 12 + i64::from(month) - 1
}

/// Day 1..=7 is week 1, 8..=14 week 2, and so on.
pub fn week_of_month(date: NaiveDate) -> u32 {
    date.day0() / 7 + 1
}

/// 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketMode {
    /// Week-of-month buckets within one month.
    Weekly,
    /// Sunday..Saturday buckets within one month.
    Weekday,
    /// The trailing window of months ending at the reference month.
    Monthly,
}

impl BucketMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketMode::Weekly => "weekly",
            BucketMode::Weekday => "weekday",
            BucketMode::Monthly => "monthly",
        }
    }
}

impl fmt::Display for BucketMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketMode {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" | "weekly" => Ok(BucketMode::Weekly),
            "day" | "daily" | "weekday" => Ok(BucketMode::Weekday),
            "month" | "monthly" => Ok(BucketMode::Monthly),
            other => Err(StatsError::invalid(format!("unknown bucket mode: {other}"))),
        }
    }
}

/// Identity of one bucket. Ordering within a mode is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    /// 1-based week of month.
    Week(u32),
    /// 0 = Sunday.
    Weekday(u32),
    Month(YearMonth),
}

impl BucketKey {
    pub fn label(&self) -> String {
        match self {
            BucketKey::Week(n) => format!("Week {n}"),
            BucketKey::Weekday(i) => WEEKDAY_LABELS
                .get(*i as usize)
                .copied()
                .unwrap_or("?")
                .to_string(),
            BucketKey::Month(ym) => ym.to_string(),
        }
    }
}

/// Every bucket `mode` produces for `month`, in output order.
pub fn bucket_keys(mode: BucketMode, month: YearMonth) -> Result<Vec<BucketKey>, StatsError> {
    Ok(match mode {
        BucketMode::Weekly => (1..=month.week_count()).map(BucketKey::Week).collect(),
        BucketMode::Weekday => (0..7).map(BucketKey::Weekday).collect(),
        BucketMode::Monthly => month
            .trailing(TRAILING_MONTHS)?
            .into_iter()
            .map(BucketKey::Month)
            .collect(),
    })
}

/// The bucket `date` belongs to, or `None` when it lies outside the range
/// covered by `mode` for `month`.
pub fn assign(mode: BucketMode, month: YearMonth, date: NaiveDate) -> Option<BucketKey> {
    match mode {
        BucketMode::Weekly => month
            .contains(date)
            .then(|| BucketKey::Week(week_of_month(date))),
        BucketMode::Weekday => month
            .contains(date)
            .then(|| BucketKey::Weekday(weekday_index(date))),
        BucketMode::Monthly => {
            let newest = month_index(month.year(), month.month());
            let oldest = newest - i64::from(TRAILING_MONTHS) + 1;
            let idx = month_index(date.year(), date.month());
            if (oldest..=newest).contains(&idx) {
                YearMonth::of(date).ok().map(BucketKey::Month)
            } else {
                None
            }
        }
    }
}
