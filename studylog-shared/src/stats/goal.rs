use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::StatsError;
use super::calendar::YearMonth;
use super::duration::{MINUTES_PER_HOUR, minutes_to_hours};

fn check_hours(name: &str, value: f64) -> Result<(), StatsError> {
    if !value.is_finite() || value < 0.0 {
        return Err(StatsError::invalid(format!(
            "{name} must be a finite non-negative number, got {value}"
        )));
    }
    Ok(())
}

fn check_finite(name: &str, value: f64) -> Result<(), StatsError> {
    if !value.is_finite() {
        return Err(StatsError::invalid(format!(
            "{name} must be finite, got {value}"
        )));
    }
    Ok(())
}

/// Unrounded hours for `minutes`.
pub fn exact_hours(minutes: i64) -> Result<f64, StatsError> {
    if minutes < 0 {
        return Err(StatsError::invalid(format!(
            "study minutes must be non-negative, got {minutes}"
        )));
    }
    Ok(minutes as f64 / MINUTES_PER_HOUR as f64)
}

/// Studied hours as a percentage of the goal, capped at 100.
///
/// A goal of zero or less yields 0.
pub fn achievement_percent(goal_hours: f64, study_hours: f64) -> Result<f64, StatsError> {
    check_finite("goal hours", goal_hours)?;
    check_hours("study hours", study_hours)?;
    if goal_hours <= 0.0 {
        return Ok(0.0);
    }
    Ok((study_hours / goal_hours * 100.0).min(100.0))
}

/// Days left in `month` after `today`; 0 when `today` is not in that month.
pub fn remaining_days(month: YearMonth, today: NaiveDate) -> u32 {
    if !month.contains(today) {
        return 0;
    }
    month.days_in_month().saturating_sub(today.day())
}

/// Hours per remaining day needed to reach the goal, rounded up to a tenth.
pub fn daily_goal(
    goal_hours: f64,
    study_hours: f64,
    remaining_days: u32,
) -> Result<f64, StatsError> {
    check_finite("goal hours", goal_hours)?;
    check_hours("study hours", study_hours)?;
    if remaining_days == 0 {
        return Ok(0.0);
    }
    let outstanding = (goal_hours - study_hours).max(0.0);
    Ok((outstanding / f64::from(remaining_days) * 10.0).ceil() / 10.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal_hours: f64,
    pub study_hours: f64,
    pub achievement_percent: f64,
    pub remaining_days: u32,
    pub daily_goal: f64,
}

impl GoalProgress {
    /// Achievement and pace use the exact studied time; only the reported
    /// `study_hours` is rounded to a tenth.
    pub fn compute(
        goal_hours: f64,
        study_minutes: i64,
        month: YearMonth,
        today: NaiveDate,
    ) -> Result<Self, StatsError> {
        let exact_hours = exact_hours(study_minutes)?;
        let achievement_percent = achievement_percent(goal_hours, exact_hours)?;
        let remaining_days = remaining_days(month, today);
        let daily_goal = daily_goal(goal_hours, exact_hours, remaining_days)?;
        Ok(Self {
            goal_hours,
            study_hours: minutes_to_hours(study_minutes),
            achievement_percent,
            remaining_days,
            daily_goal,
        })
    }
}
