use super::StatsError;

pub const MINUTES_PER_HOUR: i64 = 60;

/// `hours * 60 + minutes`.
///
/// `minutes` is not range-checked; callers that accept user input keep it
/// within 0..=59. Negative components are rejected.
pub fn to_minutes(hours: i64, minutes: i64) -> Result<i64, StatsError> {
    if hours < 0 {
        return Err(StatsError::invalid(format!("negative hours: {hours}")));
    }
    if minutes < 0 {
        return Err(StatsError::invalid(format!("negative minutes: {minutes}")));
    }
    hours
        .checked_mul(MINUTES_PER_HOUR)
        .and_then(|h| h.checked_add(minutes))
        .ok_or_else(|| StatsError::invalid("duration overflows i64 minutes"))
}

/// Splits a minute count back into whole hours and the leftover minutes.
pub fn to_hours_minutes(total_minutes: i64) -> Result<(i64, i64), StatsError> {
    if total_minutes < 0 {
        return Err(StatsError::invalid(format!(
            "negative total minutes: {total_minutes}"
        )));
    }
    Ok((
        total_minutes / MINUTES_PER_HOUR,
        total_minutes % MINUTES_PER_HOUR,
    ))
}

/// Fractional hours rounded to one decimal place.
pub fn minutes_to_hours(total_minutes: i64) -> f64 {
    round_tenth(total_minutes as f64 / MINUTES_PER_HOUR as f64)
}

pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
