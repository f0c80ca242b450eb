use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use studylog_shared::api::{
    Envelope, GoalProgressDto, MonthlyHoursDto, SeriesResp, StudyTimeResp, SubjectHoursDto,
    WeekdayHoursDto, WeeklyHoursDto,
};
use studylog_shared::stats::{
    self, Bucket, BucketKey, BucketMode, DurationEntry, GoalProgress, TRAILING_MONTHS, YearMonth,
};

use super::records::goal_hours;
use super::{AppError, AppState, ok, year_month};
use crate::storage::models::StudyRecord;

type MonthPath = Result<Path<(i32, u32)>, PathRejection>;

fn entries(rows: &[StudyRecord]) -> Vec<DurationEntry> {
    rows.iter().map(StudyRecord::duration_entry).collect()
}

async fn month_entries(state: &AppState, ym: YearMonth) -> Result<Vec<DurationEntry>, AppError> {
    let rows = state.store.list_records_for_month(ym).await?;
    Ok(entries(&rows))
}

/// Buckets for `mode`, reading only the records the mode can cover.
async fn series(
    state: &AppState,
    mode: BucketMode,
    ym: YearMonth,
) -> Result<Vec<Bucket>, AppError> {
    let entries = match mode {
        BucketMode::Weekly | BucketMode::Weekday => month_entries(state, ym).await?,
        BucketMode::Monthly => {
            let oldest = ym.window_start(TRAILING_MONTHS)?;
            let rows = state
                .store
                .list_records_between(oldest.first_day(), ym.last_day())
                .await?;
            entries(&rows)
        }
    };
    Ok(stats::bucketize(mode, ym, &entries)?)
}

pub(super) async fn study_time(
    State(state): State<AppState>,
    path: MonthPath,
) -> Result<Json<Envelope<StudyTimeResp>>, AppError> {
    let Path((year, month)) = path?;
    let ym = year_month(year, month)?;
    let total = stats::total_minutes(&month_entries(&state, ym).await?)?;
    let (hours, minutes) = stats::to_hours_minutes(total)?;
    Ok(ok(StudyTimeResp {
        hours,
        minutes,
        total_minutes: total,
    }))
}

pub(super) async fn weekly_hours(
    State(state): State<AppState>,
    path: MonthPath,
) -> Result<Json<Envelope<SeriesResp<WeeklyHoursDto>>>, AppError> {
    let Path((year, month)) = path?;
    let ym = year_month(year, month)?;
    let data = series(&state, BucketMode::Weekly, ym)
        .await?
        .into_iter()
        .filter_map(|b| match b.key {
            BucketKey::Week(week) => Some(WeeklyHoursDto {
                week,
                label: b.label(),
                hours: b.hours(),
            }),
            _ => None,
        })
        .collect();
    Ok(ok(SeriesResp { data }))
}

pub(super) async fn monthly_hours(
    State(state): State<AppState>,
    path: MonthPath,
) -> Result<Json<Envelope<SeriesResp<MonthlyHoursDto>>>, AppError> {
    let Path((year, month)) = path?;
    let ym = year_month(year, month)?;
    let data = series(&state, BucketMode::Monthly, ym)
        .await?
        .into_iter()
        .filter_map(|b| match b.key {
            BucketKey::Month(m) => Some(MonthlyHoursDto {
                year: m.year(),
                month: m.month(),
                label: b.label(),
                hours: b.hours(),
            }),
            _ => None,
        })
        .collect();
    Ok(ok(SeriesResp { data }))
}

pub(super) async fn weekday_hours(
    State(state): State<AppState>,
    path: MonthPath,
) -> Result<Json<Envelope<SeriesResp<WeekdayHoursDto>>>, AppError> {
    let Path((year, month)) = path?;
    let ym = year_month(year, month)?;
    let data = series(&state, BucketMode::Weekday, ym)
        .await?
        .into_iter()
        .filter_map(|b| match b.key {
            BucketKey::Weekday(weekday) => Some(WeekdayHoursDto {
                weekday,
                day: b.label(),
                hours: b.hours(),
            }),
            _ => None,
        })
        .collect();
    Ok(ok(SeriesResp { data }))
}

pub(super) async fn subject_hours(
    State(state): State<AppState>,
    path: MonthPath,
) -> Result<Json<Envelope<SeriesResp<SubjectHoursDto>>>, AppError> {
    let Path((year, month)) = path?;
    let ym = year_month(year, month)?;
    let rows = state.store.list_records_for_month(ym).await?;
    let data = stats::group_totals(
        rows.into_iter()
            .map(|r| (r.subject, i64::from(r.hours), i64::from(r.minutes))),
    )?
    .into_iter()
    .map(|(subject, minutes)| SubjectHoursDto {
        subject,
        hours: stats::minutes_to_hours(minutes),
    })
    .collect();
    Ok(ok(SeriesResp { data }))
}

pub(super) async fn goal_progress(
    State(state): State<AppState>,
    path: MonthPath,
) -> Result<Json<Envelope<GoalProgressDto>>, AppError> {
    let Path((year, month)) = path?;
    let ym = year_month(year, month)?;
    let goal = goal_hours(&state, ym).await?;
    let total = stats::total_minutes(&month_entries(&state, ym).await?)?;
    let progress = GoalProgress::compute(goal, total, ym, state.today())?;
    Ok(ok(GoalProgressDto::new(year, month, progress)))
}
