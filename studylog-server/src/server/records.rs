//! Study records, subjects and monthly goals.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use studylog_shared::api::{
    CreatedResp, Envelope, GoalReq, GoalResp, MessageResp, NewRecordReq, NewSubjectReq, RecordDto,
    RecordsResp, SubjectDto, SubjectsResp,
};
use studylog_shared::domain::{MAX_MINUTES_PART, RecordId, StudyType, SubjectId};
use studylog_shared::stats::YearMonth;
use tracing::info;

use super::{AppError, AppState, message, ok, year_month};
use crate::storage::RecordInput;
use crate::storage::models::{StudyRecord, Subject};

pub(crate) fn rfc3339(ts: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc).to_rfc3339()
}

fn record_dto(r: StudyRecord) -> Result<RecordDto, AppError> {
    let study_type = r
        .study_type
        .parse::<StudyType>()
        .map_err(AppError::internal)?;
    Ok(RecordDto {
        id: RecordId(r.id),
        date: r.date,
        subject: r.subject,
        hours: i64::from(r.hours),
        minutes: i64::from(r.minutes),
        study_type,
        comment: r.comment,
        created_at: rfc3339(r.created_at),
    })
}

fn subject_dto(s: Subject) -> SubjectDto {
    SubjectDto {
        id: SubjectId(s.id),
        name: s.name,
        comment: s.comment,
        created_at: rfc3339(s.created_at),
    }
}

/// Empty strings are treated as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn record_input(body: NewRecordReq) -> Result<RecordInput, AppError> {
    let date = NaiveDate::parse_from_str(body.date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("invalid date: {:?}", body.date)))?;
    let subject = body.subject.trim();
    if subject.is_empty() {
        return Err(AppError::bad_request("subject is required"));
    }
    let study_type = body
        .study_type
        .parse::<StudyType>()
        .map_err(|e| AppError::bad_request(e.to_string()))?;
    let hours = i32::try_from(body.hours)
        .ok()
        .filter(|h| *h >= 0)
        .ok_or_else(|| AppError::bad_request("hours must be a non-negative integer"))?;
    let minutes = i32::try_from(body.minutes)
        .ok()
        .filter(|m| (0..=MAX_MINUTES_PART as i32).contains(m))
        .ok_or_else(|| {
            AppError::bad_request(format!("minutes must be between 0 and {MAX_MINUTES_PART}"))
        })?;
    Ok(RecordInput {
        date,
        subject: subject.to_string(),
        hours,
        minutes,
        study_type,
        comment: non_empty(body.comment),
    })
}

pub(super) async fn create_record(
    State(state): State<AppState>,
    body: Result<Json<NewRecordReq>, JsonRejection>,
) -> Result<Json<Envelope<CreatedResp<RecordId>>>, AppError> {
    let Json(body) = body?;
    let input = record_input(body)?;
    let date = input.date;
    let id = state.store.add_record(input).await?;
    info!(record_id = id, %date, "study record added");
    Ok(ok(CreatedResp {
        message: "study record added".into(),
        id: RecordId(id),
    }))
}

pub(super) async fn list_records(
    State(state): State<AppState>,
    path: Result<Path<(i32, u32)>, PathRejection>,
) -> Result<Json<Envelope<RecordsResp>>, AppError> {
    let Path((year, month)) = path?;
    let ym = year_month(year, month)?;
    let rows = state.store.list_records_for_month(ym).await?;
    let records = rows
        .into_iter()
        .map(record_dto)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ok(RecordsResp { records }))
}

pub(super) async fn delete_record(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Envelope<MessageResp>>, AppError> {
    let Path(id) = path?;
    if !state.store.delete_record(id).await? {
        return Err(AppError::not_found(format!("study record {id} not found")));
    }
    info!(record_id = id, "study record deleted");
    Ok(ok(message("study record deleted")))
}

pub(super) async fn create_subject(
    State(state): State<AppState>,
    body: Result<Json<NewSubjectReq>, JsonRejection>,
) -> Result<Json<Envelope<CreatedResp<SubjectId>>>, AppError> {
    let Json(body) = body?;
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("subject name is required"));
    }
    let comment = non_empty(body.comment);
    let id = state.store.add_subject(name, comment.as_deref()).await?;
    info!(subject_id = id, subject = %name, "subject added");
    Ok(ok(CreatedResp {
        message: "subject added".into(),
        id: SubjectId(id),
    }))
}

pub(super) async fn list_subjects(
    State(state): State<AppState>,
) -> Result<Json<Envelope<SubjectsResp>>, AppError> {
    let rows = state.store.list_subjects().await?;
    Ok(ok(SubjectsResp {
        subjects: rows.into_iter().map(subject_dto).collect(),
    }))
}

pub(super) async fn delete_subject(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Envelope<MessageResp>>, AppError> {
    let Path(id) = path?;
    if !state.store.delete_subject(id).await? {
        return Err(AppError::not_found(format!("subject {id} not found")));
    }
    info!(subject_id = id, "subject deleted");
    Ok(ok(message("subject deleted")))
}

pub(super) async fn set_goal(
    State(state): State<AppState>,
    body: Result<Json<GoalReq>, JsonRejection>,
) -> Result<Json<Envelope<MessageResp>>, AppError> {
    let Json(body) = body?;
    let ym = year_month(body.year, body.month)?;
    state.store.upsert_goal(ym, body.target_hours).await?;
    info!(month = %ym, target_hours = body.target_hours, "monthly goal set");
    Ok(ok(message(format!("goal for {ym} saved"))))
}

/// Unset goals read as zero hours.
pub(crate) async fn goal_hours(state: &AppState, ym: YearMonth) -> Result<f64, AppError> {
    Ok(state.store.goal_for(ym).await?.unwrap_or(0.0))
}

pub(super) async fn get_goal(
    State(state): State<AppState>,
    path: Result<Path<(i32, u32)>, PathRejection>,
) -> Result<Json<Envelope<GoalResp>>, AppError> {
    let Path((year, month)) = path?;
    let ym = year_month(year, month)?;
    let target_hours = goal_hours(&state, ym).await?;
    Ok(ok(GoalResp { target_hours }))
}
