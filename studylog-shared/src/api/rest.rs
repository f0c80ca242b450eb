//! Minimal REST client helpers for consumers (the CLI client, scripts).

use super::endpoints as ep;
use super::*;
use crate::stats::BucketMode;
use once_cell::sync::Lazy;
use std::time::Duration;

pub use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("serde: {0}")]
    Serde(String),
}

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        // Chat requests wait on the generative model
        .timeout(Duration::from_secs(120))
        .build()
        .unwrap_or_default()
});

fn mk_client() -> reqwest::Client {
    HTTP_CLIENT.clone()
}

async fn handle_json<T: for<'de> serde::Deserialize<'de>>(
    res: reqwest::Response,
) -> Result<T, RestError> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        // Prefer the envelope's message; fall back to the raw body
        let message = serde_json::from_str::<Envelope<MessageResp>>(&text)
            .map(|e| e.body.message)
            .unwrap_or(text);
        return Err(RestError::Status {
            status: status.as_u16(),
            message,
        });
    }
    res.json::<Envelope<T>>()
        .await
        .map(|e| e.body)
        .map_err(|e| RestError::Serde(e.to_string()))
}

async fn get<T: for<'de> serde::Deserialize<'de>>(url: String) -> Result<T, RestError> {
    let res = mk_client()
        .get(url)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

async fn post<B: serde::Serialize, T: for<'de> serde::Deserialize<'de>>(
    url: String,
    body: &B,
) -> Result<T, RestError> {
    let res = mk_client()
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

async fn delete(url: String) -> Result<MessageResp, RestError> {
    let res = mk_client()
        .delete(url)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn health(base: &str) -> Result<(), RestError> {
    let res = mk_client()
        .get(ep::health(base))
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    let status = res.status();
    if !status.is_success() {
        return Err(RestError::Status {
            status: status.as_u16(),
            message: res.text().await.unwrap_or_default(),
        });
    }
    Ok(())
}

pub async fn add_record(
    base: &str,
    req: &NewRecordReq,
) -> Result<CreatedResp<RecordId>, RestError> {
    post(ep::records(base), req).await
}

pub async fn list_records(base: &str, year: i32, month: u32) -> Result<Vec<RecordDto>, RestError> {
    let resp: RecordsResp = get(ep::records_for_month(base, year, month)).await?;
    Ok(resp.records)
}

pub async fn delete_record(base: &str, id: RecordId) -> Result<MessageResp, RestError> {
    delete(ep::record(base, id)).await
}

pub async fn add_subject(
    base: &str,
    req: &NewSubjectReq,
) -> Result<CreatedResp<SubjectId>, RestError> {
    post(ep::subjects(base), req).await
}

pub async fn list_subjects(base: &str) -> Result<Vec<SubjectDto>, RestError> {
    let resp: SubjectsResp = get(ep::subjects(base)).await?;
    Ok(resp.subjects)
}

pub async fn delete_subject(base: &str, id: SubjectId) -> Result<MessageResp, RestError> {
    delete(ep::subject(base, id)).await
}

pub async fn set_monthly_goal(base: &str, req: &GoalReq) -> Result<MessageResp, RestError> {
    post(ep::monthly_goals(base), req).await
}

pub async fn monthly_goal(base: &str, year: i32, month: u32) -> Result<GoalResp, RestError> {
    get(ep::monthly_goal(base, year, month)).await
}

pub async fn study_time(base: &str, year: i32, month: u32) -> Result<StudyTimeResp, RestError> {
    get(ep::study_time(base, year, month)).await
}

pub async fn weekly_hours(
    base: &str,
    year: i32,
    month: u32,
) -> Result<Vec<WeeklyHoursDto>, RestError> {
    let resp: SeriesResp<WeeklyHoursDto> =
        get(ep::study_time_series(base, BucketMode::Weekly, year, month)).await?;
    Ok(resp.data)
}

pub async fn monthly_hours(
    base: &str,
    year: i32,
    month: u32,
) -> Result<Vec<MonthlyHoursDto>, RestError> {
    let resp: SeriesResp<MonthlyHoursDto> =
        get(ep::study_time_series(base, BucketMode::Monthly, year, month)).await?;
    Ok(resp.data)
}

pub async fn weekday_hours(
    base: &str,
    year: i32,
    month: u32,
) -> Result<Vec<WeekdayHoursDto>, RestError> {
    let resp: SeriesResp<WeekdayHoursDto> =
        get(ep::study_time_series(base, BucketMode::Weekday, year, month)).await?;
    Ok(resp.data)
}

pub async fn subject_hours(
    base: &str,
    year: i32,
    month: u32,
) -> Result<Vec<SubjectHoursDto>, RestError> {
    let resp: SeriesResp<SubjectHoursDto> = get(ep::subject_hours(base, year, month)).await?;
    Ok(resp.data)
}

pub async fn goal_progress(
    base: &str,
    year: i32,
    month: u32,
) -> Result<GoalProgressDto, RestError> {
    get(ep::goal_progress(base, year, month)).await
}

pub async fn chat(base: &str, message: &str) -> Result<ChatResp, RestError> {
    let body = ChatReq {
        message: message.to_string(),
    };
    post(ep::chat(base), &body).await
}

pub async fn chat_history(base: &str) -> Result<Vec<ChatExchangeDto>, RestError> {
    let resp: ChatHistoryResp = get(ep::chat_history(base)).await?;
    Ok(resp.history)
}
