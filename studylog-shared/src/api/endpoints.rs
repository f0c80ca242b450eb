use super::API_PREFIX;
use crate::domain::{RecordId, SubjectId};
use crate::stats::BucketMode;

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn api(base: &str, path: &str) -> String {
    base_join(base, &format!("{}/{}", API_PREFIX, path.trim_start_matches('/')))
}

pub fn health(base: &str) -> String {
    base_join(base, "/healthz")
}

pub fn records(base: &str) -> String {
    api(base, "records")
}
pub fn records_for_month(base: &str, year: i32, month: u32) -> String {
    api(base, &format!("records/{year}/{month}"))
}
pub fn record(base: &str, id: RecordId) -> String {
    api(base, &format!("records/{id}"))
}

pub fn subjects(base: &str) -> String {
    api(base, "subjects")
}
pub fn subject(base: &str, id: SubjectId) -> String {
    api(base, &format!("subjects/{id}"))
}

pub fn monthly_goals(base: &str) -> String {
    api(base, "monthly-goals")
}
pub fn monthly_goal(base: &str, year: i32, month: u32) -> String {
    api(base, &format!("monthly-goals/{year}/{month}"))
}

pub fn study_time(base: &str, year: i32, month: u32) -> String {
    api(base, &format!("study-time/{year}/{month}"))
}

/// Path segment used for a bucket mode under `/api/study-time/`.
pub fn series_segment(mode: BucketMode) -> &'static str {
    match mode {
        BucketMode::Weekly => "weekly",
        BucketMode::Monthly => "monthly",
        BucketMode::Weekday => "daily",
    }
}

pub fn study_time_series(base: &str, mode: BucketMode, year: i32, month: u32) -> String {
    api(
        base,
        &format!("study-time/{}/{year}/{month}", series_segment(mode)),
    )
}
pub fn subject_hours(base: &str, year: i32, month: u32) -> String {
    api(base, &format!("study-time/subjects/{year}/{month}"))
}

pub fn goal_progress(base: &str, year: i32, month: u32) -> String {
    api(base, &format!("goal-progress/{year}/{month}"))
}

pub fn chat(base: &str) -> String {
    api(base, "chat")
}
pub fn chat_history(base: &str) -> String {
    api(base, "chat-history")
}
