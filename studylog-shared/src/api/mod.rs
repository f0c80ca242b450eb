use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{RecordId, StudyType, SubjectId};
use crate::stats::GoalProgress;

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

pub const API_PREFIX: &str = "/api";

/// Every `/api` response: `{"success": bool, ...fields of T}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResp {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResp<I> {
    pub message: String,
    pub id: I,
}

// Study records
#[derive(Debug, Serialize, Deserialize)]
pub struct NewRecordReq {
    pub date: String, // YYYY-MM-DD
    pub subject: String,
    pub hours: i64,
    pub minutes: i64,
    pub study_type: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDto {
    pub id: RecordId,
    pub date: NaiveDate,
    pub subject: String,
    pub hours: i64,
    pub minutes: i64,
    pub study_type: StudyType,
    pub comment: Option<String>,
    pub created_at: String, // RFC3339 UTC
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordsResp {
    pub records: Vec<RecordDto>,
}

// Subjects
#[derive(Debug, Serialize, Deserialize)]
pub struct NewSubjectReq {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectDto {
    pub id: SubjectId,
    pub name: String,
    pub comment: Option<String>,
    pub created_at: String, // RFC3339 UTC
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubjectsResp {
    pub subjects: Vec<SubjectDto>,
}

// Monthly goals
#[derive(Debug, Serialize, Deserialize)]
pub struct GoalReq {
    pub year: i32,
    pub month: u32,
    pub target_hours: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GoalResp {
    pub target_hours: f64,
}

// Statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct StudyTimeResp {
    pub hours: i64,
    pub minutes: i64,
    pub total_minutes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeriesResp<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyHoursDto {
    pub week: u32,
    pub label: String,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyHoursDto {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekdayHoursDto {
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u32,
    pub day: String,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectHoursDto {
    pub subject: String,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProgressDto {
    pub year: i32,
    pub month: u32,
    pub goal_hours: f64,
    pub study_hours: f64,
    pub achievement_percent: f64,
    pub remaining_days: u32,
    pub daily_goal: f64,
}

impl GoalProgressDto {
    pub fn new(year: i32, month: u32, p: GoalProgress) -> Self {
        Self {
            year,
            month,
            goal_hours: p.goal_hours,
            study_hours: p.study_hours,
            achievement_percent: p.achievement_percent,
            remaining_days: p.remaining_days,
            daily_goal: p.daily_goal,
        }
    }
}

// Assistant chat
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReq {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResp {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatExchangeDto {
    pub id: i32,
    pub user_message: String,
    pub ai_response: String,
    pub created_at: String, // RFC3339 UTC
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatHistoryResp {
    pub history: Vec<ChatExchangeDto>,
}
