use crate::storage::schema::{chat_history, monthly_goals, study_records, subjects};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use studylog_shared::stats::DurationEntry;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = subjects)]
pub struct Subject {
    pub id: i32,
    pub name: String,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = subjects)]
pub struct NewSubject<'a> {
    pub name: &'a str,
    pub comment: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = study_records)]
pub struct StudyRecord {
    pub id: i32,
    pub date: NaiveDate,
    pub subject: String,
    pub hours: i32,
    pub minutes: i32,
    pub study_type: String,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

impl StudyRecord {
    pub fn duration_entry(&self) -> DurationEntry {
        DurationEntry::new(self.date, i64::from(self.hours), i64::from(self.minutes))
    }
}

#[derive(Insertable)]
#[diesel(table_name = study_records)]
pub struct NewStudyRecord<'a> {
    pub date: NaiveDate,
    pub subject: &'a str,
    pub hours: i32,
    pub minutes: i32,
    pub study_type: &'a str,
    pub comment: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = monthly_goals)]
pub struct NewMonthlyGoal {
    pub year: i32,
    pub month: i32,
    pub target_hours: f64,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = chat_history)]
pub struct ChatExchange {
    pub id: i32,
    pub user_message: String,
    pub ai_response: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = chat_history)]
pub struct NewChatExchange<'a> {
    pub user_message: &'a str,
    pub ai_response: &'a str,
}
