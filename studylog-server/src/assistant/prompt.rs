use chrono::NaiveDate;
use serde::Serialize;
use studylog_shared::stats::{self, StatsError};
use tinytemplate::TinyTemplate;

use crate::storage::models::StudyRecord;

const PROMPT_TEMPLATE: &str = include_str!("../../templates/chat_prompt.txt");

/// Days of history quoted verbatim in the prompt.
pub const RECENT_DAYS: u64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("template: {0}")]
    Template(#[from] tinytemplate::error::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectLine {
    pub subject: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentLine {
    pub date: NaiveDate,
    pub subject: String,
    pub hours: i32,
    pub minutes: i32,
}

/// The learner's situation as summarised for the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatContext {
    pub goal_hours: f64,
    pub study_hours: f64,
    /// Whole percent, rounded down so an unmet goal never reads 100.
    pub achievement_percent: i64,
    pub subjects: Vec<SubjectLine>,
    pub recent: Vec<RecentLine>,
}

impl ChatContext {
    /// `month_records` are this month's records; `recent_records` the last
    /// [`RECENT_DAYS`] days, in the order they should be listed.
    pub fn summarize(
        goal_hours: f64,
        month_records: &[StudyRecord],
        recent_records: &[StudyRecord],
    ) -> Result<Self, StatsError> {
        let entries: Vec<_> = month_records.iter().map(|r| r.duration_entry()).collect();
        let total = stats::total_minutes(&entries)?;
        let study_hours = stats::minutes_to_hours(total);
        let achievement_percent =
            stats::achievement_percent(goal_hours, stats::exact_hours(total)?)?.floor() as i64;
        let subjects = stats::group_totals(month_records.iter().map(|r| {
            (
                r.subject.clone(),
                i64::from(r.hours),
                i64::from(r.minutes),
            )
        }))?
        .into_iter()
        .map(|(subject, minutes)| SubjectLine {
            subject,
            hours: stats::minutes_to_hours(minutes),
        })
        .collect();
        let recent = recent_records
            .iter()
            .map(|r| RecentLine {
                date: r.date,
                subject: r.subject.clone(),
                hours: r.hours,
                minutes: r.minutes,
            })
            .collect();
        Ok(Self {
            goal_hours,
            study_hours,
            achievement_percent,
            subjects,
            recent,
        })
    }
}

#[derive(Serialize)]
struct PromptVars<'a> {
    goal_hours: f64,
    study_hours: f64,
    achievement_percent: i64,
    has_subjects: bool,
    subjects: &'a [SubjectLine],
    has_recent: bool,
    recent: &'a [RecentLine],
    reply_hint: String,
    message: &'a str,
}

/// Renders the assistant prompt. `reply_language`, when set, asks the model
/// to answer in that language.
pub fn render_prompt(
    ctx: &ChatContext,
    message: &str,
    reply_language: Option<&str>,
) -> Result<String, PromptError> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("chat", PROMPT_TEMPLATE)?;
    let vars = PromptVars {
        goal_hours: ctx.goal_hours,
        study_hours: ctx.study_hours,
        achievement_percent: ctx.achievement_percent,
        has_subjects: !ctx.subjects.is_empty(),
        subjects: &ctx.subjects,
        has_recent: !ctx.recent.is_empty(),
        recent: &ctx.recent,
        reply_hint: reply_language
            .filter(|l| !l.trim().is_empty())
            .map(|l| format!(", in {}", l.trim()))
            .unwrap_or_default(),
        message,
    };
    Ok(tt.render("chat", &vars)?)
}
