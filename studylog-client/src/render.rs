//! Plain-text rendering of API responses.

use std::fmt::Write as _;

use studylog_shared::api::{ChatExchangeDto, GoalProgressDto, RecordDto, SubjectDto};

const BAR_WIDTH: f64 = 30.0;

/// One row per bucket: label, hours, and a bar scaled to the largest value.
pub fn series(rows: &[(String, f64)]) -> String {
    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let peak = rows.iter().map(|(_, h)| *h).fold(0.0_f64, f64::max);
    let mut out = String::new();
    for (label, hours) in rows {
        let len = if peak > 0.0 {
            (hours / peak * BAR_WIDTH).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{label:<label_width$}  {hours:>6.1}h  {}",
            "#".repeat(len)
        );
    }
    out
}

pub fn series_of<T>(items: &[T], row: impl Fn(&T) -> (String, f64)) -> String {
    series(&items.iter().map(row).collect::<Vec<_>>())
}

pub fn records(records: &[RecordDto]) -> String {
    if records.is_empty() {
        return "no records\n".into();
    }
    let mut out = String::new();
    for r in records {
        let _ = write!(
            out,
            "#{:<5} {}  {:<16} {:>2}h {:02}m  {}",
            r.id, r.date, r.subject, r.hours, r.minutes, r.study_type
        );
        if let Some(c) = &r.comment {
            let _ = write!(out, "  ({c})");
        }
        out.push('\n');
    }
    out
}

pub fn subjects(subjects: &[SubjectDto]) -> String {
    if subjects.is_empty() {
        return "no subjects\n".into();
    }
    let mut out = String::new();
    for s in subjects {
        let _ = match &s.comment {
            Some(c) => writeln!(out, "#{:<5} {}  ({c})", s.id, s.name),
            None => writeln!(out, "#{:<5} {}", s.id, s.name),
        };
    }
    out
}

pub fn progress(p: &GoalProgressDto) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:04}-{:02}", p.year, p.month);
    let _ = writeln!(out, "goal:         {:.1}h", p.goal_hours);
    let _ = writeln!(out, "studied:      {:.1}h", p.study_hours);
    let _ = writeln!(out, "achievement:  {:.1}%", p.achievement_percent);
    let _ = writeln!(out, "days left:    {}", p.remaining_days);
    let _ = writeln!(out, "needed/day:   {:.1}h", p.daily_goal);
    out
}

/// Oldest exchange first, so the latest ends up nearest the prompt.
pub fn history(items: &[ChatExchangeDto]) -> String {
    if items.is_empty() {
        return "no conversations yet\n".into();
    }
    let mut out = String::new();
    for item in items.iter().rev() {
        let _ = writeln!(out, "[{}]", item.created_at);
        let _ = writeln!(out, "you: {}", item.user_message);
        let _ = writeln!(out, "assistant: {}\n", item.ai_response.trim_end());
    }
    out
}
