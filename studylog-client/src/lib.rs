use chrono::{Local, NaiveDate};
use serde::Serialize;
use studylog_shared::api::{self, GoalReq, NewRecordReq, NewSubjectReq, rest::RestError};
use studylog_shared::domain::{RecordId, SubjectId};
use studylog_shared::stats::{StatsError, YearMonth};
use tracing::debug;

pub mod cli;
pub mod config;
pub mod render;

pub use cli::{Cli, Command, GoalCommand, StatsView, SubjectsCommand};
pub use config::{ClientConfig, load_config, resolve_config_path};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("{0}")]
    Server(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Stats(#[from] StatsError),
}

impl From<RestError> for AppError {
    fn from(e: RestError) -> Self {
        match e {
            RestError::Status { status, message } => {
                AppError::Server(format!("server rejected request ({status}): {message}"))
            }
            other => AppError::Http(other.to_string()),
        }
    }
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn month_or_current(month: Option<YearMonth>) -> Result<YearMonth, AppError> {
    match month {
        Some(m) => Ok(m),
        None => Ok(YearMonth::of(today())?),
    }
}

/// Prints `value` as JSON when requested, otherwise the rendered text.
fn emit<T: Serialize>(
    json: bool,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<(), AppError> {
    if json {
        let s = serde_json::to_string_pretty(value)
            .map_err(|e| AppError::Io(std::io::Error::other(e)))?;
        println!("{s}");
    } else {
        print!("{}", text(value));
    }
    Ok(())
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    init_tracing();

    let cfg_path = resolve_config_path(cli.config.clone())?;
    if let Command::SetServer { url } = &cli.command {
        let cfg = ClientConfig {
            server_url: config::normalize_server_url(url),
        };
        config::save_config(&cfg_path, &cfg)?;
        println!("saved {} to {}", cfg.server_url, cfg_path.display());
        return Ok(());
    }

    let base = config::resolve_server_url(cli.server.as_deref(), &cfg_path)?;
    debug!(server = %base, config = %cfg_path.display(), "resolved server");
    let json = cli.json;

    match cli.command {
        Command::Record {
            subject,
            hours,
            minutes,
            study_type,
            date,
            comment,
        } => {
            let req = NewRecordReq {
                date: date.unwrap_or_else(today).to_string(),
                subject,
                hours,
                minutes,
                study_type: study_type.to_string(),
                comment,
            };
            let resp = api::rest::add_record(&base, &req).await?;
            emit(json, &resp, |r| format!("{} (#{})\n", r.message, r.id))
        }
        Command::Records { month } => {
            let ym = month_or_current(month)?;
            let records = api::rest::list_records(&base, ym.year(), ym.month()).await?;
            emit(json, &records, |r| render::records(r))
        }
        Command::DeleteRecord { id } => {
            let resp = api::rest::delete_record(&base, RecordId(id)).await?;
            emit(json, &resp, |r| format!("{}\n", r.message))
        }
        Command::Subjects { action } => match action.unwrap_or(SubjectsCommand::List) {
            SubjectsCommand::List => {
                let subjects = api::rest::list_subjects(&base).await?;
                emit(json, &subjects, |s| render::subjects(s))
            }
            SubjectsCommand::Add { name, comment } => {
                let resp = api::rest::add_subject(&base, &NewSubjectReq { name, comment }).await?;
                emit(json, &resp, |r| format!("{} (#{})\n", r.message, r.id))
            }
            SubjectsCommand::Delete { id } => {
                let resp = api::rest::delete_subject(&base, SubjectId(id)).await?;
                emit(json, &resp, |r| format!("{}\n", r.message))
            }
        },
        Command::Goal { action } => match action {
            GoalCommand::Set { hours, month } => {
                let ym = month_or_current(month)?;
                let req = GoalReq {
                    year: ym.year(),
                    month: ym.month(),
                    target_hours: hours,
                };
                let resp = api::rest::set_monthly_goal(&base, &req).await?;
                emit(json, &resp, |r| format!("{}\n", r.message))
            }
            GoalCommand::Show { month } => {
                let ym = month_or_current(month)?;
                let resp = api::rest::monthly_goal(&base, ym.year(), ym.month()).await?;
                emit(json, &resp, |g| format!("{ym}: {:.1}h\n", g.target_hours))
            }
        },
        Command::Stats { view, month } => {
            let ym = month_or_current(month)?;
            let (y, m) = (ym.year(), ym.month());
            match view {
                StatsView::Weekly => {
                    let data = api::rest::weekly_hours(&base, y, m).await?;
                    emit(json, &data, |d| {
                        render::series_of(d, |w| (w.label.clone(), w.hours))
                    })
                }
                StatsView::Monthly => {
                    let data = api::rest::monthly_hours(&base, y, m).await?;
                    emit(json, &data, |d| {
                        render::series_of(d, |w| (w.label.clone(), w.hours))
                    })
                }
                StatsView::Weekday => {
                    let data = api::rest::weekday_hours(&base, y, m).await?;
                    emit(json, &data, |d| render::series_of(d, |w| (w.day.clone(), w.hours)))
                }
                StatsView::Subjects => {
                    let data = api::rest::subject_hours(&base, y, m).await?;
                    emit(json, &data, |d| {
                        if d.is_empty() {
                            return "no records\n".into();
                        }
                        render::series_of(d, |s| (s.subject.clone(), s.hours))
                    })
                }
            }
        }
        Command::Progress { month } => {
            let ym = month_or_current(month)?;
            let p = api::rest::goal_progress(&base, ym.year(), ym.month()).await?;
            emit(json, &p, render::progress)
        }
        Command::Chat { message } => {
            let text = message.join(" ");
            let resp = api::rest::chat(&base, &text).await?;
            emit(json, &resp, |r| format!("{}\n", r.response.trim_end()))
        }
        Command::History => {
            let items = api::rest::chat_history(&base).await?;
            emit(json, &items, |h| render::history(h))
        }
        Command::SetServer { .. } => Ok(()),
    }
}
