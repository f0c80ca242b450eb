pub mod models;
pub mod schema;

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use models::{
    ChatExchange, NewChatExchange, NewMonthlyGoal, NewStudyRecord, NewSubject, StudyRecord,
    Subject,
};
use studylog_shared::domain::StudyType;
use studylog_shared::stats::YearMonth;
use tracing::trace;

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// A unique key already holds this value.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// The caller supplied invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A validated study session ready to be stored.
#[derive(Debug, Clone)]
pub struct RecordInput {
    pub date: NaiveDate,
    pub subject: String,
    pub hours: i32,
    pub minutes: i32,
    pub study_type: StudyType,
    pub comment: Option<String>,
}

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder().max_size(8).build(manager)?;

        // Run pending Diesel migrations on startup (auto-init empty DBs)
        {
            let pool_clone = pool.clone();
            tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
                const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
                let mut conn = pool_clone.get()?;
                configure_sqlite_conn(&mut conn)?;
                conn.run_pending_migrations(MIGRATIONS)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                Ok(())
            })
            .await??;
        }

        Ok(Store { pool })
    }

    /// Runs `f` on a pooled connection off the async executor.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            f(&mut conn)
        })
        .await?
    }

    // Study records

    pub async fn add_record(&self, input: RecordInput) -> Result<i32, StorageError> {
        use schema::study_records;
        if input.hours < 0 || !(0..=59).contains(&input.minutes) {
            return Err(StorageError::InvalidInput(format!(
                "duration out of range: {}h {}m",
                input.hours, input.minutes
            )));
        }
        trace!(date = %input.date, subject = %input.subject, "add_record");
        self.blocking(move |conn| {
            let row = NewStudyRecord {
                date: input.date,
                subject: &input.subject,
                hours: input.hours,
                minutes: input.minutes,
                study_type: input.study_type.as_str(),
                comment: input.comment.as_deref(),
            };
            Ok(diesel::insert_into(study_records::table)
                .values(&row)
                .returning(study_records::id)
                .get_result::<i32>(conn)?)
        })
        .await
    }

    /// Records dated within `[from, to]`, newest date first.
    pub async fn list_records_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StudyRecord>, StorageError> {
        use schema::study_records::dsl as sr;
        if to < from {
            return Ok(Vec::new());
        }
        self.blocking(move |conn| {
            Ok(sr::study_records
                .filter(sr::date.ge(from))
                .filter(sr::date.le(to))
                .order((sr::date.desc(), sr::id.desc()))
                .load::<StudyRecord>(conn)?)
        })
        .await
    }

    /// Records dated `from` or later, future dates included, newest first.
    pub async fn list_records_since(
        &self,
        from: NaiveDate,
    ) -> Result<Vec<StudyRecord>, StorageError> {
        use schema::study_records::dsl as sr;
        self.blocking(move |conn| {
            Ok(sr::study_records
                .filter(sr::date.ge(from))
                .order((sr::date.desc(), sr::id.desc()))
                .load::<StudyRecord>(conn)?)
        })
        .await
    }

    pub async fn list_records_for_month(
        &self,
        month: YearMonth,
    ) -> Result<Vec<StudyRecord>, StorageError> {
        self.list_records_between(month.first_day(), month.last_day())
            .await
    }

    pub async fn delete_record(&self, record_id: i32) -> Result<bool, StorageError> {
        use schema::study_records::dsl::*;
        self.blocking(move |conn| {
            let deleted = diesel::delete(study_records.filter(id.eq(record_id))).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    // Subjects

    pub async fn add_subject(
        &self,
        name: &str,
        comment: Option<&str>,
    ) -> Result<i32, StorageError> {
        use schema::subjects;
        let name_owned = name.to_string();
        let comment_owned = comment.map(|s| s.to_string());
        self.blocking(move |conn| {
            let row = NewSubject {
                name: &name_owned,
                comment: comment_owned.as_deref(),
            };
            match diesel::insert_into(subjects::table)
                .values(&row)
                .returning(subjects::id)
                .get_result::<i32>(conn)
            {
                Ok(new_id) => Ok(new_id),
                Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    Err(StorageError::Duplicate(format!(
                        "subject already exists: {name_owned}"
                    )))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// All subjects, most recently created first.
    pub async fn list_subjects(&self) -> Result<Vec<Subject>, StorageError> {
        use schema::subjects::dsl::*;
        self.blocking(move |conn| {
            Ok(subjects
                .order((created_at.desc(), id.desc()))
                .load::<Subject>(conn)?)
        })
        .await
    }

    /// Study records naming the subject are left untouched.
    pub async fn delete_subject(&self, subject_id: i32) -> Result<bool, StorageError> {
        use schema::subjects::dsl::*;
        self.blocking(move |conn| {
            let deleted = diesel::delete(subjects.filter(id.eq(subject_id))).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    // Monthly goals

    pub async fn upsert_goal(
        &self,
        month: YearMonth,
        target_hours: f64,
    ) -> Result<(), StorageError> {
        use schema::monthly_goals;
        if !target_hours.is_finite() || target_hours < 0.0 {
            return Err(StorageError::InvalidInput(format!(
                "target hours must be a non-negative number, got {target_hours}"
            )));
        }
        let (y, m) = (month.year(), month.month() as i32);
        self.blocking(move |conn| {
            let now = Utc::now().naive_utc();
            let row = NewMonthlyGoal {
                year: y,
                month: m,
                target_hours,
                updated_at: now,
            };
            diesel::insert_into(monthly_goals::table)
                .values(&row)
                .on_conflict((monthly_goals::year, monthly_goals::month))
                .do_update()
                .set((
                    monthly_goals::target_hours.eq(target_hours),
                    monthly_goals::updated_at.eq(now),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn goal_for(&self, month: YearMonth) -> Result<Option<f64>, StorageError> {
        use schema::monthly_goals::dsl as mg;
        let (y, m) = (month.year(), month.month() as i32);
        self.blocking(move |conn| {
            Ok(mg::monthly_goals
                .filter(mg::year.eq(y))
                .filter(mg::month.eq(m))
                .select(mg::target_hours)
                .first::<f64>(conn)
                .optional()?)
        })
        .await
    }

    // Assistant chat history

    pub async fn add_chat_exchange(
        &self,
        user_message: &str,
        ai_response: &str,
    ) -> Result<i32, StorageError> {
        use schema::chat_history;
        let user_owned = user_message.to_string();
        let ai_owned = ai_response.to_string();
        self.blocking(move |conn| {
            let row = NewChatExchange {
                user_message: &user_owned,
                ai_response: &ai_owned,
            };
            Ok(diesel::insert_into(chat_history::table)
                .values(&row)
                .returning(chat_history::id)
                .get_result::<i32>(conn)?)
        })
        .await
    }

    /// Newest first, at most `limit` rows.
    pub async fn list_chat_history(&self, limit: i64) -> Result<Vec<ChatExchange>, StorageError> {
        use schema::chat_history::dsl::*;
        let limit = limit.clamp(1, 1000);
        self.blocking(move |conn| {
            Ok(chat_history
                .order((created_at.desc(), id.desc()))
                .limit(limit)
                .load::<ChatExchange>(conn)?)
        })
        .await
    }
}

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // Enable WAL for better read/write concurrency and set a busy timeout
    // Ignore the result rows; Diesel's execute is fine for PRAGMAs
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    Ok(())
}
