mod chat;
mod config;
mod records;
mod stats;

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Json, Router,
    http::{Method, StatusCode, header},
    routing::{delete, get, post},
};
use chrono::{NaiveDate, Utc};
pub use config::{AppConfig, AssistantConfig, ConfigError, DEFAULT_PORT};
use studylog_shared::api::{API_PREFIX, Envelope, MessageResp};
use studylog_shared::stats::{StatsError, YearMonth};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info_span;
use uuid::Uuid;

use crate::assistant::Assistant;
use crate::storage::{StorageError, Store};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    assistant: Option<Arc<dyn Assistant>>,
    tz: chrono_tz::Tz,
    // Pinned "today" for deterministic goal progress
    fixed_today: Option<NaiveDate>,
    shutdown: CancellationToken,
}

impl AppState {
    /// Fails only when the configured time zone is unknown.
    pub fn new(config: AppConfig, store: Store) -> Result<Self, ConfigError> {
        let tz = config.tz()?;
        Ok(Self {
            config,
            store,
            assistant: None,
            tz,
            fixed_today: None,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn Assistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    /// Current date in the configured time zone.
    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Utc::now().with_timezone(&self.tz).date_naive())
    }

    pub fn assistant(&self) -> Option<&Arc<dyn Assistant>> {
        self.assistant.as_ref()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/records", post(records::create_record))
        .route("/records/{year}/{month}", get(records::list_records))
        .route("/records/{id}", delete(records::delete_record))
        .route(
            "/subjects",
            post(records::create_subject).get(records::list_subjects),
        )
        .route("/subjects/{id}", delete(records::delete_subject))
        .route("/monthly-goals", post(records::set_goal))
        .route("/monthly-goals/{year}/{month}", get(records::get_goal))
        .route("/study-time/{year}/{month}", get(stats::study_time))
        .route("/study-time/weekly/{year}/{month}", get(stats::weekly_hours))
        .route(
            "/study-time/monthly/{year}/{month}",
            get(stats::monthly_hours),
        )
        .route("/study-time/daily/{year}/{month}", get(stats::weekday_hours))
        .route(
            "/study-time/subjects/{year}/{month}",
            get(stats::subject_hours),
        )
        .route("/goal-progress/{year}/{month}", get(stats::goal_progress))
        .route("/chat", post(chat::send_message))
        .route("/chat-history", get(chat::history))
        .fallback(api_not_found);

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
        )
    });

    let mut app = Router::new()
        .route("/healthz", get(health))
        .nest(API_PREFIX, api);

    app = match &state.config.static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.fallback(not_found),
    };

    let app = app
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    // Optionally add CORS for dev if configured
    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = header::HeaderValue::from_str(origin)
            .unwrap_or(header::HeaderValue::from_static("http://localhost:5173"));
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn api_not_found() -> AppError {
    AppError::not_found("no such endpoint")
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> AxumResponse {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    resp
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> AxumResponse {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // Statistics change with every new record
    if path == "/healthz" || path.starts_with("/api/") || path == "/api" {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert(
            HeaderName::from_static("pragma"),
            HeaderValue::from_static("no-cache"),
        );
    }

    resp
}

/// Shorthand for a successful enveloped JSON reply.
pub(crate) fn ok<T>(body: T) -> Json<Envelope<T>> {
    Json(Envelope::ok(body))
}

pub(crate) fn message(text: impl Into<String>) -> MessageResp {
    MessageResp {
        message: text.into(),
    }
}

/// Validates a `{year}/{month}` pair from the URL.
pub(crate) fn year_month(year: i32, month: u32) -> Result<YearMonth, AppError> {
    Ok(YearMonth::new(year, month)?)
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    ServiceUnavailable(String),
    BadGateway(String),
    Internal(String),
}

impl AppError {
    pub(crate) fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }
    pub(crate) fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    pub(crate) fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Duplicate(m) | StorageError::InvalidInput(m) => AppError::BadRequest(m),
            other => AppError::internal(other),
        }
    }
}

impl From<StatsError> for AppError {
    fn from(e: StatsError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, kind, detail) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, "bad_request", None),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m, "not_found", None),
            AppError::ServiceUnavailable(m) => {
                (StatusCode::SERVICE_UNAVAILABLE, m, "unavailable", None)
            }
            AppError::BadGateway(m) => (
                StatusCode::BAD_GATEWAY,
                "assistant request failed".into(),
                "upstream",
                Some(m),
            ),
            // Do not leak internal error details to clients, but log them
            AppError::Internal(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".into(),
                "internal",
                Some(m),
            ),
        };
        if let Some(detail) = detail {
            tracing::error!(status = %status, kind = kind, message = %msg, detail = %detail, "request failed");
        } else if status.is_server_error() {
            tracing::error!(status = %status, kind = kind, message = %msg, "request failed");
        } else {
            tracing::warn!(status = %status, kind = kind, message = %msg, "request rejected");
        }
        let body = Json(Envelope {
            success: false,
            body: MessageResp { message: msg },
        });
        (status, body).into_response()
    }
}
