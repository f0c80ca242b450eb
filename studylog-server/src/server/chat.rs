use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::Days;
use studylog_shared::api::{ChatExchangeDto, ChatHistoryResp, ChatReq, ChatResp, Envelope};
use studylog_shared::stats::YearMonth;
use tracing::{info, warn};

use super::records::{goal_hours, rfc3339};
use super::{AppError, AppState, ok};
use crate::assistant::prompt::{ChatContext, RECENT_DAYS, render_prompt};

/// Exchanges returned by the history endpoint.
pub const HISTORY_LIMIT: i64 = 50;

pub(super) async fn send_message(
    State(state): State<AppState>,
    body: Result<Json<ChatReq>, JsonRejection>,
) -> Result<Json<Envelope<ChatResp>>, AppError> {
    let Json(body) = body?;
    let text = body.message.trim();
    if text.is_empty() {
        return Err(AppError::bad_request("message is required"));
    }
    let Some(assistant) = state.assistant().cloned() else {
        return Err(AppError::ServiceUnavailable(
            "assistant is not configured".into(),
        ));
    };

    let today = state.today();
    let month = YearMonth::of(today)?;
    let goal = goal_hours(&state, month).await?;
    let month_records = state.store.list_records_for_month(month).await?;
    let since = today
        .checked_sub_days(Days::new(RECENT_DAYS))
        .unwrap_or(today);
    let recent_records = state.store.list_records_since(since).await?;
    let ctx = ChatContext::summarize(goal, &month_records, &recent_records)?;
    let reply_language = state
        .config
        .assistant
        .as_ref()
        .and_then(|a| a.reply_language.as_deref());
    let prompt = render_prompt(&ctx, text, reply_language).map_err(AppError::internal)?;

    let reply = assistant.generate(&prompt).await.map_err(|e| {
        warn!(error = %e, "assistant call failed");
        AppError::BadGateway(e.to_string())
    })?;
    let id = state.store.add_chat_exchange(text, &reply).await?;
    info!(exchange_id = id, "chat exchange stored");
    Ok(ok(ChatResp { response: reply }))
}

pub(super) async fn history(
    State(state): State<AppState>,
) -> Result<Json<Envelope<ChatHistoryResp>>, AppError> {
    let rows = state.store.list_chat_history(HISTORY_LIMIT).await?;
    let history = rows
        .into_iter()
        .map(|c| ChatExchangeDto {
            id: c.id,
            user_message: c.user_message,
            ai_response: c.ai_response,
            created_at: rfc3339(c.created_at),
        })
        .collect();
    Ok(ok(ChatHistoryResp { history }))
}
