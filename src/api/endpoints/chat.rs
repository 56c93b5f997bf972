//! Health assistant chat.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::AuthUser;
use crate::api::{ApiContext, ApiError, Envelope};
use crate::authz;
use crate::db::repository::chat::{self as chat_repo, ChatMessage};
use crate::integrations::assistant;
use crate::models::enums::Role;

/// Exchanges pulled into the prompt context.
const CONTEXT_LIMIT: usize = 10;
const DEFAULT_HISTORY_LIMIT: usize = 50;
const MAX_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub session_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub intent: &'static str,
    pub suggestions: Vec<&'static str>,
}

pub async fn chat(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<Envelope<ChatReply>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    if body.message.trim().is_empty() {
        return Err(ApiError::Validation("message must not be empty".into()));
    }
    let session_id = body
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // History is read before the upstream call; the db lock must not be
    // held across the await.
    let (patient_id, history) = {
        let conn = ctx.db.lock().expect("db lock");
        let patient = super::own_patient(&conn, &user)?;
        let history = chat_repo::session_history(&conn, &patient.id, &session_id, CONTEXT_LIMIT)?;
        (patient.id, history)
    };

    let response = assistant::chat_reply(&ctx.http, &ctx.settings, &body.message, &history).await;
    let (intent, suggestions) = assistant::detect_intent(&body.message);

    {
        let conn = ctx.db.lock().expect("db lock");
        chat_repo::insert_message(
            &conn,
            &ChatMessage {
                id: Uuid::new_v4(),
                patient_id,
                session_id: session_id.clone(),
                message: body.message.clone(),
                response: response.clone(),
                created_at: Utc::now(),
            },
        )?;
    }

    Ok(Json(Envelope::ok_with(
        ChatReply {
            session_id,
            message: body.message,
            response,
            intent,
            suggestions,
        },
        "chat response generated",
    )))
}

pub async fn history(
    State(ctx): State<ApiContext>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Envelope<Vec<ChatMessage>>>, ApiError> {
    authz::authorize(&user, &[Role::Patient])?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let conn = ctx.db.lock().expect("db lock");
    let patient = super::own_patient(&conn, &user)?;
    let messages = match query.session_id.as_deref() {
        Some(session_id) => chat_repo::session_history(&conn, &patient.id, session_id, limit)?,
        None => chat_repo::recent_for_patient(&conn, &patient.id, limit)?,
    };
    Ok(Json(Envelope::ok(messages)))
}
