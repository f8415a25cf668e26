//! Chat session endpoints.
//!
//! - `POST   /api/chat/sessions`: open the chat surface
//! - `GET    /api/chat/sessions/:id`: poll (fires any due timers)
//! - `POST   /api/chat/sessions/:id/messages`: send user text
//! - `POST   /api/chat/sessions/:id/activity`: keystroke heartbeat
//! - `DELETE /api/chat/sessions/:id`: close the chat surface

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::chatbot::{SendOutcome, SessionSnapshot};

/// Longest accepted chat message, in characters.
const MAX_CHAT_CHARS: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct OpenSessionRequest {
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct SendMessageResponse {
    pub outcome: SendOutcome,
    pub session: SessionSnapshot,
}

#[derive(Serialize)]
pub struct CloseSessionResponse {
    pub id: Uuid,
    pub messages: usize,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid session id".into()))
}

/// `POST /api/chat/sessions`: open a session. The body is optional.
pub async fn open(
    State(ctx): State<ApiContext>,
    body: Option<Json<OpenSessionRequest>>,
) -> Result<(StatusCode, Json<SessionSnapshot>), ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let snapshot = ctx.lock_sessions()?.open(req.first_name, Instant::now())?;
    tracing::info!(session = %snapshot.id, "Chat session opened");
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// `GET /api/chat/sessions/:id`: current transcript and gate.
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let id = parse_id(&id)?;
    let snapshot = ctx
        .lock_sessions()?
        .with_session(id, Instant::now(), |s| s.snapshot())?;
    Ok(Json(snapshot))
}

/// `POST /api/chat/sessions/:id/messages`: send one user message.
pub async fn send(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if req.text.chars().count() > MAX_CHAT_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Message too long (max {MAX_CHAT_CHARS} chars)"
        )));
    }

    let (outcome, session) = ctx.lock_sessions()?.with_session(id, Instant::now(), |s| {
        let outcome = s.send(&req.text);
        (outcome, s.snapshot())
    })?;

    Ok(Json(SendMessageResponse { outcome, session }))
}

/// `POST /api/chat/sessions/:id/activity`: typing heartbeat.
pub async fn activity(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    ctx.lock_sessions()?
        .with_session(id, Instant::now(), |s| s.note_activity())?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/chat/sessions/:id`: close and discard the session.
pub async fn close(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<CloseSessionResponse>, ApiError> {
    let id = parse_id(&id)?;
    let transcript = ctx.lock_sessions()?.close(id)?;
    tracing::info!(session = %id, messages = transcript.len(), "Chat session closed by client");
    Ok(Json(CloseSessionResponse {
        id,
        messages: transcript.len(),
    }))
}
