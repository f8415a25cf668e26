//! `POST /api/completion`: free-form question to the language model.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::completion::CompletionReply;

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    #[serde(default, alias = "prompt")]
    pub message: String,
}

pub async fn complete(
    State(ctx): State<ApiContext>,
    Json(req): Json<CompletionRequest>,
) -> Result<Json<CompletionReply>, ApiError> {
    let service = ctx.completion.clone();
    let reply = tokio::task::spawn_blocking(move || service.complete(&req.message))
        .await
        .map_err(|e| ApiError::Internal(format!("completion task failed: {e}")))??;

    tracing::debug!(mock = reply.mock, "Completion answered");
    Ok(Json(reply))
}
