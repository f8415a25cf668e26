//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub mock_completion: bool,
    pub email_enabled: bool,
    pub active_sessions: usize,
    pub time: String,
}

/// `GET /api/health`: liveness plus which integrations are live.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let active_sessions = ctx.lock_sessions()?.len();

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        mock_completion: ctx.completion.is_mock_mode(),
        email_enabled: ctx.email.is_some(),
        active_sessions,
        time: chrono::Utc::now().to_rfc3339(),
    }))
}
