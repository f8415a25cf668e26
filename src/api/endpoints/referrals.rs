//! `POST /api/referrals/send`: email a Champion invitation.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::referral::{build_referral_email, ReferralError, ReferralRequest};

#[derive(Serialize)]
pub struct ReferralResponse {
    pub sent: bool,
    pub provider: serde_json::Value,
}

pub async fn send(
    State(ctx): State<ApiContext>,
    Json(req): Json<ReferralRequest>,
) -> Result<Json<ReferralResponse>, ApiError> {
    let email = build_referral_email(&req, &ctx.config.email.from)?;
    let sender = ctx.email.clone().ok_or(ReferralError::NotConfigured)?;

    let provider = tokio::task::spawn_blocking(move || sender.send(&email))
        .await
        .map_err(|e| ApiError::Internal(format!("email task failed: {e}")))?
        .inspect_err(|e| tracing::error!(error = %e, "Referral email failed"))?;

    tracing::info!("Referral email sent");
    Ok(Json(ReferralResponse {
        sent: true,
        provider,
    }))
}
