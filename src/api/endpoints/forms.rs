//! Form validation endpoints. Submissions themselves go to the hosted
//! backend; these only report field errors.

use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::forms::{validate_lead, validate_signup, LeadForm, SignupForm};

#[derive(Serialize)]
pub struct FormAccepted {
    pub valid: bool,
}

/// `POST /api/forms/lead`
pub async fn lead(Json(form): Json<LeadForm>) -> Result<Json<FormAccepted>, ApiError> {
    validate_lead(&form)?;
    Ok(Json(FormAccepted { valid: true }))
}

/// `POST /api/forms/signup`
pub async fn signup(Json(form): Json<SignupForm>) -> Result<Json<FormAccepted>, ApiError> {
    validate_signup(&form)?;
    Ok(Json(FormAccepted { valid: true }))
}
