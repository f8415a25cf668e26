//! Lead-capture and sign-up form validation.
//!
//! Every failing field is reported in one pass so the client can mark all
//! of them at once.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex pattern")
});

pub const MIN_PASSWORD_CHARS: usize = 8;

const SIGNUP_ROLES: &[&str] = &["champion", "patient", "clinician"];

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All validation failures for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadForm {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub message: Option<String>,
    pub consent: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Option<String>,
    pub accept_terms: bool,
}

pub fn validate_lead(form: &LeadForm) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    require(&mut errors, "fullName", &form.full_name, "Full name is required");
    check_email(&mut errors, &form.email);

    if let Some(phone) = form.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        if !is_valid_phone(phone) {
            errors.push("phone", "Please enter a valid phone number");
        }
    }
    if form.message.as_deref().is_some_and(|m| m.chars().count() > 2000) {
        errors.push("message", "Message is too long (max 2000 characters)");
    }
    if !form.consent {
        errors.push("consent", "Please agree to be contacted");
    }

    errors.into_result()
}

pub fn validate_signup(form: &SignupForm) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    require(&mut errors, "firstName", &form.first_name, "First name is required");
    require(&mut errors, "lastName", &form.last_name, "Last name is required");
    check_email(&mut errors, &form.email);

    if form.password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(
            "password",
            format!("Password must be at least {MIN_PASSWORD_CHARS} characters"),
        );
    } else if !(form.password.chars().any(char::is_alphabetic)
        && form.password.chars().any(|c| c.is_ascii_digit()))
    {
        errors.push("password", "Password must contain letters and numbers");
    }
    if form.confirm_password != form.password {
        errors.push("confirmPassword", "Passwords do not match");
    }

    if let Some(role) = form.role.as_deref() {
        if !SIGNUP_ROLES.contains(&role.trim().to_lowercase().as_str()) {
            errors.push("role", "Please choose a valid role");
        }
    }
    if !form.accept_terms {
        errors.push("acceptTerms", "Please accept the terms to continue");
    }

    errors.into_result()
}

fn require(errors: &mut FieldErrors, field: &'static str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(field, message);
    }
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.push("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.push("email", "Please enter a valid email address");
    }
}

/// Digits plus common separators, 8 to 15 digits in total.
fn is_valid_phone(phone: &str) -> bool {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    allowed && (8..=15).contains(&digits)
}
