//! Champion referral emails.
//!
//! A referral request is validated and rendered into one fixed HTML
//! invitation, then handed to an `EmailSender`. All user-supplied text is
//! HTML-escaped before it reaches the template.

pub mod sender;

pub use sender::{EmailSender, HttpEmailSender};

use serde::{Deserialize, Serialize};

use crate::forms::is_valid_email;

const MAX_PERSONAL_MESSAGE_CHARS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ReferralError {
    #[error("Invalid recipient email: {0}")]
    InvalidRecipient(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Referral link must be an http(s) URL")]
    InvalidLink,

    #[error("Personal message too long (max {MAX_PERSONAL_MESSAGE_CHARS} chars)")]
    MessageTooLong,

    #[error("Email sending is not configured")]
    NotConfigured,

    #[error("Email provider unreachable at {0}")]
    Connection(String),

    #[error("Email provider returned error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed email provider response: {0}")]
    ResponseParsing(String),
}

impl ReferralError {
    /// Problems with the caller's request, as opposed to the provider.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ReferralError::InvalidRecipient(_)
                | ReferralError::MissingField(_)
                | ReferralError::InvalidLink
                | ReferralError::MessageTooLong
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub referrer_name: String,
    #[serde(default)]
    pub personal_message: Option<String>,
    #[serde(default)]
    pub referral_link: String,
}

/// Provider-neutral email payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Validate `req` and render the invitation email.
pub fn build_referral_email(req: &ReferralRequest, from: &str) -> Result<OutgoingEmail, ReferralError> {
    let to = req.to.trim();
    if to.is_empty() {
        return Err(ReferralError::MissingField("to"));
    }
    if !is_valid_email(to) {
        return Err(ReferralError::InvalidRecipient(to.to_string()));
    }

    let referrer = req.referrer_name.trim();
    if referrer.is_empty() {
        return Err(ReferralError::MissingField("referrerName"));
    }

    let link = req.referral_link.trim();
    if link.is_empty() {
        return Err(ReferralError::MissingField("referralLink"));
    }
    if !(link.starts_with("https://") || link.starts_with("http://")) {
        return Err(ReferralError::InvalidLink);
    }

    let personal = req
        .personal_message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    if personal.is_some_and(|m| m.chars().count() > MAX_PERSONAL_MESSAGE_CHARS) {
        return Err(ReferralError::MessageTooLong);
    }

    Ok(OutgoingEmail {
        from: from.to_string(),
        to: vec![to.to_string()],
        subject: format!("{referrer} invited you to join COLONAiVE™"),
        html: render_html(referrer, personal, link),
    })
}

fn render_html(referrer: &str, personal: Option<&str>, link: &str) -> String {
    let referrer = escape_html(referrer);
    let link = escape_html(link);
    let personal_block = personal
        .map(|m| {
            format!(
                r#"<blockquote style="border-left:4px solid #2563eb;margin:16px 0;padding:8px 16px;color:#374151;">{}</blockquote>"#,
                escape_html(m).replace('\n', "<br>")
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family:Arial,sans-serif;line-height:1.6;color:#111827;">
<h2 style="color:#1e3a8a;">You've been invited to join COLONAiVE™</h2>
<p><strong>{referrer}</strong> thinks you'd make a great COLONAiVE Champion.</p>
{personal_block}
<p>COLONAiVE is a movement to raise awareness of colorectal cancer and help more people get screened early, when it is most treatable.</p>
<p><a href="{link}" style="display:inline-block;background:#2563eb;color:#ffffff;padding:12px 24px;border-radius:6px;text-decoration:none;">Join as a Champion</a></p>
<p style="font-size:12px;color:#6b7280;">If the button does not work, copy this link into your browser: {link}</p>
</body>
</html>"#
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
