use super::{OutgoingEmail, ReferralError};
use crate::config::EmailConfig;

/// Blocking email delivery backend. Returns the provider's JSON reply.
pub trait EmailSender: Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> Result<serde_json::Value, ReferralError>;
}

/// Sends through an HTTP email API that accepts `{from, to, subject, html}`
/// with a bearer key (Resend-compatible).
pub struct HttpEmailSender {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpEmailSender {
    pub fn new(endpoint: &str, api_key: &str, timeout_secs: u64) -> Result<Self, ReferralError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ReferralError::HttpClient(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, ReferralError> {
        match config.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => Ok(Some(Self::new(&config.endpoint, key, config.timeout_secs)?)),
            None => {
                tracing::warn!("EMAIL_API_KEY not set, referral emails disabled");
                Ok(None)
            }
        }
    }
}

impl EmailSender for HttpEmailSender {
    fn send(&self, email: &OutgoingEmail) -> Result<serde_json::Value, ReferralError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ReferralError::Connection(self.endpoint.clone())
                } else if e.is_timeout() {
                    ReferralError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ReferralError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ReferralError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .map_err(|e| ReferralError::ResponseParsing(e.to_string()))
    }
}
