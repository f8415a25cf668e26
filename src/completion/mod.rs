//! Language-model completion relay.
//!
//! `CompletionService` forwards a visitor's free-form question to a hosted
//! chat-completion API. It answers from a canned table instead when no API
//! key is configured, when mock mode is forced, or when the provider reports
//! that the account's quota is exhausted.

pub mod mock;
pub mod openai;

pub use mock::MockCompletion;
pub use openai::OpenAiClient;

use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;

/// Longest accepted question, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

pub const SYSTEM_PROMPT: &str = "You are the COLONAiVE assistant, a friendly guide on \
colorectal cancer awareness, screening and prevention for visitors in Singapore. \
Give short, plain-language answers. You do not diagnose or prescribe. For bleeding, \
severe pain or other worrying symptoms, tell the visitor to see a doctor promptly or \
call 995 in an emergency.";

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Message is required")]
    MissingMessage,

    #[error("Message too long (max {MAX_MESSAGE_CHARS} chars)")]
    MessageTooLong,

    #[error("Completion provider unreachable at {0}")]
    Connection(String),

    #[error("Completion provider returned error (status {status}): {body}")]
    Provider { status: u16, body: String },

    #[error("Completion quota exhausted")]
    QuotaExceeded,

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed completion response: {0}")]
    ResponseParsing(String),
}

/// Blocking chat-completion backend.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, system: &str, message: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReply {
    pub reply: String,
    /// True when the answer came from the canned table.
    pub mock: bool,
}

pub struct CompletionService {
    live: Option<Box<dyn CompletionClient>>,
    mock: MockCompletion,
}

impl CompletionService {
    /// Build the service described by `config`. No HTTP client is created
    /// in mock mode.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());

        let live: Option<Box<dyn CompletionClient>> = match key {
            Some(key) if !config.use_mock => Some(Box::new(OpenAiClient::new(
                &config.base_url,
                key,
                &config.model,
                config.timeout_secs,
            )?)),
            _ => None,
        };

        if live.is_none() {
            tracing::info!(
                forced = config.use_mock,
                "Completion running in mock mode"
            );
        }

        Ok(Self {
            live,
            mock: MockCompletion::new(),
        })
    }

    /// Service backed by an arbitrary client.
    pub fn with_client(client: Box<dyn CompletionClient>) -> Self {
        Self {
            live: Some(client),
            mock: MockCompletion::new(),
        }
    }

    /// Service that only ever answers from the canned table.
    pub fn mock_only() -> Self {
        Self {
            live: None,
            mock: MockCompletion::new(),
        }
    }

    pub fn is_mock_mode(&self) -> bool {
        self.live.is_none()
    }

    /// Answer one question. Quota exhaustion degrades to the mock; any
    /// other provider failure is returned once, without retry.
    pub fn complete(&self, message: &str) -> Result<CompletionReply, CompletionError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CompletionError::MissingMessage);
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(CompletionError::MessageTooLong);
        }

        let Some(live) = &self.live else {
            return Ok(self.mock_reply(message));
        };

        match live.complete(SYSTEM_PROMPT, message) {
            Ok(reply) => Ok(CompletionReply { reply, mock: false }),
            Err(CompletionError::QuotaExceeded) => {
                tracing::warn!("Completion quota exhausted, answering from mock table");
                Ok(self.mock_reply(message))
            }
            Err(e) => {
                tracing::error!(error = %e, "Completion request failed");
                Err(e)
            }
        }
    }

    fn mock_reply(&self, message: &str) -> CompletionReply {
        CompletionReply {
            reply: self.mock.reply_for(message).to_string(),
            mock: true,
        }
    }
}
