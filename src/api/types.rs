//! Shared state for the HTTP layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::api::error::ApiError;
use crate::chatbot::{ChatError, SessionRegistry};
use crate::completion::CompletionService;
use crate::config::AppConfig;
use crate::referral::EmailSender;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<Mutex<SessionRegistry>>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    pub completion: Arc<CompletionService>,
    pub email: Option<Arc<dyn EmailSender>>,
}

impl ApiContext {
    pub fn new(
        config: AppConfig,
        completion: CompletionService,
        email: Option<Arc<dyn EmailSender>>,
    ) -> Self {
        let sessions = SessionRegistry::new(
            config.chat.clone(),
            Duration::from_secs(config.server.session_retention_secs),
            config.server.max_sessions,
        );
        let rate_limiter = RateLimiter::new(
            config.server.requests_per_minute,
            config.server.requests_per_hour,
        );
        Self {
            config: Arc::new(config),
            sessions: Arc::new(Mutex::new(sessions)),
            rate_limiter: Arc::new(Mutex::new(rate_limiter)),
            completion: Arc::new(completion),
            email,
        }
    }

    /// Lock the session registry. The guard must be dropped before any
    /// `.await`.
    pub fn lock_sessions(&self) -> Result<MutexGuard<'_, SessionRegistry>, ApiError> {
        self.sessions
            .lock()
            .map_err(|_| ApiError::from(ChatError::LockPoisoned))
    }
}

// ═══════════════════════════════════════════════════════════
// Rate limiter: per-client sliding window
// ═══════════════════════════════════════════════════════════

/// Per-client rate limiter with per-minute and per-hour limits.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
    per_hour: u32,
}

impl RateLimiter {
    pub fn new(per_minute: u32, per_hour: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute,
            per_hour,
        }
    }

    /// Check if a client is within rate limits. Returns `Ok(())` or
    /// `Err(retry_after_secs)` if exceeded.
    pub fn check(&mut self, client: &str) -> Result<(), u64> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&mut self, client: &str, now: Instant) -> Result<(), u64> {
        // Drop idle clients once the table grows
        if self.windows.len() > 10_000 {
            self.windows.retain(|_, entries| {
                entries
                    .last()
                    .is_some_and(|ts| now.duration_since(*ts) < Duration::from_secs(3600))
            });
        }

        let entries = self.windows.entry(client.to_string()).or_default();
        entries.retain(|ts| now.duration_since(*ts) < Duration::from_secs(3600));

        let last_minute = entries
            .iter()
            .filter(|ts| now.duration_since(**ts) < Duration::from_secs(60))
            .count() as u32;
        if last_minute >= self.per_minute {
            return Err(60);
        }

        if entries.len() as u32 >= self.per_hour {
            return Err(3600);
        }

        entries.push(now);
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(60, 600)
    }
}
