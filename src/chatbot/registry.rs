//! Live chat sessions for the HTTP layer.
//!
//! Maps wall-clock time onto each session's virtual clock: every access
//! advances the session to the time elapsed since it was opened, so timers
//! fire lazily on the next request instead of on a background task.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::session::{ChatSession, SessionSnapshot};
use super::types::Message;
use super::ChatError;
use crate::config::ChatTimings;

struct LiveSession {
    session: ChatSession,
    opened_at: Instant,
    last_seen: Instant,
}

pub struct SessionRegistry {
    sessions: HashMap<Uuid, LiveSession>,
    timings: ChatTimings,
    retention: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(timings: ChatTimings, retention: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            timings,
            retention,
            max_sessions,
        }
    }

    /// Open a fresh session and return its initial snapshot.
    pub fn open(
        &mut self,
        first_name: Option<String>,
        now: Instant,
    ) -> Result<SessionSnapshot, ChatError> {
        self.prune(now);
        if self.sessions.len() >= self.max_sessions {
            tracing::warn!(limit = self.max_sessions, "Chat session limit reached");
            return Err(ChatError::RegistryFull(self.max_sessions));
        }
        let session = ChatSession::open(self.timings.clone(), first_name);
        let snapshot = session.snapshot();
        self.sessions.insert(
            session.id(),
            LiveSession {
                session,
                opened_at: now,
                last_seen: now,
            },
        );
        Ok(snapshot)
    }

    /// Bring a session's clock up to `now`, then run `f` against it.
    pub fn with_session<R>(
        &mut self,
        id: Uuid,
        now: Instant,
        f: impl FnOnce(&mut ChatSession) -> R,
    ) -> Result<R, ChatError> {
        let live = self
            .sessions
            .get_mut(&id)
            .ok_or(ChatError::SessionNotFound(id))?;
        live.session
            .advance_to(now.saturating_duration_since(live.opened_at));
        live.last_seen = now;
        Ok(f(&mut live.session))
    }

    /// Close the chat surface. Pending timers go with the session.
    pub fn close(&mut self, id: Uuid) -> Result<Vec<Message>, ChatError> {
        let live = self
            .sessions
            .remove(&id)
            .ok_or(ChatError::SessionNotFound(id))?;
        Ok(live.session.close())
    }

    /// Drop sessions nobody has touched for the retention period.
    /// Returns how many were removed.
    pub fn prune(&mut self, now: Instant) -> usize {
        let before = self.sessions.len();
        let retention = self.retention;
        self.sessions
            .retain(|_, live| now.saturating_duration_since(live.last_seen) < retention);
        let removed = before - self.sessions.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.sessions.len(), "Pruned idle chat sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatbot::types::{Gate, SendOutcome};

    fn registry() -> SessionRegistry {
        SessionRegistry::new(ChatTimings::default(), Duration::from_secs(1800), 100)
    }

    #[test]
    fn open_registers_session() {
        let mut reg = registry();
        let snap = reg.open(Some("Mei".into()), Instant::now()).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(snap.active);
        assert_eq!(snap.messages.len(), 1);
    }

    #[test]
    fn access_advances_session_clock() {
        let mut reg = registry();
        let t0 = Instant::now();
        let id = reg.open(None, t0).unwrap().id;

        reg.with_session(id, t0, |s| s.send("I have severe bleeding"))
            .unwrap();
        let gate = reg
            .with_session(id, t0 + Duration::from_secs(3), |s| s.gate())
            .unwrap();
        assert_eq!(gate, Gate::DoctorChoice);
    }

    #[test]
    fn inactivity_applies_on_next_access() {
        let mut reg = registry();
        let t0 = Instant::now();
        let id = reg.open(None, t0).unwrap().id;

        let outcome = reg
            .with_session(id, t0 + Duration::from_secs(7 * 60), |s| s.send("hi"))
            .unwrap();
        assert_eq!(outcome, SendOutcome::SessionEnded);
    }

    #[test]
    fn unknown_session_is_not_found() {
        let mut reg = registry();
        let id = Uuid::new_v4();
        assert!(matches!(
            reg.with_session(id, Instant::now(), |_| ()),
            Err(ChatError::SessionNotFound(missing)) if missing == id
        ));
        assert!(reg.close(id).is_err());
    }

    #[test]
    fn close_removes_session() {
        let mut reg = registry();
        let t0 = Instant::now();
        let id = reg.open(None, t0).unwrap().id;
        let transcript = reg.close(id).unwrap();
        assert_eq!(transcript.len(), 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn prune_drops_idle_sessions() {
        let mut reg = SessionRegistry::new(ChatTimings::default(), Duration::from_secs(60), 100);
        let t0 = Instant::now();
        let stale = reg.open(None, t0).unwrap().id;
        let fresh = reg.open(None, t0).unwrap().id;

        reg.with_session(fresh, t0 + Duration::from_secs(50), |_| ())
            .unwrap();
        assert_eq!(reg.prune(t0 + Duration::from_secs(70)), 1);
        assert!(reg.with_session(stale, t0, |_| ()).is_err());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn open_refuses_past_session_limit() {
        let mut reg = SessionRegistry::new(ChatTimings::default(), Duration::from_secs(60), 2);
        let t0 = Instant::now();
        reg.open(None, t0).unwrap();
        reg.open(None, t0).unwrap();
        assert!(matches!(reg.open(None, t0), Err(ChatError::RegistryFull(2))));

        // Expired sessions free their slots
        assert!(reg.open(None, t0 + Duration::from_secs(61)).is_ok());
        assert_eq!(reg.len(), 1);
    }
}
