//! Rule-based CRC education chatbot.
//!
//! Pipeline per user message:
//! 1. Gate check (pending correction > doctor choice > follow-up offer)
//! 2. Spelling correction (non-triage input only)
//! 3. Regex classification into a `Category`
//! 4. Canned response with suggested links
//! 5. Delayed doctor-choice prompt (triage) or follow-up offer
//!
//! All delays run on a per-session virtual clock (`scheduler`).

pub mod classify;
pub mod correction;
pub mod registry;
pub mod responses;
pub mod scheduler;
pub mod session;
pub mod types;

pub use registry::SessionRegistry;
pub use session::{ChatSession, SessionSnapshot};
pub use types::{Category, Gate, Message, SendOutcome};

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Chat session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Too many live chat sessions (limit {0})")]
    RegistryFull(usize),

    #[error("Session registry lock poisoned")]
    LockPoisoned,
}
