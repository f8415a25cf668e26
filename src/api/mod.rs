//! HTTP API for the COLONAiVE site.
//!
//! Exposes chat sessions, the completion relay, referral emails and form
//! validation as JSON endpoints under `/api/`. Every route is rate limited
//! and sits behind CORS.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{serve, shutdown_signal, ServerError};
pub use types::ApiContext;
