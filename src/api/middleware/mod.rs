//! API middleware.
//!
//! Execution order (outermost → innermost):
//! 1. CORS (tower-http): answers preflight requests
//! 2. Rate limiter: per-client minute and hour windows

pub mod rate;
