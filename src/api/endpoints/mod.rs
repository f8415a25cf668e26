//! API endpoint handlers, one module per feature.

pub mod chat;
pub mod completion;
pub mod forms;
pub mod health;
pub mod referrals;
