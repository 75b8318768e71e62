//! Session Store
//!
//! Durable record of monitoring sessions. Written exactly twice per
//! session: once at start (`begin_session`) and once at end
//! (`end_session`).

mod repository;

pub use repository::{MemoryStore, SessionId, SessionRecord, SessionStore};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store error: {0}")]
    Store(String),
    #[error("session not found: {0}")]
    NotFound(SessionId),
}
