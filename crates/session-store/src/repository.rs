//! Session repository implementation

use crate::StorageError;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::{debug, info};

/// Session identifier allocated by the store
pub type SessionId = i64;

/// One completed (or open) monitoring session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub started_at_ms: u64,
    /// Zero while the session is open
    pub duration_sec: u32,
    pub warnings: u32,
    pub criticals: u32,
    pub blinks: u32,
    pub yawns: u32,
    pub distractions: u32,
    pub finished: bool,
}

impl SessionRecord {
    fn open(id: SessionId, started_at_ms: u64) -> Self {
        Self {
            id,
            started_at_ms,
            duration_sec: 0,
            warnings: 0,
            criticals: 0,
            blinks: 0,
            yawns: 0,
            distractions: 0,
            finished: false,
        }
    }
}

/// Store for session records, called at session boundaries only
pub trait SessionStore: Send + Sync {
    /// Allocate a session id and open a record
    fn begin_session(&self, started_at_ms: u64) -> Result<SessionId, StorageError>;

    /// Flush the final totals into the open record
    fn end_session(&self, record: SessionRecord) -> Result<(), StorageError>;
}

/// In-memory session store (mutex-guarded, monotonically increasing ids)
pub struct MemoryStore {
    sessions: Mutex<Vec<SessionRecord>>,
    next_id: Mutex<SessionId>,
    /// Oldest records are evicted past this count
    max_records: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        info!("creating in-memory session store");
        Self {
            sessions: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
            max_records: 10_000,
        }
    }

    /// Most recent sessions, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>, StorageError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Store(format!("lock error: {e}")))?;
        Ok(sessions.iter().rev().take(limit).cloned().collect())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemoryStore {
    fn begin_session(&self, started_at_ms: u64) -> Result<SessionId, StorageError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Store(format!("lock error: {e}")))?;
        let mut next_id = self
            .next_id
            .lock()
            .map_err(|e| StorageError::Store(format!("lock error: {e}")))?;

        let id = *next_id;
        *next_id += 1;

        while sessions.len() >= self.max_records {
            sessions.remove(0);
        }
        sessions.push(SessionRecord::open(id, started_at_ms));

        debug!(session_id = id, "session record opened");
        Ok(id)
    }

    fn end_session(&self, record: SessionRecord) -> Result<(), StorageError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Store(format!("lock error: {e}")))?;

        let slot = sessions
            .iter_mut()
            .find(|s| s.id == record.id)
            .ok_or(StorageError::NotFound(record.id))?;

        *slot = SessionRecord {
            finished: true,
            ..record
        };

        info!(
            session_id = slot.id,
            duration_sec = slot.duration_sec,
            "session record closed"
        );
        Ok(())
    }
}
