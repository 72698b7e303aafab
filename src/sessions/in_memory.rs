//! In-memory session store implementation.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::traits::{Exchange, SessionStore};

struct SessionState {
    exchanges: VecDeque<Exchange>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl SessionState {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            exchanges: VecDeque::new(),
            created_at: now,
            last_activity: now,
        }
    }
}

/// An in-memory session store with FIFO eviction past a per-session cap.
///
/// Each session carries its own mutex, so concurrent requests against the
/// same session serialize while distinct sessions proceed independently.
/// The outer map lock is held only long enough to clone the session handle.
pub struct InMemorySessionStore {
    max_history: usize,
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl InMemorySessionStore {
    /// Create a store capping each session at `max_history` exchanges.
    /// A cap of zero is clamped to one so an append is never a no-op.
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of sessions currently tracked.
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// When the first exchange for a session was recorded, if it exists.
    pub fn created_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        let handle = self.sessions.read().get(session_id).cloned()?;
        let created = handle.lock().created_at;
        Some(created)
    }

    /// When a session last recorded an exchange, if it exists.
    pub fn last_activity(&self, session_id: &str) -> Option<DateTime<Utc>> {
        let handle = self.sessions.read().get(session_id).cloned()?;
        let last = handle.lock().last_activity;
        Some(last)
    }

    fn handle(&self, session_id: &str) -> Arc<Mutex<SessionState>> {
        if let Some(existing) = self.sessions.read().get(session_id) {
            return existing.clone();
        }
        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SessionState::new())))
            .clone()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .insert(session_id.clone(), Arc::new(Mutex::new(SessionState::new())));
        debug!(session_id = %session_id, "created session");
        Ok(session_id)
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Exchange>> {
        let handle = match self.sessions.read().get(session_id) {
            Some(handle) => handle.clone(),
            None => return Ok(Vec::new()),
        };
        let state = handle.lock();
        Ok(state.exchanges.iter().cloned().collect())
    }

    async fn append(&self, session_id: &str, exchange: Exchange) -> Result<()> {
        let handle = self.handle(session_id);
        let mut state = handle.lock();
        state.exchanges.push_back(exchange);
        while state.exchanges.len() > self.max_history {
            state.exchanges.pop_front();
            debug!(session_id = %session_id, "evicted oldest exchange");
        }
        state.last_activity = Utc::now();
        Ok(())
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
