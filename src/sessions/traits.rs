//! Session storage traits and types for conversation state.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One completed query/response pair in a session's history.
///
/// Exchanges are appended as a unit — a query never enters the history
/// without its response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exchange {
    pub query: String,
    pub response: String,
}

impl Exchange {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }
}

/// Bounded storage for per-session conversation history.
///
/// History length is capped per session; appending past the cap evicts the
/// oldest exchange first. Appends and reads for the same session id are
/// serialized relative to each other; distinct sessions must not block one
/// another.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new empty session and return its identifier.
    async fn create(&self) -> Result<String>;

    /// Return the exchange history for a session, oldest first.
    /// An unknown session id yields an empty history, not an error.
    async fn history(&self, session_id: &str) -> Result<Vec<Exchange>>;

    /// Append a completed exchange to a session, evicting the oldest entry
    /// if the cap is exceeded. An unknown session id creates the session
    /// implicitly.
    async fn append(&self, session_id: &str, exchange: Exchange) -> Result<()>;

    /// The name of this session store implementation.
    fn name(&self) -> &str;
}
