//! Conversation session storage.
//!
//! Sessions hold the bounded query/response history threaded back into the
//! decision engine on follow-up questions. The [`SessionStore`] trait is the
//! seam; [`InMemorySessionStore`] is the process-lifetime default backend.

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemorySessionStore;
pub use traits::{Exchange, SessionStore};
