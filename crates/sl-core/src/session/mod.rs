//! Counting sessions: mutable per-machine state and its persistence.

mod state;
pub mod store;

pub use state::SessionState;
pub use store::{SessionError, SessionStore, StoredSession, ENV_DATA_DIR, SESSION_SCHEMA_VERSION};
