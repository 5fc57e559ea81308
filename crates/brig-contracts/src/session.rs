//! Session and user identity types.
//!
//! The session table is the single source of truth for who is logged in.
//! Nothing in the gateway ever trusts a cached copy of a session row —
//! every check goes back to the store.

use serde::{Deserialize, Serialize};

/// A persisted login session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque alphanumeric token, minted at login.
    pub session_id: String,
    pub username: String,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds; `None` means the session never expires.
    pub expires_at: Option<i64>,
}

impl Session {
    /// Return true if the session is live at `now` (Unix seconds).
    pub fn is_valid_at(&self, now: i64) -> bool {
        match self.expires_at {
            None => true,
            Some(expiry) => expiry > now,
        }
    }
}

/// The user record returned by a successful session-to-user resolution.
///
/// Only produced for rows where the joined `users.active` flag is set;
/// a deactivated account cannot resolve even with a live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}
