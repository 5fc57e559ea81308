//! The session store: persisted login state, validated on every request.
//!
//! All checks go straight to SQLite — session rows are never cached.
//! Every storage failure surfaces as `BrigError::Storage`, which callers
//! must treat as "not authorized". There is no fallback path that assumes
//! a session is valid.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::debug;
use uuid::Uuid;

use brig_contracts::error::{BrigError, BrigResult};
use brig_contracts::session::{Session, SessionUser};

use crate::db::Db;

/// Session persistence service. Cheap to clone; owns a handle to the
/// shared store.
#[derive(Clone)]
pub struct SessionStore {
    db: Db,
}

impl SessionStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Check that `(session_id, username)` names a live session.
    ///
    /// True only when a row matches both values exactly AND the row is
    /// unexpired (`expires_at IS NULL OR expires_at > now`). Errors are
    /// returned, not swallowed — the gateway maps them to a denial.
    pub fn validate_session(&self, session_id: &str, username: &str) -> BrigResult<bool> {
        let now = Utc::now().timestamp();
        let count: i64 = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*)
                 FROM sessions
                 WHERE session_id = ?1
                 AND username = ?2
                 AND (expires_at IS NULL OR expires_at > ?3)",
                params![session_id, username, now],
                |row| row.get(0),
            )
        })?;
        Ok(count > 0)
    }

    /// Resolve the username owning a live session.
    pub fn get_user_from_session(&self, session_id: &str) -> BrigResult<String> {
        let now = Utc::now().timestamp();
        let username: Option<String> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT username
                 FROM sessions
                 WHERE session_id = ?1
                 AND (expires_at IS NULL OR expires_at > ?2)
                 LIMIT 1",
                params![session_id, now],
                |row| row.get(0),
            )
            .optional()
        })?;
        username.ok_or_else(|| BrigError::SessionInvalid {
            reason: "session not found".to_string(),
        })
    }

    /// Resolve a session token to its user record.
    ///
    /// Stricter than [`Self::get_user_from_session`]: the joined user row
    /// must also have `active = 1`, so deactivating an account cuts off its
    /// live sessions immediately.
    pub fn validate_session_and_get_user(&self, token: &str) -> BrigResult<SessionUser> {
        let now = Utc::now().timestamp();
        let user: Option<SessionUser> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT u.id, u.username, COALESCE(u.email, '')
                 FROM sessions s
                 JOIN users u ON s.username = u.username
                 WHERE s.session_id = ?1
                 AND (s.expires_at IS NULL OR s.expires_at > ?2)
                 AND u.active = 1
                 LIMIT 1",
                params![token, now],
                |row| {
                    Ok(SessionUser {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                    })
                },
            )
            .optional()
        })?;
        user.ok_or_else(|| BrigError::SessionInvalid {
            reason: "invalid or expired session".to_string(),
        })
    }

    /// Mint and persist a session at login.
    ///
    /// The token is 32 alphanumeric characters; `ttl_seconds = None`
    /// creates a session that never expires.
    pub fn create_session(&self, username: &str, ttl_seconds: Option<i64>) -> BrigResult<Session> {
        let now = Utc::now().timestamp();
        let session = Session {
            session_id: Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            created_at: now,
            expires_at: ttl_seconds.map(|ttl| now + ttl),
        };
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (session_id, username, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.session_id,
                    session.username,
                    session.created_at,
                    session.expires_at
                ],
            )
        })?;
        debug!(username, "session created");
        Ok(session)
    }

    /// Remove a session at logout. Removing an absent session is not an
    /// error.
    pub fn delete_session(&self, session_id: &str) -> BrigResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM sessions WHERE session_id = ?1",
                params![session_id],
            )
        })?;
        Ok(())
    }

    /// Delete every expired session row; returns how many were removed.
    pub fn purge_expired(&self) -> BrigResult<usize> {
        let now = Utc::now().timestamp();
        let removed = self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM sessions WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                params![now],
            )
        })?;
        if removed > 0 {
            debug!(removed, "expired sessions purged");
        }
        Ok(removed)
    }
}
