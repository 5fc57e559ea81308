//! # brig-store
//!
//! SQLite persistence for the BRIG gateway: the shared [`Db`] handle, the
//! relational schema, and the [`SessionStore`].
//!
//! ## Overview
//!
//! The daemon owns exactly one store, opened at startup in WAL mode with a
//! busy timeout, and hands clones of the handle to the session store, the
//! RBAC engine, and the audit log. Session validity is always decided
//! against the table, never against cached state, and any storage failure
//! is fail-closed: it becomes `BrigError::Storage`, which every caller
//! resolves as "not authorized".
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brig_store::{Db, SessionStore};
//!
//! let db = Db::open(Path::new("/var/lib/brig/brig.db"))?;
//! let sessions = SessionStore::new(db.clone());
//! let ok = sessions.validate_session(&token, &username)?;
//! ```

pub mod db;
pub mod schema;
pub mod session;

pub use db::Db;
pub use session::SessionStore;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rusqlite::params;

    use brig_contracts::error::BrigError;

    use super::{Db, SessionStore};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn store() -> (Db, SessionStore) {
        let db = Db::open_in_memory().unwrap();
        let sessions = SessionStore::new(db.clone());
        (db, sessions)
    }

    fn insert_user(db: &Db, username: &str, active: bool) -> i64 {
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, active) VALUES (?1, ?2, ?3)",
                params![username, format!("{username}@example.com"), active as i64],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .unwrap()
    }

    fn insert_session(db: &Db, id: &str, username: &str, expires_at: Option<i64>) {
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (session_id, username, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, username, Utc::now().timestamp(), expires_at],
            )
        })
        .unwrap();
    }

    // ── validate_session ──────────────────────────────────────────────────────

    /// The scenario from the session contract: a session expiring an hour
    /// from now validates; the same session already past expiry does not.
    #[test]
    fn live_session_validates_and_expired_does_not() {
        let (db, sessions) = store();
        let now = Utc::now().timestamp();

        insert_session(&db, "abc123session_token_000000000001", "alice", Some(now + 3600));
        assert!(sessions
            .validate_session("abc123session_token_000000000001", "alice")
            .unwrap());

        insert_session(&db, "abc123session_token_000000000002", "alice", Some(now - 1));
        assert!(!sessions
            .validate_session("abc123session_token_000000000002", "alice")
            .unwrap());
    }

    #[test]
    fn null_expiry_never_expires() {
        let (db, sessions) = store();
        insert_session(&db, "persistent_token_00000000000001", "alice", None);
        assert!(sessions
            .validate_session("persistent_token_00000000000001", "alice")
            .unwrap());
    }

    #[test]
    fn username_must_match_exactly() {
        let (db, sessions) = store();
        let now = Utc::now().timestamp();
        insert_session(&db, "abc123session_token_000000000003", "alice", Some(now + 3600));

        assert!(!sessions
            .validate_session("abc123session_token_000000000003", "bob")
            .unwrap());
        assert!(!sessions
            .validate_session("abc123session_token_000000000003", "Alice")
            .unwrap());
    }

    #[test]
    fn unknown_session_is_invalid() {
        let (_db, sessions) = store();
        assert!(!sessions.validate_session("nosuchtoken", "alice").unwrap());
    }

    // ── get_user_from_session ─────────────────────────────────────────────────

    #[test]
    fn resolves_username_for_live_session() {
        let (db, sessions) = store();
        insert_session(&db, "lookup_token_0000000000000000001", "carol", None);
        assert_eq!(
            sessions
                .get_user_from_session("lookup_token_0000000000000000001")
                .unwrap(),
            "carol"
        );
    }

    #[test]
    fn missing_session_is_session_invalid() {
        let (_db, sessions) = store();
        let result = sessions.get_user_from_session("absent");
        assert!(matches!(result, Err(BrigError::SessionInvalid { .. })));
    }

    // ── validate_session_and_get_user ─────────────────────────────────────────

    #[test]
    fn resolves_active_user_record() {
        let (db, sessions) = store();
        let user_id = insert_user(&db, "dave", true);
        insert_session(&db, "joined_token_0000000000000000001", "dave", None);

        let user = sessions
            .validate_session_and_get_user("joined_token_0000000000000000001")
            .unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.username, "dave");
        assert_eq!(user.email, "dave@example.com");
    }

    /// A live session for a deactivated account must not resolve.
    #[test]
    fn inactive_user_cannot_resolve() {
        let (db, sessions) = store();
        insert_user(&db, "mallory", false);
        insert_session(&db, "joined_token_0000000000000000002", "mallory", None);

        let result = sessions.validate_session_and_get_user("joined_token_0000000000000000002");
        assert!(matches!(result, Err(BrigError::SessionInvalid { .. })));
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    #[test]
    fn create_then_validate_then_delete() {
        let (_db, sessions) = store();
        let session = sessions.create_session("erin", Some(3600)).unwrap();

        // Minted tokens satisfy the gateway's token-shape gate.
        assert_eq!(session.session_id.len(), 32);
        assert!(session.session_id.chars().all(|c| c.is_ascii_alphanumeric()));

        assert!(sessions
            .validate_session(&session.session_id, "erin")
            .unwrap());

        sessions.delete_session(&session.session_id).unwrap();
        assert!(!sessions
            .validate_session(&session.session_id, "erin")
            .unwrap());
    }

    #[test]
    fn purge_removes_only_expired_rows() {
        let (db, sessions) = store();
        let now = Utc::now().timestamp();
        insert_session(&db, "expired_token_000000000000000001", "alice", Some(now - 10));
        insert_session(&db, "live_token_00000000000000000001x", "alice", Some(now + 3600));
        insert_session(&db, "forever_token_000000000000000001", "alice", None);

        assert_eq!(sessions.purge_expired().unwrap(), 1);
        assert!(sessions
            .validate_session("live_token_00000000000000000001x", "alice")
            .unwrap());
        assert!(sessions
            .validate_session("forever_token_000000000000000001", "alice")
            .unwrap());
    }
}
