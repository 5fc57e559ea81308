//! # brig-contracts
//!
//! Shared types and the unified error taxonomy for the BRIG privileged
//! gateway.
//!
//! All crates in the workspace import from here. No business logic lives
//! in this crate — only data definitions and error types.

pub mod audit;
pub mod command;
pub mod error;
pub mod rbac;
pub mod session;

#[cfg(test)]
mod tests {
    use super::*;
    use audit::AuditEvent;
    use error::BrigError;
    use rbac::Permission;
    use session::Session;

    // ── Permission matching ──────────────────────────────────────────────────

    #[test]
    fn permission_exact_match() {
        let perm = Permission::of("zfs", "create");
        assert!(perm.grants("zfs", "create"));
        assert!(!perm.grants("zfs", "destroy"));
        assert!(!perm.grants("docker", "create"));
    }

    #[test]
    fn permission_action_wildcard() {
        let perm = Permission::of("zfs", "*");
        assert!(perm.grants("zfs", "create"));
        assert!(perm.grants("zfs", "destroy"));
        assert!(!perm.grants("docker", "create"));
    }

    #[test]
    fn permission_full_wildcard() {
        let perm = Permission::of("*", "*");
        assert!(perm.grants("zfs", "create"));
        assert!(perm.grants("docker", "restart"));
        assert!(perm.grants("anything", "at_all"));
    }

    #[test]
    fn resource_wildcard_with_concrete_action_does_not_grant() {
        // ("*", "read") is not a catalog shape; it must not match.
        let perm = Permission::of("*", "read");
        assert!(!perm.grants("zfs", "read"));
    }

    // ── Session expiry ───────────────────────────────────────────────────────

    #[test]
    fn session_without_expiry_is_always_valid() {
        let session = Session {
            session_id: "abc".to_string(),
            username: "alice".to_string(),
            created_at: 1_700_000_000,
            expires_at: None,
        };
        assert!(session.is_valid_at(i64::MAX));
    }

    #[test]
    fn session_expiry_is_exclusive() {
        let session = Session {
            session_id: "abc".to_string(),
            username: "alice".to_string(),
            created_at: 1_700_000_000,
            expires_at: Some(1_700_003_600),
        };
        assert!(session.is_valid_at(1_700_000_001));
        // Exactly at expiry is no longer valid: validity requires expiry > now.
        assert!(!session.is_valid_at(1_700_003_600));
        assert!(!session.is_valid_at(1_700_003_601));
    }

    // ── AuditEvent serde ─────────────────────────────────────────────────────

    #[test]
    fn audit_event_round_trips() {
        let event = AuditEvent::new(
            1_700_000_000,
            "alice",
            "zpool_scrub",
            "tank",
            "scrub started",
            "10.0.0.5",
            true,
        );
        let json = serde_json::to_string(&event).unwrap();
        let decoded: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, decoded);
    }

    // ── Error display messages ───────────────────────────────────────────────

    #[test]
    fn error_not_whitelisted_display() {
        let err = BrigError::NotWhitelisted {
            command: "zpool_frobnicate".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("not whitelisted"));
        assert!(msg.contains("zpool_frobnicate"));
    }

    #[test]
    fn error_permission_denied_display() {
        let err = BrigError::PermissionDenied {
            resource: "zfs".to_string(),
            action: "destroy".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("zfs:destroy"));
    }

    #[test]
    fn error_session_invalid_display() {
        let err = BrigError::SessionInvalid {
            reason: "expired".to_string(),
        };
        assert!(err.to_string().contains("invalid session"));
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn error_system_role_protected_display() {
        let err = BrigError::SystemRoleProtected {
            role: "administrator".to_string(),
        };
        assert!(err.to_string().contains("administrator"));
        assert!(err.to_string().contains("protected system role"));
    }

    #[test]
    fn error_storage_display() {
        let err = BrigError::Storage {
            reason: "database is locked".to_string(),
        };
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("database is locked"));
    }
}
