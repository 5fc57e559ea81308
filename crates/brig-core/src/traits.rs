//! Core trait definitions for the BRIG authorization pipeline.
//!
//! These four traits define the complete trust boundary:
//!
//! - `SessionValidator` — identity gate (persistent store, fail-closed)
//! - `Authorizer`       — entitlement gate (RBAC engine)
//! - `CommandRunner`    — the only road to a subprocess (typed broker)
//! - `AuditSink`        — the immutable record of what happened
//!
//! The gateway wires them together in the correct order. The runner is
//! structurally unreachable until both gates have passed.

use std::collections::HashMap;

use brig_contracts::audit::AuditEvent;
use brig_contracts::command::CommandOutput;
use brig_contracts::error::BrigResult;
use brig_contracts::session::SessionUser;

/// Validates caller identity against the persistent session store.
///
/// Implementations must be fail-closed: any storage error propagates as
/// an error, which the gateway resolves as "not authorized" — never as a
/// pass.
pub trait SessionValidator: Send + Sync {
    /// Is `(session_id, username)` a live, exactly matching session?
    fn validate(&self, session_id: &str, username: &str) -> BrigResult<bool>;

    /// Resolve a session token to its active user record.
    fn resolve_user(&self, session_id: &str) -> BrigResult<SessionUser>;
}

/// Resolves whether a user id is entitled to `(resource, action)`.
pub trait Authorizer: Send + Sync {
    fn allows(&self, user_id: i64, resource: &str, action: &str) -> BrigResult<bool>;
}

/// Executes a symbolic command with typed parameters.
///
/// This is the single spawn chokepoint; the gateway only calls it after
/// identity and entitlement checks pass.
pub trait CommandRunner: Send + Sync {
    fn run(&self, key: &str, params: &HashMap<String, String>) -> BrigResult<CommandOutput>;
}

/// Appends one immutable event per privileged action.
pub trait AuditSink: Send + Sync {
    fn append(&self, event: &AuditEvent) -> BrigResult<()>;
}

// ── Service implementations ───────────────────────────────────────────────────

impl SessionValidator for brig_store::SessionStore {
    fn validate(&self, session_id: &str, username: &str) -> BrigResult<bool> {
        self.validate_session(session_id, username)
    }

    fn resolve_user(&self, session_id: &str) -> BrigResult<SessionUser> {
        self.validate_session_and_get_user(session_id)
    }
}

impl Authorizer for brig_rbac::RbacEngine {
    fn allows(&self, user_id: i64, resource: &str, action: &str) -> BrigResult<bool> {
        self.user_has_permission(user_id, resource, action)
    }
}

impl CommandRunner for brig_broker::CommandBroker {
    fn run(&self, key: &str, params: &HashMap<String, String>) -> BrigResult<CommandOutput> {
        self.execute(key, params)
    }
}

impl AuditSink for brig_audit::AuditLog {
    fn append(&self, event: &AuditEvent) -> BrigResult<()> {
        self.append(event).map(|_| ())
    }
}
