//! The BRIG gateway: the policy-bound request pipeline.
//!
//! The gateway enforces the appliance's trust order:
//!
//!   Token shape → Session Store → RBAC → [CommandRunner::run] → Audit
//!
//! The security invariant is absolute: `CommandRunner::run()` is NEVER
//! called unless the session store has resolved the caller's identity AND
//! the RBAC engine has allowed `(resource, action)`. This is enforced
//! structurally — the code path to `run()` is only reachable after both
//! gates pass. Every outcome, including denials and rejections, is
//! appended to the audit log.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use brig_audit::{key::load_or_create_key, AuditLog};
use brig_broker::CommandBroker;
use brig_contracts::audit::AuditEvent;
use brig_contracts::command::CommandOutput;
use brig_contracts::error::{BrigError, BrigResult};
use brig_rbac::RbacEngine;
use brig_store::{Db, SessionStore};
use brig_whitelist::is_valid_session_token;

use crate::config::GatewayConfig;
use crate::traits::{AuditSink, Authorizer, CommandRunner, SessionValidator};

/// One privileged request, as extracted by the web layer.
///
/// All parameter values arrive pre-extracted and stringly typed; the
/// broker's typed validators decide what they may become. Raw HTTP bodies
/// never reach this struct.
#[derive(Debug, Clone)]
pub struct PrivilegedRequest {
    pub session_id: String,
    /// The username the caller claims; must match the session row exactly.
    pub username: String,
    pub source_ip: String,
    /// RBAC resource to authorize against, e.g. "zfs".
    pub resource: String,
    /// RBAC action to authorize against, e.g. "create".
    pub action: String,
    /// Symbolic broker command key, e.g. "zpool_create".
    pub command_key: String,
    pub params: HashMap<String, String>,
}

/// The central service object owning the pipeline's collaborators.
///
/// Constructed explicitly at daemon startup (no global state) and shared
/// behind `Arc` across request workers.
pub struct Gateway {
    sessions: Box<dyn SessionValidator>,
    authorizer: Box<dyn Authorizer>,
    runner: Box<dyn CommandRunner>,
    audit: Box<dyn AuditSink>,
}

impl Gateway {
    /// Assemble a gateway from its trusted components.
    pub fn new(
        sessions: Box<dyn SessionValidator>,
        authorizer: Box<dyn Authorizer>,
        runner: Box<dyn CommandRunner>,
        audit: Box<dyn AuditSink>,
    ) -> Self {
        Self {
            sessions,
            authorizer,
            runner,
            audit,
        }
    }

    /// Open the store and wire the concrete services per `config`.
    pub fn from_config(config: &GatewayConfig) -> BrigResult<Self> {
        let db = Db::open(Path::new(&config.db_path))?;

        let key = match &config.audit_key_path {
            Some(path) => Some(load_or_create_key(Path::new(path))?),
            None => None,
        };

        let sessions = SessionStore::new(db.clone());
        let rbac = RbacEngine::with_cache_ttl(
            db.clone(),
            config.superuser_id,
            Duration::from_secs(config.cache_ttl_secs),
        );
        let broker = CommandBroker::new();
        let audit = AuditLog::new(db, key);

        Ok(Self::new(
            Box::new(sessions),
            Box::new(rbac),
            Box::new(broker),
            Box::new(audit),
        ))
    }

    /// Run one privileged request through the full pipeline.
    ///
    /// # Pipeline
    ///
    /// 1. Reject malformed session tokens before they touch the store.
    /// 2. Validate the `(session_id, username)` pair against the session
    ///    store, then resolve the active user record — both fail-closed
    ///    on storage errors.
    /// 3. Ask the RBAC engine whether the user holds
    ///    `(resource, action)`. `SessionInvalid` and `PermissionDenied`
    ///    stay distinct so clients can tell "log in again" from "you lack
    ///    access".
    /// 4. Hand the command key and typed parameters to the runner — the
    ///    only call site that can reach a subprocess.
    /// 5. Append the audit event. Denials and rejections are audited with
    ///    `success = false` at the stage they failed; the completed
    ///    command is audited with the subprocess's own success flag.
    ///
    /// A failed audit append after the command has already executed is
    /// logged at error level and the command's result is still returned —
    /// the action happened, and pretending otherwise would not undo it.
    pub fn handle(&self, request: &PrivilegedRequest) -> BrigResult<CommandOutput> {
        debug!(
            command = %request.command_key,
            resource = %request.resource,
            action = %request.action,
            user = %request.username,
            "privileged request received"
        );

        // ── Step 1: token shape ──────────────────────────────────────────────
        if !is_valid_session_token(&request.session_id) {
            let err = BrigError::SessionInvalid {
                reason: "malformed session token".to_string(),
            };
            self.audit_failure(request, "malformed session token");
            return Err(err);
        }

        // ── Step 2: identity ─────────────────────────────────────────────────
        //
        // The (session_id, username) pair goes to the store first; storage
        // errors propagate as-is, and either way the request is denied.
        match self
            .sessions
            .validate(&request.session_id, &request.username)
        {
            Ok(true) => {}
            Ok(false) => {
                self.audit_failure(request, "session not found, expired, or user mismatch");
                return Err(BrigError::SessionInvalid {
                    reason: "session not found, expired, or user mismatch".to_string(),
                });
            }
            Err(e) => {
                warn!(user = %request.username, error = %e, "session validation failed");
                self.audit_failure(request, "session validation failed");
                return Err(e);
            }
        }

        // Resolve the user id (and the account's active flag) for RBAC.
        let user = match self.sessions.resolve_user(&request.session_id) {
            Ok(user) => user,
            Err(e) => {
                warn!(user = %request.username, error = %e, "session resolution failed");
                self.audit_failure(request, "session resolution failed");
                return Err(e);
            }
        };

        // ── Step 3: authorization ────────────────────────────────────────────
        let allowed = match self
            .authorizer
            .allows(user.id, &request.resource, &request.action)
        {
            Ok(allowed) => allowed,
            Err(e) => {
                // Fail-closed: an RBAC storage failure is a denial.
                warn!(user_id = user.id, error = %e, "authorization check failed");
                self.audit_failure(request, "authorization check failed");
                return Err(e);
            }
        };
        if !allowed {
            warn!(
                user_id = user.id,
                resource = %request.resource,
                action = %request.action,
                "permission denied"
            );
            self.audit_failure(request, "permission denied");
            return Err(BrigError::PermissionDenied {
                resource: request.resource.clone(),
                action: request.action.clone(),
            });
        }

        // ── Step 4: execution ────────────────────────────────────────────────
        //
        // Only reachable with a resolved identity and an RBAC allow. This
        // is the ONLY call site for runner.run() in the gateway.
        let output = match self.runner.run(&request.command_key, &request.params) {
            Ok(output) => output,
            Err(e) => {
                if matches!(e, BrigError::NotWhitelisted { .. }) {
                    warn!(
                        command = %request.command_key,
                        user = %request.username,
                        ip = %request.source_ip,
                        "security event: unknown command key"
                    );
                }
                self.audit_failure(request, &e.to_string());
                return Err(e);
            }
        };

        // ── Step 5: audit ────────────────────────────────────────────────────
        let event = self.event(
            request,
            format!("exit code {}", output.exit_code),
            output.success(),
        );
        if let Err(e) = self.audit.append(&event) {
            // The action already ran; record the gap loudly and move on.
            error!(command = %request.command_key, error = %e, "audit append failed after execution");
        }

        info!(
            command = %request.command_key,
            user = %request.username,
            exit_code = output.exit_code,
            "privileged request completed"
        );
        Ok(output)
    }

    fn event(&self, request: &PrivilegedRequest, details: String, success: bool) -> AuditEvent {
        AuditEvent {
            timestamp: Utc::now().timestamp(),
            user: request.username.clone(),
            action: request.command_key.clone(),
            resource: request.resource.clone(),
            details,
            ip_address: request.source_ip.clone(),
            success,
        }
    }

    /// Audit a request that failed before or during execution.
    fn audit_failure(&self, request: &PrivilegedRequest, details: &str) {
        let event = self.event(request, details.to_string(), false);
        if let Err(e) = self.audit.append(&event) {
            error!(command = %request.command_key, error = %e, "audit append failed");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use brig_contracts::audit::AuditEvent;
    use brig_contracts::command::CommandOutput;
    use brig_contracts::error::{BrigError, BrigResult};
    use brig_contracts::session::SessionUser;

    use crate::traits::{AuditSink, Authorizer, CommandRunner, SessionValidator};

    use super::{Gateway, PrivilegedRequest};

    // ── Mock helpers ──────────────────────────────────────────────────────────

    /// A session validator with a single known token.
    struct MockSessions {
        token: String,
        user: SessionUser,
        storage_error: bool,
    }

    impl SessionValidator for MockSessions {
        fn validate(&self, session_id: &str, username: &str) -> BrigResult<bool> {
            if self.storage_error {
                return Err(BrigError::Storage {
                    reason: "database is locked".to_string(),
                });
            }
            Ok(session_id == self.token && username == self.user.username)
        }

        fn resolve_user(&self, session_id: &str) -> BrigResult<SessionUser> {
            if self.storage_error {
                return Err(BrigError::Storage {
                    reason: "database is locked".to_string(),
                });
            }
            if session_id == self.token {
                Ok(self.user.clone())
            } else {
                Err(BrigError::SessionInvalid {
                    reason: "session not found".to_string(),
                })
            }
        }
    }

    struct MockAuthorizer {
        allow: bool,
        storage_error: bool,
    }

    impl Authorizer for MockAuthorizer {
        fn allows(&self, _user_id: i64, _resource: &str, _action: &str) -> BrigResult<bool> {
            if self.storage_error {
                return Err(BrigError::Storage {
                    reason: "database is locked".to_string(),
                });
            }
            Ok(self.allow)
        }
    }

    /// A runner that counts invocations instead of spawning anything.
    struct MockRunner {
        run_count: Arc<Mutex<u32>>,
        result: Option<BrigError>,
    }

    impl MockRunner {
        fn counting() -> (Self, Arc<Mutex<u32>>) {
            let count = Arc::new(Mutex::new(0));
            (
                Self {
                    run_count: count.clone(),
                    result: None,
                },
                count,
            )
        }

        fn failing(err: BrigError) -> (Self, Arc<Mutex<u32>>) {
            let count = Arc::new(Mutex::new(0));
            (
                Self {
                    run_count: count.clone(),
                    result: Some(err),
                },
                count,
            )
        }
    }

    impl CommandRunner for MockRunner {
        fn run(
            &self,
            _key: &str,
            _params: &HashMap<String, String>,
        ) -> BrigResult<CommandOutput> {
            *self.run_count.lock().unwrap() += 1;
            match &self.result {
                Some(BrigError::NotWhitelisted { command }) => Err(BrigError::NotWhitelisted {
                    command: command.clone(),
                }),
                Some(BrigError::Validation { reason }) => Err(BrigError::Validation {
                    reason: reason.clone(),
                }),
                Some(_) => Err(BrigError::CommandFailed {
                    reason: "mock failure".to_string(),
                }),
                None => Ok(CommandOutput {
                    stdout: "ok".to_string(),
                    stderr: String::new(),
                    exit_code: 0,
                }),
            }
        }
    }

    struct MockAudit {
        events: Arc<Mutex<Vec<AuditEvent>>>,
        fail: bool,
    }

    impl MockAudit {
        fn recording() -> (Self, Arc<Mutex<Vec<AuditEvent>>>) {
            let events = Arc::new(Mutex::new(vec![]));
            (
                Self {
                    events: events.clone(),
                    fail: false,
                },
                events,
            )
        }

        fn failing() -> Self {
            Self {
                events: Arc::new(Mutex::new(vec![])),
                fail: true,
            }
        }
    }

    impl AuditSink for MockAudit {
        fn append(&self, event: &AuditEvent) -> BrigResult<()> {
            if self.fail {
                return Err(BrigError::AuditWriteFailed {
                    reason: "disk full".to_string(),
                });
            }
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    const TOKEN: &str = "abc123def456abc123def456abc12345";

    fn alice() -> SessionUser {
        SessionUser {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    fn request() -> PrivilegedRequest {
        PrivilegedRequest {
            session_id: TOKEN.to_string(),
            username: "alice".to_string(),
            source_ip: "10.0.0.5".to_string(),
            resource: "zfs".to_string(),
            action: "scrub".to_string(),
            command_key: "zpool_scrub".to_string(),
            params: HashMap::from([("name".to_string(), "tank".to_string())]),
        }
    }

    fn sessions_ok() -> MockSessions {
        MockSessions {
            token: TOKEN.to_string(),
            user: alice(),
            storage_error: false,
        }
    }

    // ── Test cases ────────────────────────────────────────────────────────────

    /// The full pipeline on the happy path: one run, one success audit.
    #[test]
    fn successful_request_runs_and_audits() {
        let (runner, run_count) = MockRunner::counting();
        let (audit, events) = MockAudit::recording();
        let gateway = Gateway::new(
            Box::new(sessions_ok()),
            Box::new(MockAuthorizer { allow: true, storage_error: false }),
            Box::new(runner),
            Box::new(audit),
        );

        let output = gateway.handle(&request()).unwrap();
        assert_eq!(output.exit_code, 0);
        assert_eq!(*run_count.lock().unwrap(), 1);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].success);
        assert_eq!(events[0].action, "zpool_scrub");
        assert_eq!(events[0].user, "alice");
        assert_eq!(events[0].ip_address, "10.0.0.5");
    }

    /// Core security test: a malformed token never reaches the store or
    /// the runner, and the rejection is audited.
    #[test]
    fn malformed_token_blocks_before_store() {
        let (runner, run_count) = MockRunner::counting();
        let (audit, events) = MockAudit::recording();
        let gateway = Gateway::new(
            Box::new(sessions_ok()),
            Box::new(MockAuthorizer { allow: true, storage_error: false }),
            Box::new(runner),
            Box::new(audit),
        );

        let mut req = request();
        req.session_id = "short!".to_string();
        let result = gateway.handle(&req);

        assert!(matches!(result, Err(BrigError::SessionInvalid { .. })));
        assert_eq!(*run_count.lock().unwrap(), 0, "runner must not be called");
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(!events[0].success);
    }

    #[test]
    fn unknown_session_blocks_runner() {
        let (runner, run_count) = MockRunner::counting();
        let (audit, _events) = MockAudit::recording();
        let gateway = Gateway::new(
            Box::new(sessions_ok()),
            Box::new(MockAuthorizer { allow: true, storage_error: false }),
            Box::new(runner),
            Box::new(audit),
        );

        let mut req = request();
        req.session_id = "unknownunknownunknownunknown1234".to_string();
        let result = gateway.handle(&req);

        assert!(matches!(result, Err(BrigError::SessionInvalid { .. })));
        assert_eq!(*run_count.lock().unwrap(), 0);
    }

    /// Fail-closed: a storage error during session resolution denies.
    #[test]
    fn session_storage_error_fails_closed() {
        let (runner, run_count) = MockRunner::counting();
        let (audit, _events) = MockAudit::recording();
        let gateway = Gateway::new(
            Box::new(MockSessions {
                token: TOKEN.to_string(),
                user: alice(),
                storage_error: true,
            }),
            Box::new(MockAuthorizer { allow: true, storage_error: false }),
            Box::new(runner),
            Box::new(audit),
        );

        let result = gateway.handle(&request());
        assert!(matches!(result, Err(BrigError::Storage { .. })));
        assert_eq!(*run_count.lock().unwrap(), 0);
    }

    /// A valid session claimed by the wrong username is an identity
    /// failure, not a permission failure.
    #[test]
    fn username_mismatch_is_session_invalid() {
        let (runner, run_count) = MockRunner::counting();
        let (audit, _events) = MockAudit::recording();
        let gateway = Gateway::new(
            Box::new(sessions_ok()),
            Box::new(MockAuthorizer { allow: true, storage_error: false }),
            Box::new(runner),
            Box::new(audit),
        );

        let mut req = request();
        req.username = "bob".to_string();
        let result = gateway.handle(&req);

        assert!(matches!(result, Err(BrigError::SessionInvalid { .. })));
        assert_eq!(*run_count.lock().unwrap(), 0);
    }

    /// An authenticated but unauthorized user is denied distinctly, the
    /// denial is audited, and the runner is never called.
    #[test]
    fn permission_denied_blocks_runner_and_audits() {
        let (runner, run_count) = MockRunner::counting();
        let (audit, events) = MockAudit::recording();
        let gateway = Gateway::new(
            Box::new(sessions_ok()),
            Box::new(MockAuthorizer { allow: false, storage_error: false }),
            Box::new(runner),
            Box::new(audit),
        );

        let result = gateway.handle(&request());
        match result {
            Err(BrigError::PermissionDenied { resource, action }) => {
                assert_eq!(resource, "zfs");
                assert_eq!(action, "scrub");
            }
            other => panic!("expected PermissionDenied, got {:?}", other),
        }
        assert_eq!(*run_count.lock().unwrap(), 0);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(!events[0].success);
        assert!(events[0].details.contains("permission denied"));
    }

    /// Fail-closed: an RBAC storage error denies rather than assumes.
    #[test]
    fn rbac_storage_error_fails_closed() {
        let (runner, run_count) = MockRunner::counting();
        let (audit, _events) = MockAudit::recording();
        let gateway = Gateway::new(
            Box::new(sessions_ok()),
            Box::new(MockAuthorizer { allow: true, storage_error: true }),
            Box::new(runner),
            Box::new(audit),
        );

        let result = gateway.handle(&request());
        assert!(matches!(result, Err(BrigError::Storage { .. })));
        assert_eq!(*run_count.lock().unwrap(), 0);
    }

    /// A whitelist rejection from the runner is audited as a failure.
    #[test]
    fn runner_rejection_is_audited() {
        let (runner, run_count) = MockRunner::failing(BrigError::NotWhitelisted {
            command: "zpool_shred".to_string(),
        });
        let (audit, events) = MockAudit::recording();
        let gateway = Gateway::new(
            Box::new(sessions_ok()),
            Box::new(MockAuthorizer { allow: true, storage_error: false }),
            Box::new(runner),
            Box::new(audit),
        );

        let result = gateway.handle(&request());
        assert!(matches!(result, Err(BrigError::NotWhitelisted { .. })));
        assert_eq!(*run_count.lock().unwrap(), 1);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(!events[0].success);
        assert!(events[0].details.contains("not whitelisted"));
    }

    /// Best-effort audit: when the append fails after the command already
    /// executed, the result is still returned to the caller.
    #[test]
    fn audit_failure_after_execution_still_returns_output() {
        let (runner, run_count) = MockRunner::counting();
        let gateway = Gateway::new(
            Box::new(sessions_ok()),
            Box::new(MockAuthorizer { allow: true, storage_error: false }),
            Box::new(runner),
            Box::new(MockAudit::failing()),
        );

        let output = gateway.handle(&request()).unwrap();
        assert_eq!(output.exit_code, 0);
        assert_eq!(*run_count.lock().unwrap(), 1);
    }
}
