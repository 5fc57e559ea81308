//! Error types for the BRIG authorization pipeline.
//!
//! All fallible operations in the pipeline return `BrigResult<T>`.
//! Variants are deliberately coarse: callers must be able to tell
//! "log in again" (`SessionInvalid`) from "you lack access"
//! (`PermissionDenied`), but user-visible messages stay generic and
//! non-leaking. None of these errors are retried inside the core;
//! retry policy belongs to the caller.

use thiserror::Error;

/// The unified error type for the BRIG gateway and its components.
#[derive(Debug, Error)]
pub enum BrigError {
    /// Arguments failed whitelist validation. Never retried.
    #[error("command validation failed: {reason}")]
    Validation { reason: String },

    /// The symbolic command key is not in the whitelist.
    ///
    /// Treated as a security event by callers — an unknown key can only
    /// come from a coding error or an attempted bypass.
    #[error("command not whitelisted: {command}")]
    NotWhitelisted { command: String },

    /// The session is missing, expired, or does not match the claimed user.
    /// The caller must re-authenticate.
    #[error("invalid session: {reason}")]
    SessionInvalid { reason: String },

    /// The user is authenticated but not entitled to the requested
    /// (resource, action) pair.
    #[error("permission denied for {resource}:{action}")]
    PermissionDenied { resource: String, action: String },

    /// An attempted mutation of a role flagged `is_system`.
    #[error("role '{role}' is a protected system role")]
    SystemRoleProtected { role: String },

    /// Any persistence failure during session or RBAC checks.
    ///
    /// Always resolved as "not authorized" by callers — never "assume
    /// authorized" (fail-closed).
    #[error("storage error: {reason}")]
    Storage { reason: String },

    /// The audit writer could not persist an event.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The subprocess could not be spawned or reported a failure the
    /// broker cannot express as an exit code.
    #[error("command execution failed: {reason}")]
    CommandFailed { reason: String },
}

/// Convenience alias used throughout the BRIG crates.
pub type BrigResult<T> = Result<T, BrigError>;
