//! Audit event types.
//!
//! One `AuditEvent` is appended per privileged action — allowed or denied.
//! When a signing key is configured the stored row additionally carries
//! `prev_hash` and `row_hash`, binding it to its predecessor; the hash
//! formula lives in `brig-audit` and is a byte-for-byte wire contract.

use serde::{Deserialize, Serialize};

/// A single audit record, as produced by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unix seconds. Stored and hashed as a decimal integer.
    pub timestamp: i64,
    pub user: String,
    /// What was attempted, e.g. "zpool_create", "role_assign", "login_failed".
    pub action: String,
    /// What it targeted, e.g. "tank", "role:7".
    pub resource: String,
    /// Free-form context. Secret-redacted before it reaches this struct.
    pub details: String,
    pub ip_address: String,
    pub success: bool,
}

impl AuditEvent {
    /// Build an event stamped with the given time.
    pub fn new(
        timestamp: i64,
        user: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
        details: impl Into<String>,
        ip_address: impl Into<String>,
        success: bool,
    ) -> Self {
        Self {
            timestamp,
            user: user.into(),
            action: action.into(),
            resource: resource.into(),
            details: details.into(),
            ip_address: ip_address.into(),
            success,
        }
    }
}

/// A stored audit row: the event plus its position and chain hashes.
///
/// `row_hash` is the empty string for rows written while chaining was
/// disabled; the verifier counts and skips those.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRow {
    pub id: i64,
    #[serde(flatten)]
    pub event: AuditEvent,
    pub prev_hash: String,
    pub row_hash: String,
}
