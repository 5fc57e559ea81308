//! # brig-audit
//!
//! Immutable, append-only, HMAC-SHA256 hash-chained audit trail for the
//! BRIG gateway.
//!
//! ## Overview
//!
//! Every privileged action produces one `AuditEvent`, appended by
//! [`AuditLog`]. When a signing key is configured, each stored row binds
//! to its predecessor through
//! `HMAC-SHA256(key, prev_hash|ts|user|action|resource|details|ip|success)`;
//! altering any historical field invalidates every subsequent hash.
//! Without a key the log still appends, with empty hashes — an explicit,
//! backward-compatible "chaining disabled" state.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brig_audit::{key::load_or_create_key, AuditLog, verify_chain};
//!
//! let key = load_or_create_key(Path::new("/var/lib/brig/audit.key"))?;
//! let log = AuditLog::new(db.clone(), Some(key.clone()));
//! log.append(&event)?;
//!
//! let report = verify_chain(&db, &key, None, None)?;
//! assert!(report.valid);
//! ```

pub mod chain;
pub mod key;
pub mod log;
pub mod verify;

pub use chain::compute_row_hash;
pub use log::AuditLog;
pub use verify::{verify_chain, ChainReport};

// ── Tests ─────────────────────────────────────────────────────────────────────
