//! # brig-rbac
//!
//! Role-based access control for the BRIG gateway.
//!
//! ## Overview
//!
//! [`RbacEngine`] resolves a user's effective permissions through role
//! membership, with wildcard matching and a time-bounded cache. A
//! designated superuser id bypasses all checks. Mutations go to SQLite
//! first and then *delete* the affected cache entries, so an explicit
//! revoke is observed by the very next read — there is no window where
//! stale and fresh authorization state are merged.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brig_rbac::RbacEngine;
//!
//! let rbac = RbacEngine::new(db.clone(), 1);
//! if rbac.user_has_permission(user.id, "zfs", "scrub")? {
//!     // proceed
//! }
//! ```

pub mod cache;
pub mod engine;

pub use cache::PermissionCache;
pub use engine::{RbacEngine, DEFAULT_CACHE_TTL};

// ── Tests ─────────────────────────────────────────────────────────────────────
