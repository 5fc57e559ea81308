//! The permission cache.
//!
//! One map from user id to that user's effective permissions and roles,
//! behind a single reader/writer lock. Coarse by design: role mutations
//! are rare relative to permission reads, so the whole map shares one
//! lock and correctness stays easy to reason about.
//!
//! Entries expire after a fixed TTL and are *deleted* — not overwritten —
//! when a mutation touches the user, so the next read is forced back to
//! the source of truth. Stale and fresh state are never merged.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use brig_contracts::rbac::{Permission, Role};

/// What the cache holds per user.
struct CacheEntry {
    permissions: Vec<Permission>,
    roles: Vec<Role>,
    last_update: Instant,
}

/// TTL-bounded cache of effective permissions, keyed by user id.
///
/// The lock is only ever held for map access — never across a database
/// query. Loads happen outside, and the result is inserted afterwards.
pub struct PermissionCache {
    entries: RwLock<HashMap<i64, CacheEntry>>,
    ttl: Duration,
}

impl PermissionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Return the cached entry for `user_id` if it is still fresh.
    pub fn get(&self, user_id: i64) -> Option<(Vec<Permission>, Vec<Role>)> {
        let entries = self.entries.read().expect("permission cache lock poisoned");
        let entry = entries.get(&user_id)?;
        if entry.last_update.elapsed() >= self.ttl {
            return None;
        }
        Some((entry.permissions.clone(), entry.roles.clone()))
    }

    /// Store a freshly loaded entry for `user_id`.
    pub fn set(&self, user_id: i64, permissions: Vec<Permission>, roles: Vec<Role>) {
        let mut entries = self.entries.write().expect("permission cache lock poisoned");
        entries.insert(
            user_id,
            CacheEntry {
                permissions,
                roles,
                last_update: Instant::now(),
            },
        );
    }

    /// Delete the entry for `user_id`. Called synchronously by every
    /// mutation affecting the user, so no subsequent read observes stale
    /// authorization after a revoke.
    pub fn invalidate(&self, user_id: i64) {
        let mut entries = self.entries.write().expect("permission cache lock poisoned");
        entries.remove(&user_id);
    }

    /// Drop every entry. Used after bulk role/permission edits.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write().expect("permission cache lock poisoned");
        entries.clear();
    }
}
