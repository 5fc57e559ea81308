//! The RBAC engine: effective-permission resolution and role management.
//!
//! Reads resolve through the cache when fresh, otherwise from SQLite.
//! Mutations write to SQLite first, then delete the affected user's cache
//! entry, so a revoke is visible to the very next check. System roles are
//! immutable through every mutation path.

use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use brig_contracts::error::{BrigError, BrigResult};
use brig_contracts::rbac::{Permission, Role};
use brig_store::Db;

use crate::cache::PermissionCache;

/// How long a cached permission set may serve reads.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// The RBAC service. Owns its storage handle and cache; constructed once
/// at startup and shared behind `Arc`.
pub struct RbacEngine {
    db: Db,
    cache: PermissionCache,
    /// This user id holds every permission unconditionally, even against
    /// an empty role table. It is the appliance's break-glass account.
    superuser_id: i64,
}

impl RbacEngine {
    pub fn new(db: Db, superuser_id: i64) -> Self {
        Self::with_cache_ttl(db, superuser_id, DEFAULT_CACHE_TTL)
    }

    pub fn with_cache_ttl(db: Db, superuser_id: i64, ttl: Duration) -> Self {
        Self {
            db,
            cache: PermissionCache::new(ttl),
            superuser_id,
        }
    }

    // ── Permission checks ─────────────────────────────────────────────────────

    /// Does `user_id` hold `(resource, action)`?
    ///
    /// The superuser id short-circuits to true. Everyone else resolves
    /// through the cached permission set: exact match, `(resource, "*")`,
    /// or `("*", "*")`.
    pub fn user_has_permission(
        &self,
        user_id: i64,
        resource: &str,
        action: &str,
    ) -> BrigResult<bool> {
        if user_id == self.superuser_id {
            return Ok(true);
        }

        let (permissions, _) = self.effective_entry(user_id)?;
        Ok(permissions.iter().any(|p| p.grants(resource, action)))
    }

    /// True if the user holds at least one of `required`. Short-circuits.
    pub fn user_has_any_permission(
        &self,
        user_id: i64,
        required: &[Permission],
    ) -> BrigResult<bool> {
        for perm in required {
            if self.user_has_permission(user_id, &perm.resource, &perm.action)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True if the user holds every one of `required`. Short-circuits.
    pub fn user_has_all_permissions(
        &self,
        user_id: i64,
        required: &[Permission],
    ) -> BrigResult<bool> {
        for perm in required {
            if !self.user_has_permission(user_id, &perm.resource, &perm.action)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The user's roles, cache-or-database.
    pub fn get_user_roles(&self, user_id: i64) -> BrigResult<Vec<Role>> {
        let (_, roles) = self.effective_entry(user_id)?;
        Ok(roles)
    }

    /// Direct membership check against the join table (no cache).
    pub fn user_has_role(&self, user_id: i64, role_name: &str) -> BrigResult<bool> {
        let found: Option<i64> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT 1
                 FROM user_roles ur
                 JOIN roles r ON ur.role_id = r.id
                 WHERE ur.user_id = ?1 AND r.name = ?2
                 AND (ur.expires_at IS NULL OR ur.expires_at > datetime('now'))
                 LIMIT 1",
                params![user_id, role_name],
                |row| row.get(0),
            )
            .optional()
        })?;
        Ok(found.is_some())
    }

    /// Cache-or-database load of the user's effective entry.
    ///
    /// The cache lock is released before any query runs; a concurrent
    /// invalidation between load and insert costs one extra reload, never
    /// a stale grant.
    fn effective_entry(&self, user_id: i64) -> BrigResult<(Vec<Permission>, Vec<Role>)> {
        if let Some(entry) = self.cache.get(user_id) {
            return Ok(entry);
        }

        let (permissions, roles) = self.db.with_conn(|conn| {
            let permissions = load_user_permissions(conn, user_id)?;
            let roles = load_user_roles(conn, user_id)?;
            Ok((permissions, roles))
        })?;

        self.cache.set(user_id, permissions.clone(), roles.clone());
        debug!(user_id, count = permissions.len(), "permission set loaded");
        Ok((permissions, roles))
    }

    // ── Role management ───────────────────────────────────────────────────────

    /// Create a non-system role and return it.
    pub fn create_role(
        &self,
        name: &str,
        display_name: &str,
        description: &str,
    ) -> BrigResult<Role> {
        let role_id = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO roles (name, display_name, description, is_system)
                 VALUES (?1, ?2, ?3, 0)",
                params![name, display_name, description],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        self.get_role(role_id)
    }

    /// Load one role with its permission set.
    pub fn get_role(&self, role_id: i64) -> BrigResult<Role> {
        let mut role = self
            .db
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT id, name, display_name, description, is_system, created_at, updated_at
                     FROM roles WHERE id = ?1",
                    params![role_id],
                    row_to_role,
                )
                .optional()
            })?
            .ok_or_else(|| BrigError::Storage {
                reason: format!("role {role_id} not found"),
            })?;
        role.permissions = self.get_role_permissions(role_id)?;
        Ok(role)
    }

    /// Every role, system roles first.
    pub fn get_all_roles(&self) -> BrigResult<Vec<Role>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, display_name, description, is_system, created_at, updated_at
                 FROM roles ORDER BY is_system DESC, name ASC",
            )?;
            let roles = stmt
                .query_map([], row_to_role)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(roles)
        })
    }

    /// Update a role's display metadata. System roles are refused.
    pub fn update_role(
        &self,
        role_id: i64,
        display_name: &str,
        description: &str,
    ) -> BrigResult<()> {
        self.reject_system_role(role_id)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE roles
                 SET display_name = ?1, description = ?2, updated_at = datetime('now')
                 WHERE id = ?3 AND is_system = 0",
                params![display_name, description, role_id],
            )
        })?;
        // Permission sets may be displayed from cached roles; drop them all
        // rather than track which users reference this role.
        self.cache.invalidate_all();
        Ok(())
    }

    /// Delete a role. System roles are refused.
    pub fn delete_role(&self, role_id: i64) -> BrigResult<()> {
        self.reject_system_role(role_id)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM roles WHERE id = ?1 AND is_system = 0",
                params![role_id],
            )
        })?;
        self.cache.invalidate_all();
        Ok(())
    }

    // ── Permission management ─────────────────────────────────────────────────

    /// Permissions attached to one role.
    pub fn get_role_permissions(&self, role_id: i64) -> BrigResult<Vec<Permission>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.resource, p.action, p.display_name, p.description,
                        p.category, p.created_at
                 FROM permissions p
                 JOIN role_permissions rp ON p.id = rp.permission_id
                 WHERE rp.role_id = ?1
                 ORDER BY p.category, p.resource, p.action",
            )?;
            let perms = stmt
                .query_map(params![role_id], row_to_permission)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(perms)
        })
    }

    /// The whole permission catalog.
    pub fn get_all_permissions(&self) -> BrigResult<Vec<Permission>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, resource, action, display_name, description, category, created_at
                 FROM permissions ORDER BY category, resource, action",
            )?;
            let perms = stmt
                .query_map([], row_to_permission)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(perms)
        })
    }

    /// Attach a permission to a role. System roles are refused.
    pub fn assign_permission_to_role(&self, role_id: i64, permission_id: i64) -> BrigResult<()> {
        self.reject_system_role(role_id)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO role_permissions (role_id, permission_id)
                 VALUES (?1, ?2)",
                params![role_id, permission_id],
            )
        })?;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Detach a permission from a role. System roles are refused.
    pub fn remove_permission_from_role(&self, role_id: i64, permission_id: i64) -> BrigResult<()> {
        self.reject_system_role(role_id)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM role_permissions WHERE role_id = ?1 AND permission_id = ?2",
                params![role_id, permission_id],
            )
        })?;
        self.cache.invalidate_all();
        Ok(())
    }

    // ── User-role assignment ──────────────────────────────────────────────────

    /// Grant a role to a user, optionally time-boxed, then invalidate the
    /// user's cache entry so the next check reloads from the store.
    pub fn assign_role_to_user(
        &self,
        user_id: i64,
        role_id: i64,
        granted_by: Option<i64>,
        expires_at: Option<&str>,
    ) -> BrigResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO user_roles (user_id, role_id, granted_by, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, role_id, granted_by, expires_at],
            )
        })?;
        self.cache.invalidate(user_id);
        debug!(user_id, role_id, "role assigned");
        Ok(())
    }

    /// Revoke a role from a user, then invalidate the user's cache entry.
    /// The very next permission check observes the revoke.
    pub fn remove_role_from_user(&self, user_id: i64, role_id: i64) -> BrigResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM user_roles WHERE user_id = ?1 AND role_id = ?2",
                params![user_id, role_id],
            )
        })?;
        self.cache.invalidate(user_id);
        debug!(user_id, role_id, "role revoked");
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Refuse any mutation targeting a role flagged `is_system`.
    fn reject_system_role(&self, role_id: i64) -> BrigResult<()> {
        let row: Option<(String, bool)> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT name, is_system FROM roles WHERE id = ?1",
                params![role_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
        })?;
        let (name, is_system) = row.ok_or_else(|| BrigError::Storage {
            reason: format!("role {role_id} not found"),
        })?;
        if is_system {
            warn!(role_id, role = %name, "rejected mutation of system role");
            return Err(BrigError::SystemRoleProtected { role: name });
        }
        Ok(())
    }
}

fn row_to_permission(row: &rusqlite::Row<'_>) -> Result<Permission, rusqlite::Error> {
    Ok(Permission {
        id: row.get(0)?,
        resource: row.get(1)?,
        action: row.get(2)?,
        display_name: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn row_to_role(row: &rusqlite::Row<'_>) -> Result<Role, rusqlite::Error> {
    Ok(Role {
        id: row.get(0)?,
        name: row.get(1)?,
        display_name: row.get(2)?,
        description: row.get(3)?,
        is_system: row.get(4)?,
        permissions: Vec::new(),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Effective permissions for a user: distinct permissions reachable
/// through any unexpired role assignment.
fn load_user_permissions(
    conn: &Connection,
    user_id: i64,
) -> Result<Vec<Permission>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT p.id, p.resource, p.action, p.display_name, p.description,
                p.category, p.created_at
         FROM permissions p
         JOIN role_permissions rp ON p.id = rp.permission_id
         JOIN user_roles ur ON rp.role_id = ur.role_id
         WHERE ur.user_id = ?1
         AND (ur.expires_at IS NULL OR ur.expires_at > datetime('now'))
         ORDER BY p.category, p.resource, p.action",
    )?;
    let result = stmt
        .query_map(params![user_id], row_to_permission)?
        .collect();
    result
}

fn load_user_roles(conn: &Connection, user_id: i64) -> Result<Vec<Role>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.name, r.display_name, r.description, r.is_system,
                r.created_at, r.updated_at
         FROM roles r
         JOIN user_roles ur ON r.id = ur.role_id
         WHERE ur.user_id = ?1
         AND (ur.expires_at IS NULL OR ur.expires_at > datetime('now'))
         ORDER BY r.name",
    )?;
    let result = stmt.query_map(params![user_id], row_to_role)?.collect();
    result
}
