//! Role-based access control data types.
//!
//! These are catalog rows, not decisions: the RBAC engine in `brig-rbac`
//! loads them from the relational store and matches them against a
//! requested `(resource, action)` pair. Wildcards are expressed in the
//! data itself — a permission with `action = "*"` covers every action on
//! its resource, and `("*", "*")` covers everything.

use serde::{Deserialize, Serialize};

/// A single catalog permission: the right to perform `action` on `resource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: i64,
    /// Resource family, e.g. "zfs", "docker", "shares". `"*"` is a full wildcard.
    pub resource: String,
    /// Verb within the resource, e.g. "read", "create", "scrub". `"*"` covers all.
    pub action: String,
    pub display_name: String,
    pub description: String,
    /// UI grouping only — never consulted by authorization logic.
    pub category: String,
    pub created_at: String,
}

impl Permission {
    /// Shorthand used by callers that only need the matching fields.
    pub fn of(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: 0,
            resource: resource.into(),
            action: action.into(),
            display_name: String::new(),
            description: String::new(),
            category: String::new(),
            created_at: String::new(),
        }
    }

    /// Return true if this permission grants `(resource, action)`.
    ///
    /// Matching is exact, resource-wildcard (`action = "*"`), or full
    /// wildcard (`resource = "*"` and `action = "*"`). A bare resource
    /// wildcard with a concrete action does not exist in the catalog and
    /// is intentionally not matched.
    pub fn grants(&self, resource: &str, action: &str) -> bool {
        if self.resource == resource && self.action == action {
            return true;
        }
        if self.resource == resource && self.action == "*" {
            return true;
        }
        self.resource == "*" && self.action == "*"
    }
}

/// A named bundle of permissions.
///
/// Roles flagged `is_system` ship with the appliance and are immutable:
/// every mutation path in the engine rejects them with
/// `BrigError::SystemRoleProtected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub is_system: bool,
    /// Populated on single-role reads; empty on list queries.
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub created_at: String,
    pub updated_at: String,
}

/// A user's membership in a role.
///
/// `expires_at` supports time-boxed grants: an expired assignment is
/// ignored by the permission-load queries, not deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: i64,
    pub role_id: i64,
    pub granted_at: String,
    pub granted_by: Option<i64>,
    pub expires_at: Option<String>,
}
