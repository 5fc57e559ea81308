//! Gateway configuration, loaded from TOML.
//!
//! Example:
//!
//! ```toml
//! db_path = "/var/lib/brig/brig.db"
//! audit_key_path = "/var/lib/brig/audit.key"
//! cache_ttl_secs = 300
//! superuser_id = 1
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use brig_contracts::error::{BrigError, BrigResult};

/// Everything the gateway needs to construct its services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// SQLite database file.
    pub db_path: String,

    /// HMAC signing key file. Absent means audit chaining is disabled.
    #[serde(default)]
    pub audit_key_path: Option<String>,

    /// RBAC cache TTL in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// The user id that bypasses all permission checks.
    #[serde(default = "default_superuser_id")]
    pub superuser_id: i64,
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_superuser_id() -> i64 {
    1
}

impl GatewayConfig {
    /// Parse `s` as a TOML configuration document.
    pub fn from_toml_str(s: &str) -> BrigResult<Self> {
        toml::from_str(s).map_err(|e| BrigError::Config {
            reason: format!("failed to parse gateway config TOML: {e}"),
        })
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> BrigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BrigError::Config {
            reason: format!("failed to read config file '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }
}
