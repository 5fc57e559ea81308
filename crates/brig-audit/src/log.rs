//! The audit log writer.
//!
//! Appends are synchronous with the action they record: a privileged
//! request does not complete until its event row is durably persisted.
//! Each append runs in one transaction that reads the predecessor's
//! stored hash and inserts the new row, so the chain is strictly ordered
//! even under concurrent writers.

use rusqlite::{params, OptionalExtension};
use tracing::debug;

use brig_contracts::audit::AuditEvent;
use brig_contracts::error::{BrigError, BrigResult};
use brig_store::Db;

use crate::chain::compute_row_hash;

/// Append-only audit writer over the shared store.
///
/// Rows written while `key` is `None` carry empty hashes; enabling a key
/// later starts the chain from the next row without invalidating history.
#[derive(Clone)]
pub struct AuditLog {
    db: Db,
    key: Option<Vec<u8>>,
}

impl AuditLog {
    pub fn new(db: Db, key: Option<Vec<u8>>) -> Self {
        Self { db, key }
    }

    /// True when a signing key is configured.
    pub fn chaining_enabled(&self) -> bool {
        self.key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Append one event; returns the stored row id.
    ///
    /// The predecessor's `row_hash` is read inside the same transaction
    /// that inserts the new row, so two concurrent appends cannot both
    /// link to the same predecessor.
    pub fn append(&self, event: &AuditEvent) -> BrigResult<i64> {
        let mut conn = self.db.lock().map_err(|e| BrigError::AuditWriteFailed {
            reason: e.to_string(),
        })?;
        let tx = conn.transaction().map_err(write_failed)?;

        let prev_hash: String = if self.chaining_enabled() {
            tx.query_row(
                "SELECT row_hash FROM audit_log ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(write_failed)?
            .unwrap_or_default()
        } else {
            String::new()
        };

        let row_hash = compute_row_hash(self.key.as_deref(), &prev_hash, event);

        tx.execute(
            "INSERT INTO audit_log
             (timestamp, user, action, resource, details, ip_address, success,
              prev_hash, row_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                event.timestamp,
                event.user,
                event.action,
                event.resource,
                event.details,
                event.ip_address,
                event.success,
                prev_hash,
                row_hash,
            ],
        )
        .map_err(write_failed)?;
        let row_id = tx.last_insert_rowid();

        tx.commit().map_err(write_failed)?;

        debug!(row_id, action = %event.action, user = %event.user, "audit event appended");
        Ok(row_id)
    }
}

fn write_failed(e: rusqlite::Error) -> BrigError {
    BrigError::AuditWriteFailed {
        reason: e.to_string(),
    }
}
