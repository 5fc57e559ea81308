//! The shared SQLite handle.
//!
//! One `Db` is constructed at daemon startup and cloned into every service
//! that needs persistence; there is no package-level database global.
//! The file is opened in WAL mode with a 30 second busy timeout so
//! concurrent readers are not blocked by periodic writer checkpoints.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;
use tracing::info;

use brig_contracts::error::{BrigError, BrigResult};

use crate::schema::SCHEMA;

/// Cloneable handle to the gateway's SQLite store.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open (or create) the store at `path` and apply the schema.
    pub fn open(path: &Path) -> BrigResult<Self> {
        let conn = Connection::open(path).map_err(|e| BrigError::Storage {
            reason: format!("failed to open database '{}': {e}", path.display()),
        })?;
        Self::init(&conn)?;
        info!(path = %path.display(), "database opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> BrigResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| BrigError::Storage {
            reason: format!("failed to open in-memory database: {e}"),
        })?;
        Self::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init(conn: &Connection) -> BrigResult<()> {
        // WAL gives concurrent readers during writes; a no-op for the
        // in-memory databases used in tests, hence the ignored result.
        let _ = conn.execute("PRAGMA journal_mode = WAL", []);

        conn.busy_timeout(Duration::from_secs(30))
            .map_err(storage)?;
        conn.pragma_update(None, "foreign_keys", "ON").map_err(storage)?;
        conn.pragma_update(None, "synchronous", "FULL").map_err(storage)?;

        conn.execute_batch(SCHEMA).map_err(storage)?;
        Ok(())
    }

    /// Acquire the connection.
    ///
    /// A poisoned lock is reported as a storage error — callers fail
    /// closed, they do not limp on with a connection another thread
    /// panicked while holding.
    pub fn lock(&self) -> BrigResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| BrigError::Storage {
            reason: "database lock poisoned".to_string(),
        })
    }

    /// Run `f` with the connection, mapping any rusqlite error to
    /// [`BrigError::Storage`].
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    ) -> BrigResult<T> {
        let conn = self.lock()?;
        f(&conn).map_err(storage)
    }
}

/// Map a rusqlite error into the fail-closed storage variant.
pub fn storage(e: rusqlite::Error) -> BrigError {
    BrigError::Storage {
        reason: e.to_string(),
    }
}
