//! Subprocess result types.

use serde::{Deserialize, Serialize};

/// The captured result of one brokered subprocess invocation.
///
/// Both streams have already passed through secret redaction by the time
/// a `CommandOutput` leaves the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code; -1 when the process was killed by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Return true if the subprocess exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
