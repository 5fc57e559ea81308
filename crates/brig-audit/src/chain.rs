//! The hash-chain primitive.
//!
//! Every chained audit row commits to its predecessor and to every field
//! of its own event through one HMAC. The message layout is a wire-format
//! contract shared with any independent verification tool:
//!
//!   prev_hash|timestamp|user|action|resource|details|ip_address|success
//!
//! Fields are joined with `|`, the timestamp is rendered as a decimal
//! integer, and `success` as `true`/`false`. Reimplementations must
//! reproduce this byte-for-byte or every hash comparison fails.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use brig_contracts::audit::AuditEvent;

type HmacSha256 = Hmac<Sha256>;

/// Compute the chain hash for one audit event.
///
/// Returns the empty string when no signing key is configured — the
/// explicit "chaining disabled" state, not a failure. Otherwise returns
/// the lowercase hex HMAC-SHA256 of the canonical message over `key`.
pub fn compute_row_hash(key: Option<&[u8]>, prev_hash: &str, event: &AuditEvent) -> String {
    let key = match key {
        Some(k) if !k.is_empty() => k,
        _ => return String::new(),
    };

    let msg = format!(
        "{}|{}|{}|{}|{}|{}|{}|{}",
        prev_hash,
        event.timestamp,
        event.user,
        event.action,
        event.resource,
        event.details,
        event.ip_address,
        event.success,
    );

    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(msg.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
