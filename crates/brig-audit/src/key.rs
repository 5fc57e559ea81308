//! Signing-key management.
//!
//! The 32-byte HMAC key lives in a root-only file next to the database.
//! It is generated on first start and never exposed through any API.

use std::fs;
use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::info;

use brig_contracts::error::{BrigError, BrigResult};

/// The required key length in bytes.
pub const KEY_LEN: usize = 32;

/// Read the HMAC key from `path`, creating it with a freshly generated
/// key if the file does not exist.
///
/// A key file of the wrong length is a hard configuration error rather
/// than something to regenerate silently: overwriting it would orphan
/// every hash already in the chain.
pub fn load_or_create_key(path: &Path) -> BrigResult<Vec<u8>> {
    match fs::read(path) {
        Ok(data) => {
            if data.len() != KEY_LEN {
                return Err(BrigError::Config {
                    reason: format!(
                        "audit key at '{}' has wrong length {} (want {KEY_LEN})",
                        path.display(),
                        data.len()
                    ),
                });
            }
            Ok(data)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let mut key = vec![0u8; KEY_LEN];
            OsRng.fill_bytes(&mut key);
            write_key(path, &key)?;
            info!(path = %path.display(), "generated new audit signing key");
            Ok(key)
        }
        Err(e) => Err(BrigError::Config {
            reason: format!("reading audit key '{}': {e}", path.display()),
        }),
    }
}

fn write_key(path: &Path, key: &[u8]) -> BrigResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| BrigError::Config {
            reason: format!("creating audit key directory '{}': {e}", dir.display()),
        })?;
        set_mode(dir, 0o700)?;
    }
    fs::write(path, key).map_err(|e| BrigError::Config {
        reason: format!("writing audit key '{}': {e}", path.display()),
    })?;
    set_mode(path, 0o600)?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> BrigResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| BrigError::Config {
        reason: format!("setting permissions on '{}': {e}", path.display()),
    })
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> BrigResult<()> {
    Ok(())
}
