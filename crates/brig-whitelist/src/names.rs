//! Dedicated validators for storage identifiers.
//!
//! Every identifier that can reach an argv position has exactly one
//! validator here. These MUST be applied before a value is passed to any
//! subprocess; the broker's typed parameters dispatch into them.

use std::sync::LazyLock;

use regex::Regex;

use brig_contracts::error::{BrigError, BrigResult};

/// ZFS pool names: start with a letter, then alphanumerics, hyphens,
/// underscores, dots. No spaces, no shell metacharacters, at most 255 chars.
static POOL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_\-\.]{0,254}$").expect("pool name pattern"));

/// One slash-separated dataset path component.
static DATASET_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-\.]+$").expect("dataset component pattern"));

/// The snapshot suffix after the `@`.
static SNAPSHOT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-\.]+$").expect("snapshot suffix pattern"));

/// Only whole-disk and partition nodes in the forms the appliance manages:
/// `/dev/sdX[N]`, `/dev/srN`, `/dev/nvmeNnN[pN]`.
static DEVICE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/dev/(sd[a-z][0-9]*|sr[0-9]+|nvme[0-9]+n[0-9]+p?[0-9]*)$")
        .expect("device path pattern")
});

/// Mount points must live under the allow-listed roots.
static MOUNT_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(mnt|media)/[a-zA-Z0-9_\-\.]+(/[a-zA-Z0-9_\-\.]+)*$")
        .expect("mount point pattern")
});

static SESSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("session token pattern"));

/// The closed set of RAID layout keywords accepted in a vdev specification.
pub const RAID_KEYWORDS: &[&str] = &["mirror", "raidz", "raidz1", "raidz2", "raidz3"];

/// Return true if `token` is one of the RAID layout keywords.
pub fn is_raid_keyword(token: &str) -> bool {
    RAID_KEYWORDS.contains(&token)
}

/// Validate a ZFS pool name.
pub fn validate_pool_name(name: &str) -> BrigResult<()> {
    if POOL_NAME.is_match(name) {
        Ok(())
    } else {
        Err(BrigError::Validation {
            reason: format!(
                "invalid pool name {name:?} (must start with a letter, alphanumeric, max 255 chars)"
            ),
        })
    }
}

/// Validate a full dataset path (`pool/child/...`).
///
/// Each slash-separated component is matched against a restricted character
/// class; the whole name is length-bounded. An empty component (leading,
/// trailing, or doubled slash) fails.
pub fn validate_dataset_name(name: &str) -> BrigResult<()> {
    if name.is_empty() || name.len() > 255 {
        return Err(BrigError::Validation {
            reason: format!("invalid dataset name length ({})", name.len()),
        });
    }
    for component in name.split('/') {
        if !DATASET_COMPONENT.is_match(component) {
            return Err(BrigError::Validation {
                reason: format!("invalid characters in dataset name component {component:?}"),
            });
        }
    }
    Ok(())
}

/// Validate a full snapshot identifier (`pool/dataset@snapname`).
pub fn validate_snapshot_name(name: &str) -> BrigResult<()> {
    let mut parts = name.splitn(2, '@');
    let dataset = parts.next().unwrap_or_default();
    let suffix = match parts.next() {
        Some(s) => s,
        None => {
            return Err(BrigError::Validation {
                reason: format!("invalid snapshot name {name:?} (must contain exactly one @)"),
            })
        }
    };
    validate_dataset_name(dataset)?;
    if !SNAPSHOT_SUFFIX.is_match(suffix) {
        return Err(BrigError::Validation {
            reason: format!("invalid snapshot suffix {suffix:?}"),
        });
    }
    Ok(())
}

/// Validate a block-device path.
pub fn validate_device_path(path: &str) -> BrigResult<()> {
    if DEVICE_PATH.is_match(path) {
        Ok(())
    } else {
        Err(BrigError::Validation {
            reason: format!(
                "invalid device path {path:?} (must be /dev/sdX, /dev/srN, or /dev/nvmeNnNpN)"
            ),
        })
    }
}

/// Validate a mount point. Paths outside `/mnt/` and `/media/` are refused,
/// as is any `.`/`..` component — the path must resolve under the allowed
/// root, not merely start with it.
pub fn validate_mount_point(path: &str) -> BrigResult<()> {
    if !MOUNT_POINT.is_match(path) {
        return Err(BrigError::Validation {
            reason: format!("invalid mount point {path:?} (must be under /mnt/ or /media/)"),
        });
    }
    if path.split('/').any(|c| c == "." || c == "..") {
        return Err(BrigError::Validation {
            reason: format!("mount point {path:?} contains a path traversal component"),
        });
    }
    Ok(())
}

/// Check the shape of a session token before it is ever used in a query:
/// alphanumeric only, between 20 and 100 characters.
pub fn is_valid_session_token(token: &str) -> bool {
    if token.len() < 20 || token.len() > 100 {
        return false;
    }
    SESSION_TOKEN.is_match(token)
}
