//! Argument validation against the static registry.
//!
//! `validate` is the final gate in front of every subprocess spawn. It is
//! deliberately dumb: exact literals, per-position patterns, and a handful
//! of bespoke validators for shapes the fixed scheme cannot express.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use brig_contracts::error::{BrigError, BrigResult};

use crate::names::{is_raid_keyword, validate_device_path, validate_pool_name};
use crate::registry::lookup;

/// Flags accepted between `create` and the pool layout, e.g. `-f`.
static CREATE_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-[a-zA-Z]+$").expect("create flag pattern"));

/// Check whether `(name, args)` is an allowed invocation.
///
/// Rejections:
/// - unknown `name` → [`BrigError::NotWhitelisted`]
/// - literal-prefix mismatch at any index → [`BrigError::Validation`]
/// - a trailing argument that fails its positional pattern → `Validation`
/// - more trailing arguments than patterns → `Validation`
/// - pattern-only specs with any argument-count mismatch → `Validation`
///
/// Trailing patterns are optional from the end: a spec with two patterns
/// accepts zero, one, or two trailing arguments, each matched in order.
/// This is how commands with an optional final operand (`zpool status`,
/// `zpool import`) are expressed.
pub fn validate(name: &str, args: &[String]) -> BrigResult<()> {
    let spec = match lookup(name) {
        Some(spec) => spec,
        None => {
            warn!(command = %name, "rejected command absent from whitelist");
            return Err(BrigError::NotWhitelisted {
                command: name.to_string(),
            });
        }
    };

    // Commands whose argument shape the literal+pattern scheme cannot
    // express get a bespoke validator.
    if name == "zpool_create" {
        return validate_zpool_create(args);
    }

    if !spec.allowed_args.is_empty() {
        // Literal-prefix mode.
        if args.len() < spec.allowed_args.len() {
            return Err(BrigError::Validation {
                reason: format!("insufficient arguments for {name}"),
            });
        }
        for (i, allowed) in spec.allowed_args.iter().enumerate() {
            if args[i] != *allowed {
                return Err(BrigError::Validation {
                    reason: format!(
                        "invalid argument at position {i}: expected {allowed:?}, got {:?}",
                        args[i]
                    ),
                });
            }
        }

        let remaining = &args[spec.allowed_args.len()..];
        if remaining.len() > spec.arg_patterns.len() {
            return Err(BrigError::Validation {
                reason: format!("too many arguments for {name}"),
            });
        }
        for (arg, pattern) in remaining.iter().zip(spec.arg_patterns.iter()) {
            if !pattern.is_match(arg) {
                return Err(BrigError::Validation {
                    reason: format!("argument {arg:?} does not match allowed pattern"),
                });
            }
        }
    } else if !spec.arg_patterns.is_empty() {
        // Pattern-only mode: the count must match exactly.
        if args.len() != spec.arg_patterns.len() {
            return Err(BrigError::Validation {
                reason: format!(
                    "wrong number of arguments for {name}: expected {}, got {}",
                    spec.arg_patterns.len(),
                    args.len()
                ),
            });
        }
        for (arg, pattern) in args.iter().zip(spec.arg_patterns.iter()) {
            if !pattern.is_match(arg) {
                return Err(BrigError::Validation {
                    reason: format!("argument {arg:?} does not match allowed pattern"),
                });
            }
        }
    }

    Ok(())
}

/// Bespoke validator for `zpool create`.
///
/// Shape: `create [FLAGS...] [LAYOUT] POOL DEVICE [LAYOUT|DEVICE...]`
/// where FLAGS are single-dash options such as `-f`, LAYOUT is one of the
/// closed RAID keyword set, POOL is a valid pool name, and every remaining
/// token is either a further layout keyword or a device path. At least one
/// device is required.
fn validate_zpool_create(args: &[String]) -> BrigResult<()> {
    if args.first().map(String::as_str) != Some("create") {
        return Err(BrigError::Validation {
            reason: "first argument must be 'create'".to_string(),
        });
    }

    let mut idx = 1;

    // Optional flags (e.g. -f to force-use disks with existing labels).
    while idx < args.len() && args[idx].starts_with('-') {
        if !CREATE_FLAG.is_match(&args[idx]) {
            return Err(BrigError::Validation {
                reason: format!("invalid flag {:?} for zpool create", args[idx]),
            });
        }
        idx += 1;
    }

    // Zero or one leading RAID layout keyword before the pool name.
    if idx < args.len() && is_raid_keyword(&args[idx]) {
        idx += 1;
    }

    let pool = args.get(idx).ok_or_else(|| BrigError::Validation {
        reason: "missing pool name for zpool create".to_string(),
    })?;
    validate_pool_name(pool)?;
    idx += 1;

    // One or more vdev tokens. Layout keywords may be interleaved to
    // describe multiple vdevs (e.g. `mirror sdb sdc mirror sdd sde`), but
    // the list must contain at least one actual device.
    let vdev_tokens = &args[idx..];
    let mut devices = 0usize;
    for token in vdev_tokens {
        if is_raid_keyword(token) {
            continue;
        }
        validate_device_path(token)?;
        devices += 1;
    }
    if devices == 0 {
        return Err(BrigError::Validation {
            reason: "zpool create requires at least one device".to_string(),
        });
    }

    Ok(())
}
