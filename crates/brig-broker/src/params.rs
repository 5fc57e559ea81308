//! The closed parameter-type system.
//!
//! Every caller-supplied value entering an argv is declared with one
//! `ParamType` and passes through exactly one typed validator. There is no
//! generic "string" escape hatch: a value that fits no type fits no
//! command.

use std::sync::LazyLock;

use regex::Regex;

use brig_contracts::error::{BrigError, BrigResult};
use brig_whitelist::names::{
    is_raid_keyword, validate_dataset_name, validate_device_path, validate_mount_point,
    validate_pool_name, validate_snapshot_name,
};

/// Docker container names/IDs.
static CONTAINER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_\-\.]{0,127}$").expect("container pattern"));

/// `property=value` pairs for `zfs set`; '/' allowed on the value side so
/// `mountpoint=/tank/data` works.
static PROPERTY_KV: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_\-\./:]+=[a-zA-Z0-9_\-\.:/]+$").expect("property kv pattern")
});

/// Single-dash short flags such as `-f`.
static FLAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-[a-zA-Z]+$").expect("flag pattern"));

/// Catch-all for short identifier-like operands (owners, line counts).
static BOUNDED_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-\.:]{1,64}$").expect("bounded string pattern"));

/// SMART self-test types accepted by the disk-test commands.
const TEST_TYPES: &[&str] = &["short", "long", "conveyance"];

/// The kinds of values a brokered command may declare.
///
/// This enum is closed on purpose: adding a parameter kind means adding a
/// validator here, reviewed with the rest of the security surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    PoolName,
    DatasetName,
    SnapshotName,
    DiskPath,
    ContainerName,
    /// A filesystem path that must resolve under an allow-listed root.
    SandboxedPath,
    /// One of the closed SMART self-test types.
    TestType,
    /// A `property=value` pair for `zfs set`.
    ZfsPropertyKv,
    /// A whitespace-separated vdev layout: RAID keywords and device paths.
    VdevSpec,
    /// A single short option such as `-f`.
    Flag,
    /// Length-bounded identifier text (owners, numeric operands).
    BoundedString,
}

impl ParamType {
    /// Validate `value` and render it into argv tokens.
    ///
    /// All types produce exactly one token except `VdevSpec`, which splits
    /// on whitespace and validates every token individually. Values are
    /// placed into the argv vector as-is after validation; no shell is ever
    /// involved, so there is nothing left to escape once a value has passed
    /// its character-class check.
    pub fn validate_and_render(self, name: &str, value: &str) -> BrigResult<Vec<String>> {
        match self {
            ParamType::PoolName => {
                validate_pool_name(value)?;
                Ok(vec![value.to_string()])
            }
            ParamType::DatasetName => {
                validate_dataset_name(value)?;
                Ok(vec![value.to_string()])
            }
            ParamType::SnapshotName => {
                validate_snapshot_name(value)?;
                Ok(vec![value.to_string()])
            }
            ParamType::DiskPath => {
                validate_device_path(value)?;
                Ok(vec![value.to_string()])
            }
            ParamType::ContainerName => {
                if CONTAINER_NAME.is_match(value) {
                    Ok(vec![value.to_string()])
                } else {
                    Err(invalid(name, value, "container name"))
                }
            }
            ParamType::SandboxedPath => {
                validate_mount_point(value)?;
                Ok(vec![value.to_string()])
            }
            ParamType::TestType => {
                if TEST_TYPES.contains(&value) {
                    Ok(vec![value.to_string()])
                } else {
                    Err(invalid(name, value, "test type"))
                }
            }
            ParamType::ZfsPropertyKv => {
                if PROPERTY_KV.is_match(value) {
                    Ok(vec![value.to_string()])
                } else {
                    Err(invalid(name, value, "property=value pair"))
                }
            }
            ParamType::VdevSpec => {
                let tokens: Vec<String> = value.split_whitespace().map(String::from).collect();
                if tokens.is_empty() {
                    return Err(invalid(name, value, "vdev specification"));
                }
                for token in &tokens {
                    if !is_raid_keyword(token) {
                        validate_device_path(token)?;
                    }
                }
                Ok(tokens)
            }
            ParamType::Flag => {
                if FLAG.is_match(value) {
                    Ok(vec![value.to_string()])
                } else {
                    Err(invalid(name, value, "flag"))
                }
            }
            ParamType::BoundedString => {
                if BOUNDED_STRING.is_match(value) {
                    Ok(vec![value.to_string()])
                } else {
                    Err(invalid(name, value, "bounded string"))
                }
            }
        }
    }
}

fn invalid(name: &str, value: &str, kind: &str) -> BrigError {
    BrigError::Validation {
        reason: format!("parameter '{name}': {value:?} is not a valid {kind}"),
    }
}

/// One declared parameter of a brokered command.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    /// When false, an absent parameter is skipped rather than rejected.
    pub required: bool,
}

impl ParamSpec {
    pub const fn required(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }
}
