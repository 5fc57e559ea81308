//! # brig-whitelist
//!
//! Static whitelist of privileged system commands and the argument
//! validators that guard them.
//!
//! ## Overview
//!
//! Every operation the daemon can perform on the host is described by a
//! [`registry::CommandSpec`]: an absolute executable path, a literal
//! argument prefix, and per-position regular expressions for the caller-
//! supplied tail. [`validate`] checks a `(name, args)` tuple against the
//! registry; an unknown name or any argument mismatch is a hard rejection.
//! No subprocess is ever spawned from a tuple this crate has not passed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brig_whitelist::{validate, sanitize_output};
//!
//! validate("zpool_scrub", &["scrub".into(), "tank".into()])?;
//! let clean = sanitize_output(&raw_tool_output);
//! ```
//!
//! Identifier validators (`validate_pool_name`, `validate_device_path`, ...)
//! live in [`names`] and are also used directly by the broker's typed
//! parameters.

pub mod names;
pub mod registry;
pub mod sanitize;
pub mod validate;

pub use names::{
    is_raid_keyword, is_valid_session_token, validate_dataset_name, validate_device_path,
    validate_mount_point, validate_pool_name, validate_snapshot_name, RAID_KEYWORDS,
};
pub use registry::{lookup, CommandSpec, COMMAND_WHITELIST};
pub use sanitize::sanitize_output;
pub use validate::validate;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use brig_contracts::error::BrigError;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ── Unknown commands ──────────────────────────────────────────────────────

    #[test]
    fn unknown_command_is_rejected() {
        let result = validate("zpool_frobnicate", &args(&["frobnicate", "tank"]));
        match result {
            Err(BrigError::NotWhitelisted { command }) => {
                assert_eq!(command, "zpool_frobnicate");
            }
            other => panic!("expected NotWhitelisted, got {:?}", other),
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(validate("", &[]).is_err());
    }

    // ── Literal-prefix mode ───────────────────────────────────────────────────

    #[test]
    fn exact_literal_args_pass() {
        assert!(validate(
            "zpool_list",
            &args(&["list", "-H", "-o", "name,size,alloc,free,health"])
        )
        .is_ok());
    }

    #[test]
    fn literal_substitution_fails() {
        // Swapping one literal for something else must fail even when the
        // replacement looks harmless.
        assert!(validate(
            "zpool_list",
            &args(&["list", "-H", "-o", "name,size,alloc,free,health,guid"])
        )
        .is_err());
    }

    #[test]
    fn missing_literal_fails() {
        assert!(validate("zpool_list", &args(&["list", "-H", "-o"])).is_err());
    }

    #[test]
    fn trailing_pattern_arg_accepted() {
        assert!(validate("zpool_status", &args(&["status", "-P", "tank"])).is_ok());
        // The trailing operand is optional.
        assert!(validate("zpool_status", &args(&["status", "-P"])).is_ok());
    }

    #[test]
    fn trailing_pattern_arg_rejected_on_mismatch() {
        assert!(validate("zpool_status", &args(&["status", "-P", "tank; id"])).is_err());
    }

    #[test]
    fn surplus_args_beyond_patterns_fail() {
        assert!(validate("zpool_status", &args(&["status", "-P", "tank", "extra"])).is_err());
        // Commands with no patterns accept no surplus at all.
        assert!(validate(
            "zpool_list",
            &args(&["list", "-H", "-o", "name,size,alloc,free,health", "tank"])
        )
        .is_err());
    }

    #[test]
    fn snapshot_command_shape() {
        assert!(validate("zfs_snapshot", &args(&["snapshot", "tank/data@nightly"])).is_ok());
        assert!(validate("zfs_snapshot", &args(&["snapshot", "tank/data"])).is_err());
        assert!(
            validate("zfs_snapshot", &args(&["snapshot", "tank/data@nightly; reboot"])).is_err()
        );
    }

    // ── Pattern-only mode ─────────────────────────────────────────────────────

    #[test]
    fn pattern_only_exact_count_required() {
        assert!(validate("chmod", &args(&["0755", "/mnt/tank/share"])).is_ok());
        assert!(validate("chmod", &args(&["0755"])).is_err());
        assert!(validate("chmod", &args(&["0755", "/mnt/tank/share", "/etc"])).is_err());
    }

    #[test]
    fn pattern_only_rejects_bad_values() {
        assert!(validate("chmod", &args(&["rwxrwxrwx", "/mnt/tank/share"])).is_err());
        assert!(validate("chown", &args(&["alice:staff", "/mnt/tank/share"])).is_ok());
        assert!(validate("chown", &args(&["alice;id", "/mnt/tank/share"])).is_err());
    }

    // ── zpool create (bespoke) ────────────────────────────────────────────────

    #[test]
    fn zpool_create_plain() {
        assert!(validate(
            "zpool_create",
            &args(&["create", "tank", "/dev/sdb", "/dev/sdc"])
        )
        .is_ok());
    }

    #[test]
    fn zpool_create_with_layout_keyword() {
        for layout in ["mirror", "raidz", "raidz1", "raidz2", "raidz3"] {
            assert!(
                validate(
                    "zpool_create",
                    &args(&["create", layout, "tank", "/dev/sdb", "/dev/sdc"])
                )
                .is_ok(),
                "layout {layout} should be accepted"
            );
        }
    }

    #[test]
    fn zpool_create_with_force_flag() {
        assert!(validate(
            "zpool_create",
            &args(&["create", "-f", "tank", "/dev/sdb", "/dev/sdc"])
        )
        .is_ok());
    }

    #[test]
    fn zpool_create_rejects_unknown_layout() {
        // "raidz9" is not in the closed set, so it is treated as the pool
        // name; "tank" then fails device validation.
        assert!(validate(
            "zpool_create",
            &args(&["create", "raidz9", "tank", "/dev/sdb"])
        )
        .is_err());
    }

    #[test]
    fn zpool_create_rejects_injection_in_devices() {
        assert!(validate(
            "zpool_create",
            &args(&["create", "tank", "/dev/sdb; rm -rf /"])
        )
        .is_err());
    }

    #[test]
    fn zpool_create_requires_a_device() {
        assert!(validate("zpool_create", &args(&["create", "tank"])).is_err());
        assert!(validate("zpool_create", &args(&["create", "mirror", "tank"])).is_err());
    }

    #[test]
    fn zpool_create_rejects_bad_pool_name() {
        assert!(validate("zpool_create", &args(&["create", "1pool", "/dev/sdb"])).is_err());
    }

    // ── Pool names ────────────────────────────────────────────────────────────

    #[test]
    fn pool_name_accepts_reasonable_names() {
        assert!(validate_pool_name("tank0").is_ok());
        assert!(validate_pool_name("my-pool_1").is_ok());
        assert!(validate_pool_name("backup.pool").is_ok());
    }

    #[test]
    fn pool_name_rejects_leading_digit() {
        assert!(validate_pool_name("1pool").is_err());
    }

    #[test]
    fn pool_name_rejects_overlong() {
        let long = "p".repeat(300);
        assert!(validate_pool_name(&long).is_err());
    }

    #[test]
    fn pool_name_rejects_metacharacters() {
        assert!(validate_pool_name("pool;name").is_err());
        assert!(validate_pool_name("pool name").is_err());
        assert!(validate_pool_name("").is_err());
    }

    // ── Dataset names ─────────────────────────────────────────────────────────

    #[test]
    fn dataset_name_accepts_nested_paths() {
        assert!(validate_dataset_name("tank0/data/backups").is_ok());
        assert!(validate_dataset_name("tank0").is_ok());
    }

    #[test]
    fn dataset_name_rejects_spaces_and_metacharacters() {
        assert!(validate_dataset_name("tank0/my data").is_err());
        assert!(validate_dataset_name("tank0/data$backup").is_err());
    }

    #[test]
    fn dataset_name_rejects_empty_components() {
        assert!(validate_dataset_name("tank0//data").is_err());
        assert!(validate_dataset_name("/tank0/data").is_err());
        assert!(validate_dataset_name("tank0/data/").is_err());
    }

    #[test]
    fn dataset_name_rejects_overlong() {
        let long = format!("tank/{}", "d".repeat(300));
        assert!(validate_dataset_name(&long).is_err());
    }

    // ── Snapshot names ────────────────────────────────────────────────────────

    #[test]
    fn snapshot_name_requires_single_at() {
        assert!(validate_snapshot_name("tank/data@nightly").is_ok());
        assert!(validate_snapshot_name("tank/data").is_err());
        assert!(validate_snapshot_name("tank/data@night@ly").is_err());
    }

    // ── Device paths ──────────────────────────────────────────────────────────

    #[test]
    fn device_path_accepts_managed_forms() {
        assert!(validate_device_path("/dev/sda1").is_ok());
        assert!(validate_device_path("/dev/sdb").is_ok());
        assert!(validate_device_path("/dev/sr0").is_ok());
        assert!(validate_device_path("/dev/nvme0n1p2").is_ok());
        assert!(validate_device_path("/dev/nvme0n1").is_ok());
    }

    #[test]
    fn device_path_rejects_injection_and_strays() {
        assert!(validate_device_path("/dev/sda; rm -rf /").is_err());
        assert!(validate_device_path("/dev/../etc/shadow").is_err());
        assert!(validate_device_path("/dev/mapper/cryptroot").is_err());
        assert!(validate_device_path("sda1").is_err());
    }

    // ── Mount points ──────────────────────────────────────────────────────────

    #[test]
    fn mount_point_must_be_under_allowed_roots() {
        assert!(validate_mount_point("/mnt/tank").is_ok());
        assert!(validate_mount_point("/media/usb0/backups").is_ok());
        assert!(validate_mount_point("/etc/shadow").is_err());
        assert!(validate_mount_point("/mnt").is_err());
        assert!(validate_mount_point("/mnt/tank/../../etc").is_err());
    }

    // ── Session token shape ───────────────────────────────────────────────────

    #[test]
    fn session_token_shape() {
        let good: String = "a1B2".repeat(8); // 32 chars, alphanumeric
        assert!(is_valid_session_token(&good));

        assert!(!is_valid_session_token("short"));
        assert!(!is_valid_session_token(&"x".repeat(150)));
        assert!(!is_valid_session_token(&format!("{}!@#$%^&*()", "a".repeat(22))));
    }

    // ── Output sanitization ───────────────────────────────────────────────────

    #[test]
    fn sanitize_masks_known_secret_keys() {
        assert_eq!(sanitize_output("password=secret123"), "password=***");
        assert_eq!(
            sanitize_output("auth token=eyJabc123 rest"),
            "auth token=*** rest"
        );
        assert_eq!(sanitize_output("wrapping key=0xdeadbeef"), "wrapping key=***");
    }

    #[test]
    fn sanitize_leaves_clean_text_alone() {
        let text = "no secrets here";
        assert_eq!(sanitize_output(text), text);
    }

    // ── Registry hygiene ──────────────────────────────────────────────────────

    #[test]
    fn registry_paths_are_absolute() {
        for spec in COMMAND_WHITELIST.values() {
            assert!(
                spec.path.starts_with('/'),
                "command {} has a relative path {:?}",
                spec.name,
                spec.path
            );
        }
    }

    #[test]
    fn registry_keys_match_spec_names() {
        for (key, spec) in COMMAND_WHITELIST.iter() {
            assert_eq!(*key, spec.name);
        }
    }
}
