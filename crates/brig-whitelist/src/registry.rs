//! The static command registry.
//!
//! One `CommandSpec` per symbolic key. The table is built once, at first
//! use, from literals in this file — never from request data — and lives
//! for the life of the process. Argument validation against a spec is
//! implemented in [`crate::validate`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// A whitelisted system command.
///
/// `allowed_args` is a literal prefix matched index by index;
/// `arg_patterns` validates the arguments that follow it, one pattern per
/// position. A spec with patterns and no literal prefix requires the
/// argument count to equal the pattern count exactly.
pub struct CommandSpec {
    pub name: &'static str,
    /// Absolute path of the executable. Relative paths are never used.
    pub path: &'static str,
    pub allowed_args: &'static [&'static str],
    pub arg_patterns: Vec<Regex>,
    pub description: &'static str,
}

/// Compile a pattern list for a spec. Panics at table-build time if a
/// literal in this file is not a valid regex, which is a programming error.
fn patterns(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|s| Regex::new(s).expect("static whitelist pattern must compile"))
        .collect()
}

fn spec(
    name: &'static str,
    path: &'static str,
    allowed_args: &'static [&'static str],
    pattern_sources: &[&str],
    description: &'static str,
) -> CommandSpec {
    CommandSpec {
        name,
        path,
        allowed_args,
        arg_patterns: patterns(pattern_sources),
        description,
    }
}

/// Every system operation the daemon may ever invoke.
///
/// Keys are symbolic command names; callers never supply executable paths
/// or raw argument templates.
pub static COMMAND_WHITELIST: LazyLock<HashMap<&'static str, CommandSpec>> =
    LazyLock::new(build_whitelist);

/// Look up a command spec by symbolic key.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMAND_WHITELIST.get(name)
}

fn build_whitelist() -> HashMap<&'static str, CommandSpec> {
    let table = vec![
        // ── ZFS datasets ─────────────────────────────────────────────────────
        spec(
            "zfs_list",
            "/usr/sbin/zfs",
            &["list", "-H", "-o", "name,used,avail,refer,mountpoint", "-t", "filesystem"],
            &[],
            "List ZFS filesystems",
        ),
        spec(
            "zfs_get",
            "/usr/sbin/zfs",
            &["get", "-H", "-o", "value"],
            &[r"^[a-zA-Z0-9_\-\./:]+$"],
            "Get a ZFS property value",
        ),
        spec(
            "zfs_create",
            "/usr/sbin/zfs",
            &["create"],
            &[r"^[a-zA-Z0-9_\-]+/[a-zA-Z0-9_\-/]+$"],
            "Create a ZFS dataset",
        ),
        spec(
            "zfs_destroy",
            "/usr/sbin/zfs",
            &["destroy", "-r"],
            &[r"^[a-zA-Z0-9_\-]+/[a-zA-Z0-9_\-/]+$"],
            "Destroy a ZFS dataset recursively",
        ),
        spec(
            "zfs_snapshot",
            "/usr/sbin/zfs",
            &["snapshot"],
            &[r"^[a-zA-Z0-9_\-]+/[a-zA-Z0-9_\-/]+@[a-zA-Z0-9_\-]+$"],
            "Create a ZFS snapshot",
        ),
        spec(
            "zfs_list_snapshots",
            "/usr/sbin/zfs",
            &["list", "-t", "snapshot", "-r"],
            &[r"^[a-zA-Z0-9_\-]+(/[a-zA-Z0-9_\-/]+)?$"],
            "List snapshots under a dataset",
        ),
        spec(
            "zfs_set_property",
            "/usr/sbin/zfs",
            &["set"],
            &[
                // property=value; '/' allowed so mountpoint=/tank/data works
                r"^[a-zA-Z0-9_\-\./:]+=[a-zA-Z0-9_\-\.:/]+$",
                r"^[a-zA-Z0-9_\-\./]+$",
            ],
            "Set a ZFS property (mountpoint, quota, compression, ...)",
        ),
        // ── ZFS replication ──────────────────────────────────────────────────
        spec(
            "zfs_send",
            "/usr/sbin/zfs",
            &["send", "-R"],
            &[r"^[a-zA-Z0-9_\-]+(/[a-zA-Z0-9_\-/]+)?@[a-zA-Z0-9_\-]+$"],
            "Full ZFS send for replication",
        ),
        spec(
            "zfs_send_incremental",
            "/usr/sbin/zfs",
            &["send", "-R", "-i"],
            &[
                r"^[a-zA-Z0-9_\-]+(/[a-zA-Z0-9_\-/]+)?@[a-zA-Z0-9_\-]+$",
                r"^[a-zA-Z0-9_\-]+(/[a-zA-Z0-9_\-/]+)?@[a-zA-Z0-9_\-]+$",
            ],
            "Incremental ZFS send between two snapshots",
        ),
        spec(
            "zfs_receive",
            "/usr/sbin/zfs",
            &["receive", "-F"],
            &[r"^[a-zA-Z0-9_\-]+(/[a-zA-Z0-9_\-/]+)?$"],
            "ZFS receive for replication",
        ),
        // ── ZFS pools ────────────────────────────────────────────────────────
        spec(
            "zpool_list",
            "/usr/sbin/zpool",
            &["list", "-H", "-o", "name,size,alloc,free,health"],
            &[],
            "List ZFS pools",
        ),
        spec(
            "zpool_status",
            "/usr/sbin/zpool",
            &["status", "-P"],
            &[r"^[a-zA-Z0-9_\-]+$"],
            "Pool status, optionally for one pool",
        ),
        // Validated by the bespoke vdev-layout validator, not by patterns:
        // the optional RAID token plus variable-length device list cannot be
        // expressed as fixed per-position patterns.
        spec(
            "zpool_create",
            "/usr/sbin/zpool",
            &["create"],
            &[],
            "Create a ZFS pool",
        ),
        spec(
            "zpool_destroy",
            "/usr/sbin/zpool",
            &["destroy"],
            &[r"^[a-zA-Z0-9_\-]+$"],
            "Destroy a ZFS pool",
        ),
        spec(
            "zpool_scrub",
            "/usr/sbin/zpool",
            &["scrub"],
            &[r"^[a-zA-Z0-9_\-]+$"],
            "Start a pool scrub",
        ),
        spec(
            "zpool_add_cache",
            "/usr/sbin/zpool",
            &["add"],
            &[r"^[a-zA-Z0-9_\-]+$", r"^cache$", r"^[a-zA-Z0-9_\-/]+$"],
            "Add an L2ARC cache device to a pool",
        ),
        spec(
            "zpool_add_log",
            "/usr/sbin/zpool",
            &["add"],
            &[r"^[a-zA-Z0-9_\-]+$", r"^(?:log|mirror)$", r"^[a-zA-Z0-9_\-/]+$"],
            "Add a ZIL log device to a pool",
        ),
        spec(
            "zpool_remove_device",
            "/usr/sbin/zpool",
            &["remove"],
            &[r"^[a-zA-Z0-9_\-]+$", r"^[a-zA-Z0-9_\-/]+$"],
            "Remove a cache or log device from a pool",
        ),
        spec(
            "zpool_import_scan",
            "/usr/sbin/zpool",
            &["import"],
            &[],
            "Scan for importable pools",
        ),
        spec(
            "zpool_import",
            "/usr/sbin/zpool",
            &["import"],
            &[r"^(-f|[a-zA-Z0-9_\-]+)$"],
            "Import an existing pool, optionally forced",
        ),
        // ── Shares: Samba / NFS ──────────────────────────────────────────────
        spec(
            "systemctl_reload_smbd",
            "/usr/bin/systemctl",
            &["reload", "smbd"],
            &[],
            "Reload the Samba daemon",
        ),
        spec(
            "testparm",
            "/usr/bin/testparm",
            &["-s"],
            &[],
            "Validate the Samba configuration",
        ),
        spec(
            "exportfs_reload",
            "/usr/sbin/exportfs",
            &["-ra"],
            &[],
            "Reload NFS exports",
        ),
        spec(
            "exportfs_list",
            "/usr/sbin/exportfs",
            &["-v"],
            &[],
            "List NFS exports",
        ),
        // ── File operations ──────────────────────────────────────────────────
        spec(
            "mkdir",
            "/usr/bin/mkdir",
            &["-p"],
            &[r"^/[a-zA-Z0-9/_\-\. ]+$"],
            "Create a directory",
        ),
        spec(
            "chown",
            "/usr/bin/chown",
            &[],
            &[
                r"^[a-z_][a-z0-9_-]*(:?[a-z_]?[a-z0-9_-]*)?$",
                r"^/[a-zA-Z0-9/_\-\. ]+$",
            ],
            "Change file ownership",
        ),
        spec(
            "chmod",
            "/usr/bin/chmod",
            &[],
            &[r"^[0-7]{3,4}$", r"^/[a-zA-Z0-9/_\-\. ]+$"],
            "Change file permissions",
        ),
        // ── Disks ────────────────────────────────────────────────────────────
        spec(
            "lsblk_list",
            "/usr/bin/lsblk",
            &["-d", "-n", "-o", "NAME,TYPE"],
            &[],
            "List block devices",
        ),
        spec(
            "hdparm_check",
            "/usr/sbin/hdparm",
            &["-C"],
            &[r"^/dev/[a-z0-9]+$"],
            "Check disk power state",
        ),
        spec(
            "hdparm_spindown",
            "/usr/sbin/hdparm",
            &["-y"],
            &[r"^/dev/[a-z0-9]+$"],
            "Spin a disk down",
        ),
        spec(
            "smartctl_test",
            "/usr/sbin/smartctl",
            &["-t"],
            &[
                r"^(short|long|conveyance)$",
                r"^/dev/(sd[a-z][0-9]*|nvme[0-9]+n[0-9]+p?[0-9]*)$",
            ],
            "Start a SMART self-test",
        ),
        // ── Docker ───────────────────────────────────────────────────────────
        spec(
            "docker_ps",
            "/usr/bin/docker",
            &["ps", "-a", "--format", "{{json .}}"],
            &[],
            "List containers",
        ),
        spec(
            "docker_inspect",
            "/usr/bin/docker",
            &["inspect"],
            &[r"^[a-zA-Z0-9_\-]+$"],
            "Inspect a container",
        ),
        spec(
            "docker_start",
            "/usr/bin/docker",
            &["start"],
            &[r"^[a-zA-Z0-9_\-]+$"],
            "Start a container",
        ),
        spec(
            "docker_stop",
            "/usr/bin/docker",
            &["stop"],
            &[r"^[a-zA-Z0-9_\-]+$"],
            "Stop a container",
        ),
        // ── System ───────────────────────────────────────────────────────────
        spec(
            "systemctl_status",
            "/usr/bin/systemctl",
            &["status", "--no-pager"],
            &[r"^[a-zA-Z0-9_\-\.]+$"],
            "Service status",
        ),
        spec(
            "journalctl",
            "/usr/bin/journalctl",
            &["-n", "--no-pager", "-o", "json"],
            &[r"^\d+$"],
            "Read system logs",
        ),
    ];

    table.into_iter().map(|s| (s.name, s)).collect()
}
