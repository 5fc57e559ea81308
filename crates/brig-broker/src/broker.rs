//! The command broker: symbolic key + typed parameters → validated argv →
//! one subprocess.
//!
//! This is the single spawn chokepoint of the daemon. No caller-supplied
//! value reaches a subprocess without passing through exactly one typed
//! validator, and the rendered argv is re-checked against the whitelist as
//! a final gate before anything runs. Commands are executed directly from
//! an argv vector — there is no shell anywhere in this path.

use std::collections::HashMap;
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use brig_contracts::command::CommandOutput;
use brig_contracts::error::{BrigError, BrigResult};
use brig_whitelist::registry::lookup;
use brig_whitelist::sanitize::sanitize_output;
use brig_whitelist::validate::validate;

use crate::params::ParamSpec;
use crate::params::ParamType::*;

/// The declared shape of one brokered command: a literal argument base
/// followed by typed, named parameters in a fixed order.
#[derive(Debug)]
pub struct BrokerSpec {
    /// Symbolic key; must also exist in the whitelist registry, which
    /// supplies the executable path.
    pub key: &'static str,
    pub base_args: &'static [&'static str],
    pub params: &'static [ParamSpec],
}

/// Every command the broker can render. Order within an entry's `params`
/// is the argv order.
const BROKER_COMMANDS: &[BrokerSpec] = &[
    BrokerSpec {
        key: "zpool_create",
        base_args: &["create"],
        params: &[
            ParamSpec::optional("flags", Flag),
            ParamSpec::required("name", PoolName),
            ParamSpec::required("vdev", VdevSpec),
        ],
    },
    BrokerSpec {
        key: "zpool_destroy",
        base_args: &["destroy"],
        params: &[ParamSpec::required("name", PoolName)],
    },
    BrokerSpec {
        key: "zpool_scrub",
        base_args: &["scrub"],
        params: &[ParamSpec::required("name", PoolName)],
    },
    BrokerSpec {
        key: "zpool_status",
        base_args: &["status", "-P"],
        params: &[ParamSpec::optional("name", PoolName)],
    },
    BrokerSpec {
        key: "zfs_create",
        base_args: &["create"],
        params: &[ParamSpec::required("name", DatasetName)],
    },
    BrokerSpec {
        key: "zfs_destroy",
        base_args: &["destroy", "-r"],
        params: &[ParamSpec::required("name", DatasetName)],
    },
    BrokerSpec {
        key: "zfs_snapshot",
        base_args: &["snapshot"],
        params: &[ParamSpec::required("name", SnapshotName)],
    },
    BrokerSpec {
        key: "zfs_set_property",
        base_args: &["set"],
        params: &[
            ParamSpec::required("property", ZfsPropertyKv),
            ParamSpec::required("name", DatasetName),
        ],
    },
    BrokerSpec {
        key: "zfs_send",
        base_args: &["send", "-R"],
        params: &[ParamSpec::required("snapshot", SnapshotName)],
    },
    BrokerSpec {
        key: "docker_start",
        base_args: &["start"],
        params: &[ParamSpec::required("name", ContainerName)],
    },
    BrokerSpec {
        key: "docker_stop",
        base_args: &["stop"],
        params: &[ParamSpec::required("name", ContainerName)],
    },
    BrokerSpec {
        key: "docker_inspect",
        base_args: &["inspect"],
        params: &[ParamSpec::required("name", ContainerName)],
    },
    BrokerSpec {
        key: "smartctl_test",
        base_args: &["-t"],
        params: &[
            ParamSpec::required("test_type", TestType),
            ParamSpec::required("device", DiskPath),
        ],
    },
    BrokerSpec {
        key: "hdparm_check",
        base_args: &["-C"],
        params: &[ParamSpec::required("device", DiskPath)],
    },
    BrokerSpec {
        key: "mkdir",
        base_args: &["-p"],
        params: &[ParamSpec::required("path", SandboxedPath)],
    },
    BrokerSpec {
        key: "chown",
        base_args: &[],
        params: &[
            ParamSpec::required("owner", BoundedString),
            ParamSpec::required("path", SandboxedPath),
        ],
    },
];

fn broker_spec(key: &str) -> Option<&'static BrokerSpec> {
    BROKER_COMMANDS.iter().find(|spec| spec.key == key)
}

/// A fully validated, ready-to-spawn invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    /// Absolute executable path from the whitelist registry.
    pub path: String,
    pub args: Vec<String>,
}

/// The broker service. Stateless; construct once and share.
///
/// One subprocess is spawned per invocation; nothing is pooled or
/// reused, and nothing is cancellable once spawned. A caller that times
/// out must treat the operation as "status unknown" and reconcile by
/// re-querying system state.
#[derive(Debug, Default)]
pub struct CommandBroker;

impl CommandBroker {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `key` + `params` into a validated argv without spawning.
    ///
    /// Pipeline: look up the broker spec and the whitelist spec, validate
    /// and render each declared parameter through its type, then pass the
    /// complete argv back through [`brig_whitelist::validate`] as the
    /// final gate. Exposed for dry-runs and the operator CLI.
    pub fn render(
        &self,
        key: &str,
        params: &HashMap<String, String>,
    ) -> BrigResult<RenderedCommand> {
        let spec = broker_spec(key).ok_or_else(|| BrigError::NotWhitelisted {
            command: key.to_string(),
        })?;
        let whitelist_spec = lookup(key).ok_or_else(|| BrigError::NotWhitelisted {
            command: key.to_string(),
        })?;

        let mut args: Vec<String> = spec.base_args.iter().map(|s| s.to_string()).collect();

        for param in spec.params {
            match params.get(param.name) {
                Some(value) => {
                    let tokens = param.ty.validate_and_render(param.name, value)?;
                    args.extend(tokens);
                }
                None if param.required => {
                    return Err(BrigError::Validation {
                        reason: format!("missing required parameter '{}' for {key}", param.name),
                    });
                }
                None => {}
            }
        }

        validate(key, &args)?;

        Ok(RenderedCommand {
            path: whitelist_spec.path.to_string(),
            args,
        })
    }

    /// Execute a brokered command and wait for it to finish.
    ///
    /// Both output streams are captured and secret-redacted before being
    /// returned or logged. A non-zero exit is not an `Err` — the caller
    /// receives the sanitized output and decides; `Err` means the request
    /// was rejected or the process could not be spawned at all.
    pub fn execute(
        &self,
        key: &str,
        params: &HashMap<String, String>,
    ) -> BrigResult<CommandOutput> {
        let rendered = self.render(key, params)?;

        debug!(command = %key, path = %rendered.path, args = ?rendered.args, "spawning");

        let output = Command::new(&rendered.path)
            .args(&rendered.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| BrigError::CommandFailed {
                reason: format!("failed to spawn {}: {e}", rendered.path),
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let result = CommandOutput {
            stdout: sanitize_output(&String::from_utf8_lossy(&output.stdout)),
            stderr: sanitize_output(&String::from_utf8_lossy(&output.stderr)),
            exit_code,
        };

        if result.success() {
            info!(command = %key, "command completed");
        } else {
            warn!(command = %key, exit_code, "command exited non-zero");
        }

        Ok(result)
    }

    /// Validate and spawn a long-running command without waiting.
    ///
    /// Used for scrubs, resilvers, and replication sends, whose progress
    /// is observed through separate status queries. The child is reaped in
    /// a background thread; its output is discarded.
    pub fn execute_detached(&self, key: &str, params: &HashMap<String, String>) -> BrigResult<()> {
        let rendered = self.render(key, params)?;

        info!(command = %key, path = %rendered.path, "spawning detached");

        let mut child = Command::new(&rendered.path)
            .args(&rendered.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| BrigError::CommandFailed {
                reason: format!("failed to spawn {}: {e}", rendered.path),
            })?;

        // Reap the child so it never lingers as a zombie.
        std::thread::spawn(move || {
            let _ = child.wait();
        });

        Ok(())
    }
}
