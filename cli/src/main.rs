//! BRIG operator CLI.
//!
//! `brigctl` gives operators direct access to the two administrative
//! surfaces of the gateway core:
//!
//!   brigctl audit-verify [--db PATH] [--key PATH] [--from N] [--to N]
//!   brigctl check NAME [ARGS...]
//!   brigctl render KEY [name=value...]
//!
//! `audit-verify` walks the audit chain and reports the first row whose
//! recomputed hash diverges from the stored value. `check` and `render`
//! dry-run the whitelist and the broker without spawning anything.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use brig_audit::verify_chain;
use brig_broker::CommandBroker;
use brig_contracts::error::{BrigError, BrigResult};
use brig_store::Db;
use brig_whitelist::validate;

// ── CLI definition ────────────────────────────────────────────────────────────

/// BRIG — storage appliance privileged gateway, operator tools.
#[derive(Parser)]
#[command(
    name = "brigctl",
    about = "BRIG gateway operator tools",
    long_about = "Verifies the tamper-evident audit chain and dry-runs the\n\
                  command whitelist and broker without touching the system."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-verify the HMAC audit chain and report the first broken row.
    AuditVerify {
        /// SQLite database file.
        #[arg(long, default_value = "/var/lib/brig/brig.db")]
        db: PathBuf,
        /// HMAC signing key file (must already exist).
        #[arg(long, default_value = "/var/lib/brig/audit.key")]
        key: PathBuf,
        /// First audit row id to check.
        #[arg(long)]
        from: Option<i64>,
        /// Last audit row id to check.
        #[arg(long)]
        to: Option<i64>,
    },
    /// Dry-run a (name, args) pair against the command whitelist.
    Check {
        /// Symbolic command name, e.g. zpool_scrub.
        name: String,
        /// Raw argument list to validate.
        args: Vec<String>,
    },
    /// Dry-run the broker: render a command key plus name=value parameters.
    Render {
        /// Symbolic broker key, e.g. zpool_create.
        key: String,
        /// Parameters as name=value pairs.
        params: Vec<String>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::AuditVerify { db, key, from, to } => run_audit_verify(&db, &key, from, to),
        Command::Check { name, args } => run_check(&name, &args),
        Command::Render { key, params } => run_render(&key, &params),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("brigctl: {e}");
            ExitCode::FAILURE
        }
    }
}

// ── audit-verify ──────────────────────────────────────────────────────────────

fn run_audit_verify(
    db_path: &Path,
    key_path: &Path,
    from: Option<i64>,
    to: Option<i64>,
) -> BrigResult<ExitCode> {
    let key = read_key(key_path)?;
    let db = Db::open(db_path)?;

    let report = verify_chain(&db, &key, from, to)?;
    println!("{}", report.summary());

    if let (Some(id), Some(expected), Some(stored)) = (
        report.first_broken_id,
        report.expected_hash.as_deref(),
        report.stored_hash.as_deref(),
    ) {
        println!("first broken row: id={id}");
        println!("  expected hash: {expected}");
        println!("  stored hash:   {stored}");
    }

    Ok(if report.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Read the signing key without ever creating one: verification against a
/// freshly minted key would vacuously fail and confuse the operator.
fn read_key(path: &Path) -> BrigResult<Vec<u8>> {
    let data = std::fs::read(path).map_err(|e| BrigError::Config {
        reason: format!("reading audit key '{}': {e}", path.display()),
    })?;
    if data.len() != brig_audit::key::KEY_LEN {
        return Err(BrigError::Config {
            reason: format!(
                "audit key '{}' has wrong length {} (want {})",
                path.display(),
                data.len(),
                brig_audit::key::KEY_LEN
            ),
        });
    }
    Ok(data)
}

// ── check ─────────────────────────────────────────────────────────────────────

fn run_check(name: &str, args: &[String]) -> BrigResult<ExitCode> {
    match validate(name, args) {
        Ok(()) => {
            println!("allowed: {name} {}", args.join(" "));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("rejected: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

// ── render ────────────────────────────────────────────────────────────────────

fn run_render(key: &str, params: &[String]) -> BrigResult<ExitCode> {
    let mut map = HashMap::new();
    for pair in params {
        match pair.split_once('=') {
            Some((name, value)) => {
                map.insert(name.to_string(), value.to_string());
            }
            None => {
                return Err(BrigError::Validation {
                    reason: format!("parameter {pair:?} is not a name=value pair"),
                });
            }
        }
    }

    match CommandBroker::new().render(key, &map) {
        Ok(rendered) => {
            println!("{} {}", rendered.path, rendered.args.join(" "));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("rejected: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
