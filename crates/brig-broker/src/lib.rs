//! # brig-broker
//!
//! The typed-parameter command broker: the single point through which a
//! symbolic command key plus named parameter values becomes a running
//! subprocess.
//!
//! ## Overview
//!
//! Each brokered command declares an ordered parameter specification —
//! `(name, type)` pairs drawn from the closed [`params::ParamType`] enum.
//! Execution renders every value through its type's validator into an
//! argv vector, re-validates the whole vector against the whitelist in
//! `brig-whitelist`, and only then spawns. No caller-supplied value is
//! ever concatenated into a shell string; there is no shell.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use brig_broker::CommandBroker;
//!
//! let broker = CommandBroker::new();
//! let mut params = HashMap::new();
//! params.insert("name".to_string(), "tank".to_string());
//! let out = broker.execute("zpool_scrub", &params)?;
//! ```

pub mod broker;
pub mod params;

pub use broker::{BrokerSpec, CommandBroker, RenderedCommand};
pub use params::{ParamSpec, ParamType};

// ── Tests ─────────────────────────────────────────────────────────────────────
