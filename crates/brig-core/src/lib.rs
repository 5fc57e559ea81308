//! # brig-core
//!
//! The BRIG gateway: the chokepoint through which every privileged
//! operation must pass before a subprocess is ever spawned.
//!
//! This crate provides:
//! - The four core traits (`SessionValidator`, `Authorizer`,
//!   `CommandRunner`, `AuditSink`)
//! - The [`Gateway`] that wires them together in the correct trust order
//! - [`GatewayConfig`], the TOML-loaded daemon configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brig_core::{Gateway, GatewayConfig, PrivilegedRequest};
//!
//! let config = GatewayConfig::from_file(Path::new("/etc/brig/brig.toml"))?;
//! let gateway = Gateway::from_config(&config)?;
//! let output = gateway.handle(&request)?;
//! ```

pub mod config;
pub mod gateway;
pub mod traits;

pub use config::GatewayConfig;
pub use gateway::{Gateway, PrivilegedRequest};
