//! Operator tooling for KibraConnect.
//!
//! Backs the `kibra` binary: configuration loading and checkout replays.
//!
//! # Modules
//!
//! - [`config`] - CLI configuration with environment variable expansion
//! - [`replay`] - Replaying recorded browser events through a checkout

pub mod config;
pub mod replay;

pub use config::CliConfig;
pub use replay::{LoggingHooks, ReplayReport, parse_events, replay};
