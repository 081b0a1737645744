//! Script-driven harness for the sharded document cache.
//!
//! Reads `ADD_SERVER` / `REMOVE_SERVER` / `GET` / `EDIT` / `STATUS` lines,
//! runs them against a coordinator and prints each node's responses.

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::{CliConfig, PartitionerKind};
