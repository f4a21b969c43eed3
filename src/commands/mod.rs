//! CLI command implementations for hostmetrics.
//!
//! This module provides implementations for all CLI subcommands:
//! - `read`: one snapshot per metric domain
//! - `check`: pipeline probing on the current host
//! - `config`: effective configuration output

pub mod check;
pub mod config;
pub mod read;

use serde::Serialize;

use crate::cli::OutputFormat;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use read::{
    command_cpu, command_environment, command_group, command_load, command_memory, command_network,
    command_process, command_storage, command_uptime,
};

/// Prints `value` to stdout in the requested format.
pub fn print_output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}
