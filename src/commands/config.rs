//! Config command implementation.
//!
//! Prints or writes the effective configuration in various formats.

use std::fs;
use std::path::PathBuf;

use hostmetrics::Config;

use crate::cli::ConfigFormat;

/// Renders `config` and writes it to `output`, or stdout when absent or "-".
pub fn command_config(
    config: &Config,
    output: Option<PathBuf>,
    format: ConfigFormat,
) -> anyhow::Result<()> {
    let content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)? + "\n",
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };

    match output {
        Some(path) if path.to_string_lossy() != "-" => {
            fs::write(&path, content)?;
            println!("✅ Configuration written to: {}", path.display());
        }
        _ => print!("{}", content),
    }

    Ok(())
}
