//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use supervisord_exporter::config::{render_config, Config, ConfigFormat};

/// Generates a configuration file populated with defaults.
///
/// An output path of `-` prints to stdout.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.unwrap_or_else(|| {
        PathBuf::from(match format {
            ConfigFormat::Yaml => "supervisord-exporter.yaml",
            ConfigFormat::Json => "supervisord-exporter.json",
            ConfigFormat::Toml => "supervisord-exporter.toml",
        })
    });

    let content = render_config(&Config::default(), format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}
