//! Configuration command implementation

use crate::config::CliConfig;
use crate::output::{print_output, print_success, OutputFormat};
use clap::Args;
use colored::*;
use deployconf_types::{DeployConfError, Result};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Show current configuration
    #[arg(short, long)]
    pub show: bool,

    /// Validate configuration (long form only; `-v` is the global verbose flag)
    #[arg(long)]
    pub validate: bool,

    /// Generate default configuration
    #[arg(long)]
    pub generate: bool,

    /// Output file for generated config
    #[arg(short, long)]
    pub output: Option<String>,

    /// Overwrite an existing file when generating
    #[arg(long)]
    pub force: bool,
}

pub fn execute(cmd: ConfigCommand, config: CliConfig, format: OutputFormat) -> Result<()> {
    if cmd.generate {
        return generate_config(cmd.output.as_deref(), cmd.force);
    }

    if cmd.validate {
        return validate_config(&config);
    }

    // Default: show config
    show_config(&config, format)
}

fn show_config(config: &CliConfig, format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Pretty {
        return print_output(config, format);
    }

    let layout = match &config.schema.runtime_version {
        Some(version) => format!("{:?} ({})", config.schema.layout, version),
        None => format!("{:?}", config.schema.layout),
    };

    println!("Models:");
    println!("  Input: {}", config.models.input_dir.display().to_string().cyan());
    println!("  Output: {}", config.models.output_dir.display().to_string().cyan());
    println!(
        "  Vendors: {}",
        config
            .vendors_file(&config.models.input_dir)
            .display()
            .to_string()
            .cyan()
    );

    println!("Optimal configs:");
    println!("  Input: {}", config.optimal.input_dir.display().to_string().cyan());
    println!("  Output: {}", config.optimal.output_dir.display().to_string().cyan());
    println!("  Fallback version: {}", config.optimal.fallback_version.cyan());

    println!("Schema:");
    println!("  Layout: {}", layout.to_lowercase().cyan());
    println!(
        "  Capability suffix key: {}",
        format!("{:?}", config.schema.capability_suffix_key).cyan()
    );
    println!(
        "  Quant override key: {}",
        format!("{:?}", config.schema.quant_override_key).cyan()
    );

    Ok(())
}

fn validate_config(config: &CliConfig) -> Result<()> {
    config.validate()?;
    print_success("Configuration is valid");
    Ok(())
}

fn generate_config(output_path: Option<&str>, force: bool) -> Result<()> {
    let output_path = output_path.unwrap_or("deployconf.toml");
    if Path::new(output_path).exists() && !force {
        return Err(DeployConfError::already_exists(format!(
            "{} already exists (use --force to overwrite)",
            output_path
        )));
    }

    CliConfig::default().save(output_path)?;
    print_success(&format!("Wrote default configuration to {}", output_path));
    Ok(())
}
