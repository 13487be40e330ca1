//! deployconf - compile, check and inspect deployment configurations

use clap::{Parser, Subcommand};
use deployconf_cli::{
    commands::*,
    config::CliConfig,
    output::{print_error, OutputFormat},
    utils::setup_logging,
};
use std::process;

#[derive(Parser)]
#[command(name = "deployconf")]
#[command(about = "Deployment configuration compiler")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Expands compact model-family sources into resolved deployment configurations, \
                  compiles optimal configs to JSON, and validates the results"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "deployconf.toml")]
    config: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile model-family sources into resolved documents
    Compile(CompileCommand),

    /// Compile optimal-config sources to JSON
    Optimal(OptimalCommand),

    /// Validate resolved documents
    Validate(ValidateCommand),

    /// Summarize changes between two resolved documents
    Diff(DiffCommand),

    /// Show, validate or generate the CLI configuration
    Config(ConfigCommand),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbose, cli.quiet) {
        print_error(&e.to_string());
        process::exit(1);
    }

    let config = match CliConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            print_error(&e.to_string());
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Compile(cmd) => compile::execute(cmd, config, cli.format),
        Commands::Optimal(cmd) => optimal::execute(cmd, config, cli.format),
        Commands::Validate(cmd) => validate::execute(cmd, config, cli.format),
        Commands::Diff(cmd) => diff::execute(cmd, config, cli.format),
        Commands::Config(cmd) => config_cmd::execute(cmd, config, cli.format),
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        process::exit(1);
    }
}
