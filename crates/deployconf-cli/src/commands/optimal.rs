//! Compile optimal-config YAML sources to JSON

use crate::config::CliConfig;
use crate::output::{print_batch_report, print_info, OutputFormat};
use clap::Args;
use deployconf_compiler::{run_batch, BatchJob, OptimalCompiler};
use deployconf_types::Result;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct OptimalCommand {
    /// Source directory [default: optimal.input_dir]
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output directory [default: optimal.output_dir]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Compare against existing output without writing
    #[arg(long)]
    pub check: bool,

    /// Version recorded when the parent directory is not a version folder
    #[arg(long)]
    pub fallback_version: Option<String>,

    /// Compile only these files instead of the whole input directory
    pub files: Vec<PathBuf>,
}

pub fn execute(cmd: OptimalCommand, config: CliConfig, format: OutputFormat) -> Result<()> {
    let input_dir = cmd.input_dir.unwrap_or(config.optimal.input_dir);
    let output_dir = cmd.output_dir.unwrap_or(config.optimal.output_dir);
    let compiler =
        OptimalCompiler::new(cmd.fallback_version.unwrap_or(config.optimal.fallback_version));

    if format == OutputFormat::Pretty {
        print_info(&format!(
            "{} {} -> {}",
            if cmd.check { "Checking" } else { "Compiling" },
            input_dir.display(),
            output_dir.display()
        ));
    }

    let job = BatchJob::new(input_dir, output_dir)
        .with_files(cmd.files)
        .check_only(cmd.check);
    let report = run_batch(&compiler, &job)?;

    print_batch_report(&report, format)?;
    super::batch_result(&report, cmd.check)
}
