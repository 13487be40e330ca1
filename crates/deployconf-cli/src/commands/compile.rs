//! Compile model-family sources into resolved documents

use crate::config::{CliConfig, LayoutKind};
use crate::output::{print_batch_report, print_info, OutputFormat};
use clap::Args;
use deployconf_compiler::{run_batch, BatchJob, ModelCompiler, VendorRegistry};
use deployconf_types::Result;
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug)]
pub struct CompileCommand {
    /// Source directory [default: models.input_dir]
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output directory [default: models.output_dir]
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Vendor registry file [default: vendors.yaml next to the input directory]
    #[arg(long)]
    pub vendors_file: Option<PathBuf>,

    /// Compare against existing output without writing
    #[arg(long)]
    pub check: bool,

    /// Hardware nesting of the output
    #[arg(long, value_enum)]
    pub layout: Option<LayoutKind>,

    /// Version key for the versioned layout
    #[arg(long)]
    pub runtime_version: Option<String>,

    /// Compile only these files instead of the whole input directory
    pub files: Vec<PathBuf>,
}

pub fn execute(cmd: CompileCommand, config: CliConfig, format: OutputFormat) -> Result<()> {
    let input_dir = cmd.input_dir.unwrap_or_else(|| config.models.input_dir.clone());
    let output_dir = cmd.output_dir.unwrap_or_else(|| config.models.output_dir.clone());
    let vendors_file = cmd
        .vendors_file
        .unwrap_or_else(|| config.vendors_file(&input_dir));

    let options = config.compile_options(cmd.layout, cmd.runtime_version.as_deref())?;
    let vendors = VendorRegistry::load(&vendors_file)?;
    debug!(vendors = vendors.len(), layout = ?options.layout, "compile options");

    if format == OutputFormat::Pretty {
        let verb = if cmd.check { "Checking" } else { "Compiling" };
        print_info(&format!(
            "{} {} -> {}",
            verb,
            input_dir.display(),
            output_dir.display()
        ));
    }

    let job = BatchJob::new(input_dir, output_dir)
        .with_files(cmd.files)
        .check_only(cmd.check);
    let report = run_batch(&ModelCompiler::new(vendors, options), &job)?;

    print_batch_report(&report, format)?;
    super::batch_result(&report, cmd.check)
}
