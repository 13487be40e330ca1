//! Validate resolved documents

use crate::config::CliConfig;
use crate::output::{print_rows, print_success, print_warning, OutputFormat};
use clap::Args;
use colored::*;
use deployconf_editor::{list_vendor_files, load_document};
use deployconf_types::{validate_document, DeployConfError, Result, Severity};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,

    /// Directory searched when no files are given [default: models.output_dir]
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Documents to validate
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FileValidation {
    file: String,
    errors: Vec<String>,
    warnings: Vec<String>,
    ok: bool,
}

pub fn execute(cmd: ValidateCommand, config: CliConfig, format: OutputFormat) -> Result<()> {
    let files = if cmd.files.is_empty() {
        let dir = cmd.dir.unwrap_or(config.models.output_dir);
        let found = list_vendor_files(&dir)?;
        if found.is_empty() {
            return Err(DeployConfError::not_found(format!(
                "No YAML files found in {}",
                dir.display()
            )));
        }
        found
    } else {
        cmd.files
    };

    let results: Vec<FileValidation> = files
        .iter()
        .map(|file| {
            let (errors, warnings) = match load_document(file) {
                Ok(document) => {
                    let report = validate_document(&document);
                    (
                        report.messages(Severity::Error),
                        report.messages(Severity::Warning),
                    )
                }
                Err(e) => (vec![e.to_string()], Vec::new()),
            };
            let ok = errors.is_empty() && (!cmd.strict || warnings.is_empty());
            FileValidation {
                file: file.display().to_string(),
                errors,
                warnings,
                ok,
            }
        })
        .collect();

    if format == OutputFormat::Pretty {
        for result in &results {
            if result.ok {
                print_success(&result.file);
            } else {
                println!("{} {}", "✗".red(), result.file.red());
            }
            for error in &result.errors {
                println!("    {} {}", "error:".red(), error);
            }
            for warning in &result.warnings {
                print_warning(&format!("{}: {}", result.file, warning));
            }
        }
    } else {
        print_rows(&results, format)?;
    }

    let failed: Vec<String> = results
        .iter()
        .filter(|r| !r.ok)
        .map(|r| format!("{} is invalid", r.file))
        .collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(DeployConfError::validation(failed))
    }
}
