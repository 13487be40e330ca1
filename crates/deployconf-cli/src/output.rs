//! Output formatting utilities

use colored::*;
use deployconf_compiler::{BatchReport, FileOutcome};
use deployconf_types::{DeployConfError, Result};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Yaml,
    Toml,
}

/// Output formatter trait
pub trait OutputFormatter {
    fn format<T: Serialize>(&self, data: &T, format: OutputFormat) -> Result<String>;
}

/// Default output formatter
pub struct DefaultFormatter;

impl OutputFormatter for DefaultFormatter {
    fn format<T: Serialize>(&self, data: &T, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| {
                DeployConfError::serialization(format!("YAML serialization failed: {}", e))
            }),
            OutputFormat::Toml => toml::to_string_pretty(data).map_err(|e| {
                DeployConfError::serialization(format!("TOML serialization failed: {}", e))
            }),
            // Pretty falls back to JSON for structured data
            OutputFormat::Json | OutputFormat::Pretty => serde_json::to_string_pretty(data)
                .map_err(|e| {
                    DeployConfError::serialization(format!("JSON serialization failed: {}", e))
                }),
        }
    }
}

/// Print formatted output
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    let output = DefaultFormatter.format(data, format)?;
    println!("{}", output.trim_end());
    Ok(())
}

/// Print error with formatting
pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Print warning with formatting
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message.green());
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print a list of per-file records. TOML has no top-level arrays, so
/// there the list goes under a `files` key.
pub fn print_rows<T: Serialize>(rows: &[T], format: OutputFormat) -> Result<()> {
    #[derive(Serialize)]
    struct Files<'a, T> {
        files: &'a [T],
    }

    match format {
        OutputFormat::Toml => print_output(&Files { files: rows }, format),
        _ => print_output(&rows, format),
    }
}

/// One line of a batch report, for structured output
#[derive(Debug, Clone, Serialize)]
pub struct FileRow {
    pub input: String,
    pub output: String,
    pub status: String,
    pub ok: bool,
}

pub fn report_rows(report: &BatchReport) -> Vec<FileRow> {
    report
        .results
        .iter()
        .map(|r| FileRow {
            input: r.input.display().to_string(),
            output: r.output.display().to_string(),
            status: r.outcome.to_string(),
            ok: r.outcome.is_success(),
        })
        .collect()
}

/// Per-file lines followed by a one-line tally
pub fn print_batch_report(report: &BatchReport, format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Pretty {
        return print_rows(&report_rows(report), format);
    }

    for result in &report.results {
        let marker = match &result.outcome {
            FileOutcome::Written | FileOutcome::UpToDate => "✓".green(),
            FileOutcome::Stale | FileOutcome::MissingOutput => "✗".yellow(),
            FileOutcome::Failed(_) => "✗".red(),
        };
        let status = match &result.outcome {
            FileOutcome::Failed(_) => result.outcome.to_string().red(),
            FileOutcome::Stale | FileOutcome::MissingOutput => result.outcome.to_string().yellow(),
            _ => result.outcome.to_string().normal(),
        };
        println!(
            "  {} {} -> {} ({})",
            marker,
            result.input.display(),
            result.output.display().to_string().cyan(),
            status
        );
    }

    let written = report.count(|o| *o == FileOutcome::Written);
    let up_to_date = report.count(|o| *o == FileOutcome::UpToDate);
    let drift = report.count(|o| matches!(o, FileOutcome::Stale | FileOutcome::MissingOutput));
    let failed = report.count(|o| matches!(o, FileOutcome::Failed(_)));
    println!(
        "{} file(s): {} written, {} up to date, {} out of date, {} failed",
        report.results.len(),
        written,
        up_to_date,
        drift,
        failed
    );
    Ok(())
}
