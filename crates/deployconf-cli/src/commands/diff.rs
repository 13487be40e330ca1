//! Summarize the changes between two resolved documents

use crate::config::CliConfig;
use crate::output::{print_info, print_output, OutputFormat};
use clap::Args;
use colored::*;
use deployconf_editor::{generate_change_summary, load_document, load_raw_document};
use deployconf_types::Result;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DiffCommand {
    /// Document before the change
    pub original: PathBuf,

    /// Document after the change
    pub current: PathBuf,
}

pub fn execute(cmd: DiffCommand, _config: CliConfig, format: OutputFormat) -> Result<()> {
    let original = load_raw_document(&cmd.original)?;
    let current = load_document(&cmd.current)?;
    let summary = generate_change_summary(Some(&original), &current, &cmd.current);

    if format != OutputFormat::Pretty {
        return print_output(&summary, format);
    }

    if !summary.has_changes() {
        print_info("No changes");
        return Ok(());
    }

    let sections = [
        ("Added", &summary.added, "+".green()),
        ("Modified", &summary.modified, "~".yellow()),
        ("Removed", &summary.removed, "-".red()),
    ];
    for (title, lines, marker) in sections {
        if lines.is_empty() {
            continue;
        }
        println!("{}:", title.bold());
        for line in lines {
            println!("  {} {}", marker, line);
        }
    }
    Ok(())
}
