//! CLI command implementations
//!
//! Each subcommand is a clap `Args` struct plus an `execute` function taking
//! the loaded configuration and the output format.

pub mod compile;
pub mod config_cmd;
pub mod diff;
pub mod optimal;
pub mod validate;

pub use compile::CompileCommand;
pub use config_cmd::ConfigCommand;
pub use diff::DiffCommand;
pub use optimal::OptimalCommand;
pub use validate::ValidateCommand;

use deployconf_compiler::{BatchReport, FileOutcome};
use deployconf_types::{DeployConfError, Result};

/// Turn an unsuccessful batch into an error naming every offending file
pub(crate) fn batch_result(report: &BatchReport, check: bool) -> Result<()> {
    if report.is_success() {
        return Ok(());
    }
    let problems: Vec<String> = report
        .failures()
        .map(|r| format!("{}: {}", r.input.display(), r.outcome))
        .collect();
    let stale = report.count(|o| matches!(o, FileOutcome::Stale | FileOutcome::MissingOutput));
    if check && stale == problems.len() {
        return Err(DeployConfError::validation(vec![format!(
            "{} file(s) out of date; re-run without --check to regenerate",
            stale
        )]));
    }
    Err(DeployConfError::validation(problems))
}
