//! Batch compilation over a source directory, with a check mode that
//! reports drift without writing

use crate::compiler::{compile_config, CompileOptions};
use crate::io::{load_yaml, render_yaml, write_atomic};
use crate::source::SourceDocument;
use crate::vendors::VendorRegistry;
use deployconf_types::{DeployConfError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Turns one source file into the text of one output file
pub trait DocumentCompiler {
    /// Output location for a source path relative to the input directory
    fn output_path(&self, output_dir: &Path, relative: &Path) -> PathBuf {
        output_dir.join(relative)
    }

    fn compile(&self, input: &Path) -> Result<String>;

    /// Compare parsed values, not bytes
    fn same_content(&self, rendered: &str, existing: &str) -> Result<bool>;
}

/// Which files to process and where to put them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Explicit inputs; empty means discover under `input_dir`
    pub files: Vec<PathBuf>,
    pub check: bool,
}

impl BatchJob {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            files: Vec::new(),
            check: false,
        }
    }

    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    pub fn check_only(mut self, check: bool) -> Self {
        self.check = check;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Written,
    UpToDate,
    Stale,
    MissingOutput,
    Failed(String),
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written | Self::UpToDate)
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written => f.write_str("written"),
            Self::UpToDate => f.write_str("up to date"),
            Self::Stale => f.write_str("out of date"),
            Self::MissingOutput => f.write_str("does not exist"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub results: Vec<FileResult>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
        self.results.iter().filter(|r| !r.outcome.is_success())
    }

    pub fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// `*.yaml` directly under `dir` and one directory level down, sorted
pub fn discover_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DeployConfError::not_found(format!(
            "input directory {} does not exist",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if is_yaml(&path) {
            files.push(path);
        }
    }
    files.sort();

    subdirs.sort();
    for sub in subdirs {
        let mut nested: Vec<PathBuf> = fs::read_dir(&sub)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_yaml(p))
            .collect();
        nested.sort();
        files.extend(nested);
    }

    Ok(files)
}

fn is_yaml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "yaml")
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    match path.strip_prefix(base) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| path.to_path_buf()),
    }
}

/// Compile every input. One file failing never stops the others; the
/// report carries every outcome. Finding no input at all is an error.
pub fn run_batch<C: DocumentCompiler>(compiler: &C, job: &BatchJob) -> Result<BatchReport> {
    let inputs = if job.files.is_empty() {
        discover_files(&job.input_dir)?
    } else {
        job.files.clone()
    };
    if inputs.is_empty() {
        return Err(DeployConfError::not_found(format!(
            "No YAML files found in {}",
            job.input_dir.display()
        )));
    }

    let mut report = BatchReport::default();
    for input in inputs {
        let output = compiler.output_path(&job.output_dir, &relative_to(&input, &job.input_dir));
        let outcome = process_file(compiler, &input, &output, job.check);
        match &outcome {
            FileOutcome::Failed(reason) => {
                error!(input = %input.display(), "{}", reason)
            }
            other => info!(input = %input.display(), output = %output.display(), "{}", other),
        }
        report.results.push(FileResult {
            input,
            output,
            outcome,
        });
    }
    Ok(report)
}

fn process_file<C: DocumentCompiler>(compiler: &C, input: &Path, output: &Path, check: bool) -> FileOutcome {
    let rendered = match compiler.compile(input) {
        Ok(text) => text,
        Err(e) => return FileOutcome::Failed(e.to_string()),
    };

    if !check {
        return match write_atomic(output, &rendered) {
            Ok(()) => FileOutcome::Written,
            Err(e) => FileOutcome::Failed(e.to_string()),
        };
    }

    if !output.exists() {
        return FileOutcome::MissingOutput;
    }
    let existing = match fs::read_to_string(output) {
        Ok(text) => text,
        Err(e) => return FileOutcome::Failed(format!("Could not read {}: {}", output.display(), e)),
    };
    match compiler.same_content(&rendered, &existing) {
        Ok(true) => FileOutcome::UpToDate,
        Ok(false) => FileOutcome::Stale,
        Err(e) => FileOutcome::Failed(format!("Could not read {}: {}", output.display(), e)),
    }
}

/// Source documents to resolved YAML documents
#[derive(Debug, Clone, Default)]
pub struct ModelCompiler {
    pub vendors: VendorRegistry,
    pub options: CompileOptions,
}

impl ModelCompiler {
    pub fn new(vendors: VendorRegistry, options: CompileOptions) -> Self {
        Self { vendors, options }
    }
}

impl DocumentCompiler for ModelCompiler {
    fn compile(&self, input: &Path) -> Result<String> {
        let source: SourceDocument = load_yaml(input)?;
        let document = compile_config(&source, &self.vendors, &self.options)?;
        render_yaml(&document)
    }

    fn same_content(&self, rendered: &str, existing: &str) -> Result<bool> {
        let fresh: serde_yaml::Value = serde_yaml::from_str(rendered)?;
        let current: serde_yaml::Value = serde_yaml::from_str(existing)?;
        Ok(fresh == current)
    }
}
