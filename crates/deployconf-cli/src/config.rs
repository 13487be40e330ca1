//! CLI configuration management
//!
//! Handles loading and parsing of the `deployconf.toml` file. Every section
//! and field is optional; anything missing takes the built-in default.

use clap::ValueEnum;
use deployconf_compiler::{
    optimal::DEFAULT_FALLBACK_VERSION, CapabilitySuffixKey, CompileOptions, QuantOverrideKey,
    SchemaLayout, SourceConventions, VendorRegistry,
};
use deployconf_types::{DeployConfError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Model-family sources and resolved documents
    pub models: ModelsConfig,

    /// Optimal-config sources and JSON output
    pub optimal: OptimalConfig,

    /// Shape of the resolved documents and source conventions
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Vendor registry; defaults to `vendors.yaml` next to `input_dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendors_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimalConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Version recorded when the parent directory is not a version folder
    pub fallback_version: String,
}

/// Resolved-document hardware nesting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Flat,
    Versioned,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    pub layout: LayoutKind,
    /// Version key used by the versioned layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    pub capability_suffix_key: CapabilitySuffixKey,
    pub quant_override_key: QuantOverrideKey,
}

impl CliConfig {
    /// Load configuration from file. A missing file gives the defaults and
    /// is not created.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DeployConfError::io(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            DeployConfError::config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_toml()?)
            .map_err(|e| DeployConfError::io(format!("Failed to write config file: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DeployConfError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.schema.layout == LayoutKind::Versioned
            && self
                .schema
                .runtime_version
                .as_deref()
                .map_or(true, |v| v.trim().is_empty())
        {
            return Err(DeployConfError::config(
                "schema.runtime_version is required when schema.layout is 'versioned'",
            ));
        }

        if self.models.input_dir == self.models.output_dir {
            return Err(DeployConfError::config(format!(
                "models.input_dir and models.output_dir are both {}",
                self.models.input_dir.display()
            )));
        }

        if self.optimal.input_dir == self.optimal.output_dir {
            return Err(DeployConfError::config(format!(
                "optimal.input_dir and optimal.output_dir are both {}",
                self.optimal.input_dir.display()
            )));
        }

        if self.optimal.fallback_version.trim().is_empty() {
            return Err(DeployConfError::config(
                "optimal.fallback_version cannot be empty",
            ));
        }

        Ok(())
    }

    pub fn vendors_file(&self, input_dir: &Path) -> PathBuf {
        self.models
            .vendors_file
            .clone()
            .unwrap_or_else(|| VendorRegistry::default_path(input_dir))
    }

    /// Compile options for this configuration, with command-line overrides
    pub fn compile_options(
        &self,
        layout: Option<LayoutKind>,
        runtime_version: Option<&str>,
    ) -> Result<CompileOptions> {
        let layout = match layout.unwrap_or(self.schema.layout) {
            LayoutKind::Flat => SchemaLayout::Flat,
            LayoutKind::Versioned => {
                let version = runtime_version
                    .or(self.schema.runtime_version.as_deref())
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| {
                        DeployConfError::config(
                            "the versioned layout needs a runtime version (--runtime-version or schema.runtime_version)",
                        )
                    })?;
                SchemaLayout::Versioned(version.to_string())
            }
        };

        Ok(CompileOptions {
            layout,
            conventions: SourceConventions {
                capability_suffix_key: self.schema.capability_suffix_key,
                quant_override_key: self.schema.quant_override_key,
            },
        })
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/models/src"),
            output_dir: PathBuf::from("data/models/generated"),
            vendors_file: None,
        }
    }
}

impl Default for OptimalConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/optimal-configs/src"),
            output_dir: PathBuf::from("data/optimal-configs/generated"),
            fallback_version: DEFAULT_FALLBACK_VERSION.to_string(),
        }
    }
}
