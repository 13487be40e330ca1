//! In-memory edit session over one vendor document
//!
//! Every mutation runs against a snapshot: if the mutation fails, or leaves
//! the document with a validation error it did not have before, the
//! snapshot is restored and the error returned. Nothing touches disk until
//! `save`.

use crate::freeform::parse_configuration_yaml;
use crate::store::{load_document, load_raw_document, save_document};
use crate::summary::{generate_change_summary, ChangeSummary};
use deployconf_types::{
    validate_document, DeployConfError, HardwareConfig, Model, ModelAttributes, ModelFamily,
    NamedConfiguration, Result, ValidationReport, VendorConfig, VersionConfig,
};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Addresses one configuration list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigTarget {
    pub family: String,
    pub model: String,
    pub hardware: String,
    /// Runtime version, for the versioned layout only
    pub version: Option<String>,
}

impl ConfigTarget {
    pub fn new(family: impl Into<String>, model: impl Into<String>, hardware: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            model: model.into(),
            hardware: hardware.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl fmt::Display for ConfigTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.family, self.model, self.hardware)?;
        if let Some(version) = &self.version {
            write!(f, "/{}", version)?;
        }
        Ok(())
    }
}

pub struct EditSession {
    path: PathBuf,
    document: VendorConfig,
    /// Raw document as last read from or written to disk; None for a new file
    original: Option<Value>,
    /// Parsed form of `original`, for detecting unsaved edits
    baseline: Option<VendorConfig>,
}

fn family_mut<'a>(doc: &'a mut VendorConfig, family: &str) -> Result<&'a mut ModelFamily> {
    doc.family_mut(family)
        .ok_or_else(|| DeployConfError::not_found(format!("family '{}'", family)))
}

fn model_mut<'a>(doc: &'a mut VendorConfig, family: &str, model: &str) -> Result<&'a mut Model> {
    family_mut(doc, family)?
        .model_mut(model)
        .ok_or_else(|| DeployConfError::not_found(format!("model '{}/{}'", family, model)))
}

fn hardware_mut<'a>(
    doc: &'a mut VendorConfig,
    family: &str,
    model: &str,
    hardware: &str,
) -> Result<&'a mut HardwareConfig> {
    model_mut(doc, family, model)?
        .hardware
        .get_mut(hardware)
        .ok_or_else(|| {
            DeployConfError::not_found(format!("hardware '{}/{}/{}'", family, model, hardware))
        })
}

fn configurations_mut<'a>(
    doc: &'a mut VendorConfig,
    target: &ConfigTarget,
) -> Result<&'a mut Vec<NamedConfiguration>> {
    let hardware = hardware_mut(doc, &target.family, &target.model, &target.hardware)?;
    match (hardware.is_versioned(), &target.version) {
        (false, Some(_)) => Err(DeployConfError::invalid_parameter(format!(
            "'{}' has no runtime versions; address it without a version",
            target
        ))),
        (true, None) => Err(DeployConfError::invalid_parameter(format!(
            "'{}' is organised by runtime version; a version is required",
            target
        ))),
        _ => hardware
            .configurations_mut(target.version.as_deref())
            .ok_or_else(|| DeployConfError::not_found(format!("version in '{}'", target))),
    }
}

fn error_set(report: &ValidationReport) -> HashSet<String> {
    report.errors().map(ToString::to_string).collect()
}

impl EditSession {
    /// Session for a document that does not exist on disk yet
    pub fn new(path: impl Into<PathBuf>, vendor: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            document: VendorConfig::new(vendor),
            original: None,
            baseline: None,
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = load_document(&path)?;
        let original = load_raw_document(&path)?;
        info!(path = %path.display(), models = document.model_count(), "opened document");
        Ok(Self {
            path,
            baseline: Some(document.clone()),
            document,
            original: Some(original),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &VendorConfig {
        &self.document
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.baseline.as_ref() != Some(&self.document)
    }

    fn mutate<T>(&mut self, op: impl FnOnce(&mut VendorConfig) -> Result<T>) -> Result<T> {
        let snapshot = self.document.clone();
        let before = error_set(&validate_document(&snapshot));

        let value = match op(&mut self.document) {
            Ok(value) => value,
            Err(e) => {
                self.document = snapshot;
                return Err(e);
            }
        };

        let introduced: Vec<String> = validate_document(&self.document)
            .errors()
            .map(ToString::to_string)
            .filter(|message| !before.contains(message))
            .collect();
        if !introduced.is_empty() {
            debug!(count = introduced.len(), "edit rejected, restoring snapshot");
            self.document = snapshot;
            return Err(DeployConfError::validation(introduced));
        }
        Ok(value)
    }

    pub fn add_family(&mut self, name: &str, description: Option<String>) -> Result<()> {
        self.mutate(|doc| {
            if doc.family(name).is_some() {
                return Err(DeployConfError::already_exists(format!("family '{}'", name)));
            }
            let mut family = ModelFamily::new(name);
            family.description = description;
            doc.families.push(family);
            Ok(())
        })
    }

    pub fn remove_family(&mut self, name: &str) -> Result<ModelFamily> {
        self.mutate(|doc| {
            let index = doc
                .families
                .iter()
                .position(|f| f.name == name)
                .ok_or_else(|| DeployConfError::not_found(format!("family '{}'", name)))?;
            Ok(doc.families.remove(index))
        })
    }

    pub fn set_family_description(&mut self, family: &str, description: Option<String>) -> Result<()> {
        self.mutate(|doc| {
            family_mut(doc, family)?.description = description;
            Ok(())
        })
    }

    pub fn add_model(&mut self, family: &str, model: Model) -> Result<()> {
        self.mutate(|doc| {
            let target = family_mut(doc, family)?;
            if target.model(&model.name).is_some() {
                return Err(DeployConfError::already_exists(format!(
                    "model '{}/{}'",
                    family, model.name
                )));
            }
            target.models.push(model);
            Ok(())
        })
    }

    pub fn remove_model(&mut self, family: &str, model: &str) -> Result<Model> {
        self.mutate(|doc| {
            let target = family_mut(doc, family)?;
            let index = target
                .models
                .iter()
                .position(|m| m.name == model)
                .ok_or_else(|| DeployConfError::not_found(format!("model '{}/{}'", family, model)))?;
            Ok(target.models.remove(index))
        })
    }

    pub fn set_model_path(&mut self, family: &str, model: &str, model_path: &str) -> Result<()> {
        self.mutate(|doc| {
            model_mut(doc, family, model)?.model_path = model_path.to_string();
            Ok(())
        })
    }

    pub fn set_model_attributes(&mut self, family: &str, model: &str, attributes: ModelAttributes) -> Result<()> {
        self.mutate(|doc| {
            model_mut(doc, family, model)?.attributes = attributes;
            Ok(())
        })
    }

    /// Add an empty hardware entry, using the versioned layout when the
    /// model already does
    pub fn add_hardware(&mut self, family: &str, model: &str, hardware: &str) -> Result<()> {
        self.mutate(|doc| {
            let target = model_mut(doc, family, model)?;
            if target.hardware.contains_key(hardware) {
                return Err(DeployConfError::already_exists(format!(
                    "hardware '{}' for '{}'",
                    hardware, model
                )));
            }
            let versioned = target.hardware.values().any(HardwareConfig::is_versioned);
            let config = if versioned {
                HardwareConfig::Versioned {
                    versions: IndexMap::new(),
                }
            } else {
                HardwareConfig::flat(Vec::new())
            };
            target.hardware.insert(hardware.to_string(), config);
            Ok(())
        })
    }

    pub fn add_version(&mut self, family: &str, model: &str, hardware: &str, version: &str) -> Result<()> {
        self.mutate(|doc| match hardware_mut(doc, family, model, hardware)? {
            HardwareConfig::Flat { .. } => Err(DeployConfError::invalid_parameter(format!(
                "hardware '{}' for '{}' uses the flat layout",
                hardware, model
            ))),
            HardwareConfig::Versioned { versions } => {
                if versions.contains_key(version) {
                    return Err(DeployConfError::already_exists(format!("version '{}'", version)));
                }
                versions.insert(version.to_string(), VersionConfig::default());
                Ok(())
            }
        })
    }

    pub fn add_configuration(&mut self, target: &ConfigTarget, config: NamedConfiguration) -> Result<()> {
        self.mutate(|doc| {
            let configs = configurations_mut(doc, target)?;
            if configs.iter().any(|c| c.name == config.name) {
                return Err(DeployConfError::already_exists(format!(
                    "configuration '{}' in '{}'",
                    config.name, target
                )));
            }
            configs.push(config);
            Ok(())
        })
    }

    /// Replace the configuration called `name`; the replacement may rename it
    pub fn replace_configuration(
        &mut self,
        target: &ConfigTarget,
        name: &str,
        config: NamedConfiguration,
    ) -> Result<()> {
        self.mutate(|doc| {
            let configs = configurations_mut(doc, target)?;
            let slot = configs
                .iter_mut()
                .find(|c| c.name == name)
                .ok_or_else(|| {
                    DeployConfError::not_found(format!("configuration '{}' in '{}'", name, target))
                })?;
            *slot = config;
            Ok(())
        })
    }

    pub fn remove_configuration(&mut self, target: &ConfigTarget, name: &str) -> Result<NamedConfiguration> {
        self.mutate(|doc| {
            let configs = configurations_mut(doc, target)?;
            let index = configs.iter().position(|c| c.name == name).ok_or_else(|| {
                DeployConfError::not_found(format!("configuration '{}' in '{}'", name, target))
            })?;
            Ok(configs.remove(index))
        })
    }

    /// Parse edited YAML and replace the configuration with it. On any
    /// error the document is unchanged and the caller may offer a re-edit.
    pub fn replace_configuration_from_yaml(&mut self, target: &ConfigTarget, name: &str, text: &str) -> Result<()> {
        let config = parse_configuration_yaml(text)?;
        self.replace_configuration(target, name, config)
    }

    pub fn validate(&self) -> ValidationReport {
        validate_document(&self.document)
    }

    pub fn change_summary(&self) -> ChangeSummary {
        generate_change_summary(self.original.as_ref(), &self.document, &self.path)
    }

    /// Validate, then write the whole document at once. Returns what changed
    /// relative to the previous on-disk state.
    pub fn save(&mut self) -> Result<ChangeSummary> {
        let report = self.validate();
        for issue in report.warnings() {
            warn!("{}", issue);
        }
        report.into_result(false)?;

        let summary = self.change_summary();
        save_document(&self.document, &self.path)?;
        self.original = Some(serde_yaml::to_value(&self.document)?);
        self.baseline = Some(self.document.clone());
        info!(path = %self.path.display(), changes = summary.has_changes(), "saved");
        Ok(summary)
    }
}
