//! Whole-document validation
//!
//! Construction already rejects malformed engines and configurations. The
//! checks here cover what only makes sense across the tree: empty names,
//! duplicate keys, and empty configuration lists.

use crate::schema::{HardwareConfig, VendorConfig};
use crate::{DeployConfError, Result};
use std::collections::HashSet;
use std::fmt;

/// How serious a validation finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// One finding, located by a `family/model/hardware[/version]` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub location: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

/// All findings for one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn push(&mut self, severity: Severity, location: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity,
            location: location.into(),
            message: message.into(),
        });
    }

    fn error(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, location, message);
    }

    fn warning(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, location, message);
    }

    /// No errors (warnings allowed)
    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.issues
            .iter()
            .filter(|i| i.severity == severity)
            .map(ToString::to_string)
            .collect()
    }

    /// Fail on errors; in strict mode warnings fail too
    pub fn into_result(self, strict: bool) -> Result<()> {
        let failing: Vec<String> = self
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Error || strict)
            .map(ToString::to_string)
            .collect();
        if failing.is_empty() {
            Ok(())
        } else {
            Err(DeployConfError::validation(failing))
        }
    }
}

/// Check a resolved document and collect every problem
pub fn validate_document(doc: &VendorConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if doc.vendor.trim().is_empty() {
        report.error("", "'vendor' must be a non-empty string");
    }

    let mut family_names = HashSet::new();
    for (fi, family) in doc.families.iter().enumerate() {
        let family_loc = if family.name.trim().is_empty() {
            report.error(format!("families[{}]", fi), "family 'name' must be non-empty");
            format!("families[{}]", fi)
        } else {
            family.name.clone()
        };
        if !family.name.is_empty() && !family_names.insert(family.name.as_str()) {
            report.error(&family_loc, format!("duplicate family name '{}'", family.name));
        }

        let mut model_names = HashSet::new();
        for (mi, model) in family.models.iter().enumerate() {
            let model_loc = if model.name.trim().is_empty() {
                report.error(
                    format!("{}/models[{}]", family_loc, mi),
                    "model 'name' must be non-empty",
                );
                format!("{}/models[{}]", family_loc, mi)
            } else {
                format!("{}/{}", family_loc, model.name)
            };
            if !model.name.is_empty() && !model_names.insert(model.name.as_str()) {
                report.error(&model_loc, format!("duplicate model name '{}'", model.name));
            }
            if model.model_path.trim().is_empty() {
                report.error(&model_loc, "'model_path' must be non-empty");
            }

            for (hw, hw_config) in &model.hardware {
                if hw.trim().is_empty() {
                    report.error(&model_loc, "hardware name must be non-empty");
                }
                check_hardware(&mut report, &model.name, &model_loc, hw, hw_config);
            }
        }
    }

    report
}

fn check_hardware(
    report: &mut ValidationReport,
    model_name: &str,
    model_loc: &str,
    hw: &str,
    hw_config: &HardwareConfig,
) {
    if let HardwareConfig::Versioned { versions } = hw_config {
        if versions.is_empty() {
            report.warning(format!("{}/{}", model_loc, hw), "no runtime versions defined");
        }
    }

    for (version, configs) in hw_config.configuration_lists() {
        let loc = match version {
            Some(v) => format!("{}/{}/{}", model_loc, hw, v),
            None => format!("{}/{}", model_loc, hw),
        };

        if configs.is_empty() {
            let target = match version {
                Some(v) => format!("{}/{}/{}", model_name, hw, v),
                None => format!("{}/{}", model_name, hw),
            };
            report.warning(&loc, format!("No configurations defined for {}", target));
            continue;
        }

        let mut seen = HashSet::new();
        for config in configs {
            if let Err(e) = config.validate() {
                report.error(&loc, format!("configuration '{}': {}", config.name, e));
                continue;
            }
            if !seen.insert(config.name.as_str()) {
                report.error(
                    &loc,
                    format!("duplicate configuration name '{}'", config.name),
                );
            }
        }
    }
}
