//! Change summary between the document as loaded from disk and the
//! in-memory document
//!
//! The original side is the raw YAML value, so a file that no longer
//! parses cleanly can still be compared. Nodes that fail to parse on the
//! original side count as modified.

use deployconf_types::{HardwareConfig, Model, ModelAttributes, NamedConfiguration, VendorConfig};
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub file: PathBuf,
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
}

impl ChangeSummary {
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty())
    }
}

fn items<'a>(node: Option<&'a Value>, key: &str) -> &'a [Value] {
    node.and_then(|n| n.get(key))
        .and_then(Value::as_sequence)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn by_name(items: &[Value]) -> IndexMap<&str, &Value> {
    items
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str).map(|name| (name, item)))
        .collect()
}

fn keyed<'a>(node: Option<&'a Value>, key: &str) -> IndexMap<&'a str, &'a Value> {
    node.and_then(|n| n.get(key))
        .and_then(Value::as_mapping)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| k.as_str().map(|k| (k, v)))
                .collect()
        })
        .unwrap_or_default()
}

fn str_field<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key).and_then(Value::as_str)
}

/// Compare `current` against the raw `original` (None for a new file)
pub fn generate_change_summary(
    original: Option<&Value>,
    current: &VendorConfig,
    file: &Path,
) -> ChangeSummary {
    let mut summary = ChangeSummary {
        file: file.to_path_buf(),
        ..ChangeSummary::default()
    };

    let Some(original) = original else {
        summarize_new_document(&mut summary, current);
        return summary;
    };

    let orig_families = by_name(items(Some(original), "families"));

    for family in &current.families {
        let Some(orig_family) = orig_families.get(family.name.as_str()) else {
            summary.added.push(format!("Family: {}", family.name));
            for model in &family.models {
                summary.added.push(format!("  Model: {}", model.name));
            }
            continue;
        };

        if family.description.as_deref() != str_field(orig_family, "description") {
            summary
                .modified
                .push(format!("Family '{}': description changed", family.name));
        }

        let orig_models = by_name(items(Some(*orig_family), "models"));
        for model in &family.models {
            match orig_models.get(model.name.as_str()) {
                None => summary
                    .added
                    .push(format!("Model: {} in {}", model.name, family.name)),
                Some(orig_model) => compare_model(&mut summary, model, orig_model),
            }
        }
        for name in orig_models.keys() {
            if family.model(name).is_none() {
                summary
                    .removed
                    .push(format!("Model: {} from {}", name, family.name));
            }
        }
    }

    for name in orig_families.keys() {
        if current.family(name).is_none() {
            summary.removed.push(format!("Family: {}", name));
        }
    }

    summary
}

fn summarize_new_document(summary: &mut ChangeSummary, current: &VendorConfig) {
    summary.added.push(format!("Vendor: {}", current.vendor));
    for family in &current.families {
        summary.added.push(format!("  Family: {}", family.name));
        for model in &family.models {
            summary.added.push(format!("    Model: {}", model.name));
            for (hw, config) in &model.hardware {
                for (version, configs) in config.configuration_lists() {
                    let target = match version {
                        Some(v) => format!("{}/{}", hw, v),
                        None => hw.clone(),
                    };
                    summary
                        .added
                        .push(format!("      {}: {} configuration(s)", target, configs.len()));
                }
            }
        }
    }
}

fn compare_model(summary: &mut ChangeSummary, model: &Model, orig: &Value) {
    if Some(model.model_path.as_str()) != str_field(orig, "model_path") {
        summary
            .modified
            .push(format!("Model '{}': model_path changed", model.name));
    }

    let orig_attrs = orig
        .get("attributes")
        .and_then(|v| serde_yaml::from_value::<ModelAttributes>(v.clone()).ok());
    if orig_attrs.as_ref() != Some(&model.attributes) {
        summary
            .modified
            .push(format!("Model '{}': attributes changed", model.name));
    }

    let orig_hw = keyed(Some(orig), "hardware");
    for (hw, config) in &model.hardware {
        let Some(orig_config) = orig_hw.get(hw.as_str()) else {
            summary
                .added
                .push(format!("Hardware: {} for {}", hw, model.name));
            continue;
        };
        compare_hardware(summary, &model.name, hw, config, orig_config);
    }
    for hw in orig_hw.keys() {
        if !model.hardware.contains_key(*hw) {
            summary
                .removed
                .push(format!("Hardware: {} from {}", hw, model.name));
        }
    }
}

fn compare_hardware(
    summary: &mut ChangeSummary,
    model: &str,
    hw: &str,
    config: &HardwareConfig,
    orig: &Value,
) {
    match config {
        HardwareConfig::Flat { configurations } => {
            let location = format!("{}/{}", model, hw);
            compare_configurations(summary, &location, configurations, items(Some(orig), "configurations"));
        }
        HardwareConfig::Versioned { versions } => {
            let orig_versions = keyed(Some(orig), "versions");
            for (version, version_config) in versions {
                match orig_versions.get(version.as_str()) {
                    None => summary
                        .added
                        .push(format!("Version: {} for {}/{}", version, model, hw)),
                    Some(orig_version) => {
                        let location = format!("{}/{}/{}", model, hw, version);
                        compare_configurations(
                            summary,
                            &location,
                            &version_config.configurations,
                            items(Some(*orig_version), "configurations"),
                        );
                    }
                }
            }
            for version in orig_versions.keys() {
                if !versions.contains_key(*version) {
                    summary
                        .removed
                        .push(format!("Version: {} from {}/{}", version, model, hw));
                }
            }
        }
    }
}

fn compare_configurations(
    summary: &mut ChangeSummary,
    location: &str,
    current: &[NamedConfiguration],
    orig: &[Value],
) {
    let orig_by_name = by_name(orig);

    for config in current {
        match orig_by_name.get(config.name.as_str()) {
            None => summary
                .added
                .push(format!("Config: {} in {}", config.name, location)),
            Some(orig_config) => {
                let unchanged = serde_yaml::from_value::<NamedConfiguration>((*orig_config).clone())
                    .map(|parsed| &parsed == config)
                    .unwrap_or(false);
                if !unchanged {
                    summary
                        .modified
                        .push(format!("Config: {} in {}", config.name, location));
                }
            }
        }
    }

    for name in orig_by_name.keys() {
        if !current.iter().any(|c| c.name == *name) {
            summary
                .removed
                .push(format!("Config: {} from {}", name, location));
        }
    }
}
