//! Variant expansion and explicit model building

use crate::attributes::build_model_attributes;
use crate::compiler::CompileOptions;
use crate::fragment::EngineFragment;
use crate::resolver::{build_hardware_config, merge_hardware_config, MergedHardware};
use crate::source::{
    ExplicitModelDef, FamilySource, ModelDef, SourceDefaults, VariantModelDef,
};
use deployconf_types::{
    DeployConfError, HardwareConfig, Model, ModelFamily, Quantization, Result, ThinkingCapability,
};
use indexmap::IndexMap;
use tracing::debug;

/// Built-in capability suffixes; other capabilities need an explicit table entry
pub const DEFAULT_CAPABILITY_SUFFIXES: [(&str, &str); 1] = [("base", "")];

/// Quantization used by explicit models that do not name one
pub const DEFAULT_EXPLICIT_QUANTIZATION: Quantization = Quantization::Fp8;

pub fn builtin_quant_suffix(quant: Quantization) -> &'static str {
    match quant {
        Quantization::Bf16 => "",
        Quantization::Fp8 => "-FP8",
        Quantization::Fp4 => "-FP4",
        Quantization::Int4 => "-INT4",
    }
}

pub fn builtin_capability_suffix(capability: &str) -> &'static str {
    DEFAULT_CAPABILITY_SUFFIXES
        .iter()
        .find(|(name, _)| *name == capability)
        .map(|(_, suffix)| *suffix)
        .unwrap_or("")
}

/// Expands the models of one source document
pub struct Expander<'a> {
    vendor_org: &'a str,
    defaults: &'a SourceDefaults,
    options: &'a CompileOptions,
}

impl<'a> Expander<'a> {
    pub fn new(vendor_org: &'a str, defaults: &'a SourceDefaults, options: &'a CompileOptions) -> Self {
        Self {
            vendor_org,
            defaults,
            options,
        }
    }

    /// Capability suffix. A model table replaces the family table whole;
    /// keys missing from the chosen table use the built-in suffix.
    pub fn capability_suffix<'s>(
        &self,
        family: &'s FamilySource,
        def: &'s VariantModelDef,
        capability: &str,
    ) -> &'s str {
        let key = self.options.conventions.capability_suffix_key;
        def.capability_suffixes(key)
            .or_else(|| family.capability_suffixes(key))
            .and_then(|table| table.get(capability))
            .map(String::as_str)
            .unwrap_or_else(|| builtin_capability_suffix(capability))
    }

    /// Quantization suffix, chosen the same way as the capability suffix
    pub fn quant_suffix<'s>(
        &self,
        family: &'s FamilySource,
        def: &'s VariantModelDef,
        quant: Quantization,
    ) -> &'s str {
        def.quant_suffix
            .as_ref()
            .or(family.quant_suffix.as_ref())
            .and_then(|table| table.get(&quant))
            .map(String::as_str)
            .unwrap_or_else(|| builtin_quant_suffix(quant))
    }

    fn default_model_path(&self, model_name: &str) -> String {
        format!("{}/{}", self.vendor_org, model_name)
    }

    fn hardware_for(
        &self,
        merged: &MergedHardware,
        hardware: &str,
        quant: Quantization,
        quant_override: Option<&EngineFragment>,
    ) -> Result<HardwareConfig> {
        build_hardware_config(
            &merged.fragment_for(hardware),
            &self.defaults.configurations,
            quant,
            quant_override,
            &self.options.layout,
        )
        .map_err(|e| DeployConfError::invalid_parameter(format!("hardware '{}': {}", hardware, e)))
    }

    /// Capability-major, quantization-minor product of a variant definition
    pub fn expand_variants(&self, family: &FamilySource, def: &VariantModelDef) -> Result<Vec<Model>> {
        let merged = merge_hardware_config(&self.defaults.hardware, &family.hardware, &def.hardware);
        let quantizations = def.quantizations();
        let mut models = Vec::new();

        for capability in def.capabilities() {
            for &quant in &quantizations {
                let name = format!(
                    "{}-{}{}{}",
                    family.name,
                    def.base_name,
                    self.capability_suffix(family, def, &capability),
                    self.quant_suffix(family, def, quant)
                );
                let model_path = def
                    .quantized_paths
                    .get(&quant)
                    .cloned()
                    .unwrap_or_else(|| self.default_model_path(&name));
                let quant_override = def.quant_override(quant, self.options.conventions.quant_override_key);

                let mut hardware = IndexMap::new();
                for hw in &merged.hardware_list {
                    if !merged.fragment_for(hw).accepts(quant) {
                        debug!(model = %name, hardware = %hw, quant = %quant, "hardware does not accept quantization, skipping");
                        continue;
                    }
                    let config = self
                        .hardware_for(&merged, hw, quant, quant_override)
                        .map_err(|e| DeployConfError::invalid_parameter(format!("model '{}': {}", name, e)))?;
                    hardware.insert(hw.clone(), config);
                }

                if hardware.is_empty() {
                    debug!(model = %name, "no hardware left after filtering, skipping variant");
                    continue;
                }

                let attributes = build_model_attributes(family, def, Some(capability.as_str()))
                    .into_llm_attributes(ThinkingCapability::NonThinking);
                let mut model = Model::new(name, model_path, attributes);
                model.hardware = hardware;
                models.push(model);
            }
        }

        Ok(models)
    }

    /// A single model with one quantization across every hardware target
    pub fn build_explicit_model(&self, family: &FamilySource, def: &ExplicitModelDef) -> Result<Model> {
        let merged = merge_hardware_config(&self.defaults.hardware, &family.hardware, &def.hardware);
        let quant = def.quantization.unwrap_or(DEFAULT_EXPLICIT_QUANTIZATION);
        let model_path = def
            .model_path
            .clone()
            .unwrap_or_else(|| self.default_model_path(&def.name));

        let mut hardware = IndexMap::new();
        for hw in &merged.hardware_list {
            let config = self
                .hardware_for(&merged, hw, quant, None)
                .map_err(|e| DeployConfError::invalid_parameter(format!("model '{}': {}", def.name, e)))?;
            hardware.insert(hw.clone(), config);
        }

        let attributes = build_model_attributes(family, def, None)
            .into_llm_attributes(ThinkingCapability::NonThinking);
        let mut model = Model::new(def.name.clone(), model_path, attributes);
        model.hardware = hardware;
        Ok(model)
    }

    pub fn build_family(&self, family: &FamilySource) -> Result<ModelFamily> {
        let mut models = Vec::new();
        for def in &family.models {
            match def {
                ModelDef::Variant(variant) => {
                    let expanded = self.expand_variants(family, variant)?;
                    debug!(family = %family.name, base_name = %variant.base_name, count = expanded.len(), "expanded variants");
                    models.extend(expanded);
                }
                ModelDef::Explicit(explicit) => models.push(self.build_explicit_model(family, explicit)?),
                ModelDef::ByName(name) => {
                    models.push(self.build_explicit_model(family, &ExplicitModelDef::named(name.clone()))?)
                }
            }
        }

        Ok(ModelFamily {
            name: family.name.clone(),
            description: family.description.clone(),
            models,
        })
    }
}
