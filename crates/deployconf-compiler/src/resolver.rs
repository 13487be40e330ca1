//! Hierarchical merge resolver
//!
//! Precedence, lowest to highest:
//! file per-hardware default, family `default`, family hardware,
//! model `default`, model hardware. Quantization overrides are applied last,
//! on the built engine block.

use crate::fragment::{fold, merge, EngineFragment, HardwareFragment, Patch};
use crate::source::{ConfigTemplate, HardwareDefaults, HardwareSection};
use deployconf_types::{
    ConfigAttributes, DeployConfError, EngineConfig, HardwareConfig, NamedConfiguration, Nodes,
    Optimization, Quantization, Result,
};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// Tensor parallelism used when no level sets `tp`
pub const DEFAULT_TP: u32 = 8;

/// Hardware nesting of the resolved document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SchemaLayout {
    /// `hardware.<hw>.configurations`
    #[default]
    Flat,
    /// `hardware.<hw>.versions.<version>.configurations`
    Versioned(String),
}

/// Result of merging the hardware blocks of every level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedHardware {
    /// Family `default` under model `default`
    pub default: HardwareFragment,
    /// Fully merged fragment for every hardware name seen at any level
    pub by_hardware: IndexMap<String, HardwareFragment>,
    /// Hardware targets to generate, in order
    pub hardware_list: Vec<String>,
}

impl MergedHardware {
    /// Effective fragment for one target
    pub fn fragment_for(&self, hardware: &str) -> HardwareFragment {
        match self.by_hardware.get(hardware) {
            Some(specific) => merge(self.default.clone(), specific.clone()),
            None => self.default.clone(),
        }
    }
}

/// Merge file, family and model hardware blocks and choose the hardware list
pub fn merge_hardware_config(
    defaults: &HardwareDefaults,
    family: &HardwareSection,
    model: &HardwareSection,
) -> MergedHardware {
    let family_default = family.default_fragment().cloned().unwrap_or_default();
    let model_default = model.default_fragment().cloned().unwrap_or_default();
    let default_names = defaults.names();

    let mut all_names: IndexSet<&str> = default_names.iter().copied().collect();
    all_names.extend(family.explicit_names());
    all_names.extend(model.explicit_names());

    let by_hardware = all_names
        .iter()
        .map(|hw| {
            let levels = [
                defaults.fragment(hw).cloned().unwrap_or_default(),
                family_default.clone(),
                family.get(hw).cloned().unwrap_or_default(),
                model_default.clone(),
                model.get(hw).cloned().unwrap_or_default(),
            ];
            (hw.to_string(), fold(levels))
        })
        .collect();

    let model_explicit: Vec<&str> = model.explicit_names().collect();
    let family_explicit: Vec<&str> = family.explicit_names().collect();

    let hardware_list: Vec<String> = if !model_explicit.is_empty() {
        debug!(hardware = ?model_explicit, "model narrows hardware list");
        model_explicit.iter().map(|s| s.to_string()).collect()
    } else if !family_explicit.is_empty() && !family.has_default() && !model.has_default() {
        debug!(hardware = ?family_explicit, "family narrows hardware list");
        family_explicit.iter().map(|s| s.to_string()).collect()
    } else {
        default_names.iter().map(|s| s.to_string()).collect()
    };

    MergedHardware {
        default: merge(family_default, model_default),
        by_hardware,
        hardware_list,
    }
}

/// Build the engine block: hardware over template, then the quantization
/// override on top
pub fn build_engine_config(
    hardware: &HardwareFragment,
    template: &ConfigTemplate,
    quant_override: Option<&EngineFragment>,
) -> Result<EngineConfig> {
    let mut layers = vec![template.engine_fragment(), hardware.engine()];
    if let Some(overrides) = quant_override {
        layers.push(overrides.clone());
    }
    let fragment: EngineFragment = fold(layers);

    let tp = match fragment.tp {
        Patch::Set(tp) => tp,
        Patch::Absent => DEFAULT_TP,
        Patch::Null => {
            return Err(DeployConfError::invalid_parameter(
                "'tp' is null; it must be an integer >= 1",
            ))
        }
    };

    let engine = EngineConfig {
        env_vars: fragment.env_vars.into_option().unwrap_or_default(),
        tp,
        dp: fragment.dp.into_option(),
        ep: fragment.ep.into_option(),
        enable_dp_attention: fragment.enable_dp_attention.into_option(),
        extra_args: fragment.extra_args.into_option().unwrap_or_default(),
    };
    engine.validate()?;
    Ok(engine)
}

/// One named configuration with a unified engine
pub fn build_named_configuration(
    template: &ConfigTemplate,
    hardware: &HardwareFragment,
    quant: Quantization,
    quant_override: Option<&EngineFragment>,
) -> Result<NamedConfiguration> {
    let engine = build_engine_config(hardware, template, quant_override).map_err(|e| {
        DeployConfError::invalid_parameter(format!("configuration '{}': {}", template.name, e))
    })?;
    let attributes = ConfigAttributes::new(
        template.nodes.unwrap_or(Nodes::Single),
        template.optimization.unwrap_or(Optimization::Balanced),
        quant,
    );
    NamedConfiguration::unified(template.name.clone(), attributes, engine)
}

/// Every template rendered for one hardware target
pub fn build_hardware_config(
    hardware: &HardwareFragment,
    templates: &[ConfigTemplate],
    quant: Quantization,
    quant_override: Option<&EngineFragment>,
    layout: &SchemaLayout,
) -> Result<HardwareConfig> {
    let configurations = templates
        .iter()
        .map(|template| build_named_configuration(template, hardware, quant, quant_override))
        .collect::<Result<Vec<_>>>()?;

    Ok(match layout {
        SchemaLayout::Flat => HardwareConfig::flat(configurations),
        SchemaLayout::Versioned(version) => HardwareConfig::versioned(version.clone(), configurations),
    })
}
