//! Compact source document schema
//!
//! A source document names a vendor, file-level defaults (hardware targets
//! and configuration templates) and families whose models are either
//! explicit entries or variant definitions expanded by capability and
//! quantization.

use crate::fragment::{env_vars_patch, extra_args_patch, EngineFragment, HardwareFragment, Patch};
use deployconf_types::{
    DeployConfError, Nodes, Optimization, Quantization, Result, ThinkingCapability,
};
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Reserved hardware key applying to every target
pub const DEFAULT_HARDWARE_KEY: &str = "default";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub vendor: Option<String>,
    /// Legacy name for `vendor`
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub defaults: SourceDefaults,
    #[serde(default)]
    pub families: Vec<FamilySource>,
}

impl SourceDocument {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// `vendor` wins over `company`; empty strings count as missing
    pub fn vendor_id(&self) -> Result<&str> {
        [self.vendor.as_deref(), self.company.as_deref()]
            .into_iter()
            .flatten()
            .find(|id| !id.is_empty())
            .ok_or_else(|| {
                DeployConfError::missing_field("Model config must specify 'vendor' or 'company'")
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDefaults {
    #[serde(default)]
    pub hardware: HardwareDefaults,
    /// Named configuration templates emitted for every hardware target
    #[serde(default)]
    pub configurations: Vec<ConfigTemplate>,
}

/// File-level hardware defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareDefaults {
    /// Legacy form: a plain list of hardware names
    Names(Vec<String>),
    /// Per-hardware default fragments; the keys are the hardware list
    PerHardware(IndexMap<String, HardwareFragment>),
}

impl Default for HardwareDefaults {
    fn default() -> Self {
        Self::PerHardware(IndexMap::new())
    }
}

impl HardwareDefaults {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Names(names) => names.iter().map(String::as_str).collect(),
            Self::PerHardware(map) => map.keys().map(String::as_str).collect(),
        }
    }

    pub fn fragment(&self, hardware: &str) -> Option<&HardwareFragment> {
        match self {
            Self::Names(_) => None,
            Self::PerHardware(map) => map.get(hardware),
        }
    }
}

impl<'de> Deserialize<'de> for HardwareDefaults {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(Self::default()),
            Value::Sequence(_) => serde_yaml::from_value(value)
                .map(Self::Names)
                .map_err(D::Error::custom),
            Value::Mapping(_) => serde_yaml::from_value::<HardwareSection>(value)
                .map(|section| Self::PerHardware(section.0))
                .map_err(D::Error::custom),
            _ => Err(D::Error::custom(
                "defaults.hardware must be a list of hardware names or a mapping of per-hardware defaults",
            )),
        }
    }
}

/// Named configuration template from `defaults.configurations`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigTemplate {
    pub name: String,
    #[serde(default)]
    pub nodes: Option<Nodes>,
    #[serde(default)]
    pub optimization: Option<Optimization>,
    #[serde(default, deserialize_with = "env_vars_patch")]
    pub env_vars: Patch<IndexMap<String, String>>,
    #[serde(default)]
    pub tp: Patch<u32>,
    #[serde(default)]
    pub dp: Patch<u32>,
    #[serde(default)]
    pub ep: Patch<u32>,
    #[serde(default)]
    pub enable_dp_attention: Patch<bool>,
    #[serde(default, deserialize_with = "extra_args_patch")]
    pub extra_args: Patch<Vec<String>>,
}

impl ConfigTemplate {
    pub fn engine_fragment(&self) -> EngineFragment {
        EngineFragment {
            env_vars: self.env_vars.clone(),
            tp: self.tp.clone(),
            dp: self.dp.clone(),
            ep: self.ep.clone(),
            enable_dp_attention: self.enable_dp_attention.clone(),
            extra_args: self.extra_args.clone(),
        }
    }
}

/// `hardware:` block of a family or model. A key with no value counts as an
/// empty fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "IndexMap<String, Option<HardwareFragment>>")]
pub struct HardwareSection(pub IndexMap<String, HardwareFragment>);

impl From<IndexMap<String, Option<HardwareFragment>>> for HardwareSection {
    fn from(map: IndexMap<String, Option<HardwareFragment>>) -> Self {
        Self(
            map.into_iter()
                .map(|(name, fragment)| (name, fragment.unwrap_or_default()))
                .collect(),
        )
    }
}

impl HardwareSection {
    pub fn get(&self, hardware: &str) -> Option<&HardwareFragment> {
        self.0.get(hardware)
    }

    pub fn default_fragment(&self) -> Option<&HardwareFragment> {
        self.0.get(DEFAULT_HARDWARE_KEY)
    }

    /// A `default` fragment that mentions at least one key
    pub fn has_default(&self) -> bool {
        self.default_fragment().is_some_and(|f| !f.is_empty())
    }

    /// Hardware names other than `default`, in document order
    pub fn explicit_names(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|name| *name != DEFAULT_HARDWARE_KEY)
    }
}

/// LLM attribute keys as they may appear on a family or model, either under
/// `llm:` or at top level
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LlmFields {
    #[serde(default)]
    pub thinking_capability: Patch<ThinkingCapability>,
    #[serde(default)]
    pub tool_parser: Patch<String>,
    #[serde(default)]
    pub reasoning_parser: Patch<String>,
    #[serde(default)]
    pub chat_template: Patch<String>,
}

impl LlmFields {
    /// The `llm:` block wins for every key it mentions, even with null
    pub fn layered(block: Option<&LlmFields>, top: &LlmFields) -> LlmFields {
        let block = block.cloned().unwrap_or_default();
        LlmFields {
            thinking_capability: block.thinking_capability.or(top.thinking_capability.clone()),
            tool_parser: block.tool_parser.or(top.tool_parser.clone()),
            reasoning_parser: block.reasoning_parser.or(top.reasoning_parser.clone()),
            chat_template: block.chat_template.or(top.chat_template.clone()),
        }
    }
}

/// Anything that carries LLM attribute keys
pub trait LlmAttributeSource {
    fn llm_fields(&self) -> LlmFields;
}

/// Which key names the capability suffix table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilitySuffixKey {
    #[default]
    ModelNameSuffix,
    CapabilitySuffix,
}

/// Where per-quantization engine overrides live on a variant definition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantOverrideKey {
    /// `quant_overrides: { fp8: {...} }`
    #[default]
    Nested,
    /// `fp8: {...}` directly on the model definition
    TopLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConventions {
    #[serde(default)]
    pub capability_suffix_key: CapabilitySuffixKey,
    #[serde(default)]
    pub quant_override_key: QuantOverrideKey,
}

pub type SuffixTable = IndexMap<String, String>;

fn pick_suffix_table<'a>(
    key: CapabilitySuffixKey,
    model_name_suffix: &'a Option<SuffixTable>,
    capability_suffix: &'a Option<SuffixTable>,
) -> Option<&'a SuffixTable> {
    match key {
        CapabilitySuffixKey::ModelNameSuffix => model_name_suffix.as_ref(),
        CapabilitySuffixKey::CapabilitySuffix => capability_suffix.as_ref(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FamilySource {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hardware: HardwareSection,
    #[serde(default)]
    pub models: Vec<ModelDef>,
    #[serde(default)]
    pub model_name_suffix: Option<SuffixTable>,
    #[serde(default)]
    pub capability_suffix: Option<SuffixTable>,
    #[serde(default)]
    pub quant_suffix: Option<IndexMap<Quantization, String>>,
    #[serde(default)]
    pub llm: Option<LlmFields>,
    #[serde(flatten)]
    pub attrs: LlmFields,
}

impl FamilySource {
    pub fn capability_suffixes(&self, key: CapabilitySuffixKey) -> Option<&SuffixTable> {
        pick_suffix_table(key, &self.model_name_suffix, &self.capability_suffix)
    }
}

impl LlmAttributeSource for FamilySource {
    fn llm_fields(&self) -> LlmFields {
        LlmFields::layered(self.llm.as_ref(), &self.attrs)
    }
}

/// One entry of a family's `models:` list
#[derive(Debug, Clone)]
pub enum ModelDef {
    /// Bare model name
    ByName(String),
    /// Object with `name`; no variant expansion
    Explicit(ExplicitModelDef),
    /// Object with `base_name`; expanded by capability and quantization
    Variant(VariantModelDef),
}

impl<'de> Deserialize<'de> for ModelDef {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if let Value::String(name) = value {
            return Ok(Self::ByName(name));
        }
        let Value::Mapping(map) = &value else {
            return Err(D::Error::custom(
                "model entry must be a name or an object with 'name' or 'base_name'",
            ));
        };
        if map.contains_key("base_name") {
            serde_yaml::from_value(value)
                .map(Self::Variant)
                .map_err(D::Error::custom)
        } else {
            serde_yaml::from_value(value)
                .map(Self::Explicit)
                .map_err(D::Error::custom)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExplicitModelDef {
    pub name: String,
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub quantization: Option<Quantization>,
    #[serde(default)]
    pub hardware: HardwareSection,
    #[serde(default)]
    pub llm: Option<LlmFields>,
    #[serde(flatten)]
    pub attrs: LlmFields,
}

impl ExplicitModelDef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl LlmAttributeSource for ExplicitModelDef {
    fn llm_fields(&self) -> LlmFields {
        LlmFields::layered(self.llm.as_ref(), &self.attrs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantModelDef {
    pub base_name: String,
    #[serde(default)]
    pub capabilities: Option<Vec<String>>,
    #[serde(default)]
    pub quantizations: Option<Vec<Quantization>>,
    #[serde(default)]
    pub quant_suffix: Option<IndexMap<Quantization, String>>,
    #[serde(default)]
    pub quantized_paths: IndexMap<Quantization, String>,
    #[serde(default)]
    pub quant_overrides: IndexMap<Quantization, EngineFragment>,
    #[serde(default)]
    pub hardware: HardwareSection,
    #[serde(default)]
    pub model_name_suffix: Option<SuffixTable>,
    #[serde(default)]
    pub capability_suffix: Option<SuffixTable>,
    #[serde(default)]
    pub bf16: Option<EngineFragment>,
    #[serde(default)]
    pub fp8: Option<EngineFragment>,
    #[serde(default)]
    pub fp4: Option<EngineFragment>,
    #[serde(default)]
    pub int4: Option<EngineFragment>,
    #[serde(default)]
    pub llm: Option<LlmFields>,
    #[serde(flatten)]
    pub attrs: LlmFields,
}

impl VariantModelDef {
    pub const DEFAULT_CAPABILITIES: [&'static str; 1] = ["base"];
    pub const DEFAULT_QUANTIZATIONS: [Quantization; 2] = [Quantization::Bf16, Quantization::Fp8];

    pub fn capabilities(&self) -> Vec<String> {
        match &self.capabilities {
            Some(caps) => caps.clone(),
            None => Self::DEFAULT_CAPABILITIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }

    pub fn quantizations(&self) -> Vec<Quantization> {
        match &self.quantizations {
            Some(quants) => quants.clone(),
            None => Self::DEFAULT_QUANTIZATIONS.to_vec(),
        }
    }

    pub fn capability_suffixes(&self, key: CapabilitySuffixKey) -> Option<&SuffixTable> {
        pick_suffix_table(key, &self.model_name_suffix, &self.capability_suffix)
    }

    /// Engine overrides for one quantization, read from the configured key
    pub fn quant_override(&self, quant: Quantization, key: QuantOverrideKey) -> Option<&EngineFragment> {
        match key {
            QuantOverrideKey::Nested => self.quant_overrides.get(&quant),
            QuantOverrideKey::TopLevel => match quant {
                Quantization::Bf16 => self.bf16.as_ref(),
                Quantization::Fp8 => self.fp8.as_ref(),
                Quantization::Fp4 => self.fp4.as_ref(),
                Quantization::Int4 => self.int4.as_ref(),
            },
        }
    }
}

impl LlmAttributeSource for VariantModelDef {
    fn llm_fields(&self) -> LlmFields {
        LlmFields::layered(self.llm.as_ref(), &self.attrs)
    }
}
