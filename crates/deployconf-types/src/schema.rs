//! Resolved configuration document schema
//!
//! Hierarchy: Vendor -> Family -> Model -> Hardware -> [Version ->] Named Configuration
//!
//! The canonical layout stores configurations directly under each hardware
//! entry. The legacy layout keeps a runtime-version level in between; it is
//! accepted on import and preserved when present.

use crate::{DeployConfError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Thinking capability mode of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingCapability {
    NonThinking,
    Thinking,
    Hybrid,
}

impl ThinkingCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NonThinking => "non_thinking",
            Self::Thinking => "thinking",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ThinkingCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThinkingCapability {
    type Err = DeployConfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "non_thinking" => Ok(Self::NonThinking),
            "thinking" => Ok(Self::Thinking),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(DeployConfError::schema(format!(
                "thinking_capability must be one of: non_thinking, thinking, hybrid (got '{}')",
                other
            ))),
        }
    }
}

/// Single node or multi-node deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nodes {
    Single,
    Multi,
}

impl Nodes {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
        }
    }
}

impl Default for Nodes {
    fn default() -> Self {
        Self::Single
    }
}

impl fmt::Display for Nodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Nodes {
    type Err = DeployConfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(Self::Single),
            "multi" => Ok(Self::Multi),
            other => Err(DeployConfError::schema(format!(
                "nodes must be one of: single, multi (got '{}')",
                other
            ))),
        }
    }
}

/// Optimization target of a named configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Optimization {
    Balanced,
    LowLatency,
    HighThroughput,
}

impl Optimization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::LowLatency => "low-latency",
            Self::HighThroughput => "high-throughput",
        }
    }
}

impl Default for Optimization {
    fn default() -> Self {
        Self::Balanced
    }
}

impl fmt::Display for Optimization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Optimization {
    type Err = DeployConfError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "balanced" => Ok(Self::Balanced),
            "low-latency" => Ok(Self::LowLatency),
            "high-throughput" => Ok(Self::HighThroughput),
            other => Err(DeployConfError::schema(format!(
                "optimization must be one of: balanced, low-latency, high-throughput (got '{}')",
                other
            ))),
        }
    }
}

/// Numeric precision of the model weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantization {
    Fp8,
    Int4,
    Bf16,
    Fp4,
}

impl Quantization {
    pub const ALL: [Quantization; 4] = [Self::Fp8, Self::Int4, Self::Bf16, Self::Fp4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fp8 => "fp8",
            Self::Int4 => "int4",
            Self::Bf16 => "bf16",
            Self::Fp4 => "fp4",
        }
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quantization {
    type Err = DeployConfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| {
                DeployConfError::schema(format!(
                    "quantization must be one of: fp8, int4, bf16, fp4 (got '{}')",
                    s
                ))
            })
    }
}

/// Engine/runtime configuration. Used for the unified config and for the
/// prefill and decode phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEngineConfig")]
pub struct EngineConfig {
    /// Environment variables set before launching the server
    pub env_vars: IndexMap<String, String>,
    /// Tensor parallelism degree
    pub tp: u32,
    /// Data parallelism degree
    pub dp: Option<u32>,
    /// Expert parallelism degree (MoE models)
    pub ep: Option<u32>,
    /// Data-parallel attention with tensor-parallel FFN
    pub enable_dp_attention: Option<bool>,
    /// Extra command-line arguments passed through verbatim
    pub extra_args: Vec<String>,
}

#[derive(Deserialize)]
struct RawEngineConfig {
    #[serde(default, deserialize_with = "crate::scalar::string_map")]
    env_vars: Option<IndexMap<String, String>>,
    #[serde(default)]
    tp: Option<i64>,
    #[serde(default)]
    dp: Option<i64>,
    #[serde(default)]
    ep: Option<i64>,
    #[serde(default)]
    enable_dp_attention: Option<bool>,
    #[serde(default, deserialize_with = "crate::scalar::string_list")]
    extra_args: Option<Vec<String>>,
}

impl TryFrom<RawEngineConfig> for EngineConfig {
    type Error = DeployConfError;

    fn try_from(raw: RawEngineConfig) -> Result<Self> {
        let tp = raw
            .tp
            .ok_or_else(|| DeployConfError::missing_field("engine config requires 'tp'"))?;

        Ok(Self {
            env_vars: raw.env_vars.unwrap_or_default(),
            tp: parallel_degree("tp", tp)?,
            dp: raw.dp.map(|v| parallel_degree("dp", v)).transpose()?,
            ep: raw.ep.map(|v| parallel_degree("ep", v)).transpose()?,
            enable_dp_attention: raw.enable_dp_attention,
            extra_args: raw.extra_args.unwrap_or_default(),
        })
    }
}

fn parallel_degree(field: &str, value: i64) -> Result<u32> {
    if value < 1 {
        return Err(DeployConfError::invalid_parameter(format!(
            "'{}' must be >= 1, got {}",
            field, value
        )));
    }
    u32::try_from(value).map_err(|_| {
        DeployConfError::invalid_parameter(format!("'{}' is out of range: {}", field, value))
    })
}

impl EngineConfig {
    /// Engine config with the given tensor parallelism and nothing else set
    pub fn new(tp: u32) -> Result<Self> {
        let config = Self {
            env_vars: IndexMap::new(),
            tp,
            dp: None,
            ep: None,
            enable_dp_attention: None,
            extra_args: Vec::new(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_dp(mut self, dp: u32) -> Self {
        self.dp = Some(dp);
        self
    }

    pub fn with_ep(mut self, ep: u32) -> Self {
        self.ep = Some(ep);
        self
    }

    pub fn with_dp_attention(mut self, enabled: bool) -> Self {
        self.enable_dp_attention = Some(enabled);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn with_extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Check parallelism degrees. Fields are public, so anything that mutates
    /// them in place must call this again.
    pub fn validate(&self) -> Result<()> {
        if self.tp < 1 {
            return Err(DeployConfError::invalid_parameter("'tp' must be >= 1, got 0"));
        }
        if self.dp == Some(0) {
            return Err(DeployConfError::invalid_parameter("'dp' must be >= 1, got 0"));
        }
        if self.ep == Some(0) {
            return Err(DeployConfError::invalid_parameter("'ep' must be >= 1, got 0"));
        }
        Ok(())
    }
}

/// Attributes describing the deployment scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigAttributes {
    pub nodes: Nodes,
    pub optimization: Optimization,
    pub quantization: Quantization,
}

impl ConfigAttributes {
    pub fn new(nodes: Nodes, optimization: Optimization, quantization: Quantization) -> Self {
        Self {
            nodes,
            optimization,
            quantization,
        }
    }
}

/// How the runtime is configured for a named configuration: one engine for
/// the whole request, or separate prefill and decode engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineLayout {
    Unified(EngineConfig),
    PhaseSplit {
        prefill: EngineConfig,
        decode: EngineConfig,
    },
}

impl EngineLayout {
    fn validate(&self) -> Result<()> {
        match self {
            Self::Unified(engine) => engine.validate(),
            Self::PhaseSplit { prefill, decode } => {
                prefill.validate().map_err(|e| phase_error("prefill", e))?;
                decode.validate().map_err(|e| phase_error("decode", e))
            }
        }
    }
}

fn phase_error(phase: &str, err: DeployConfError) -> DeployConfError {
    DeployConfError::invalid_parameter(format!("{}: {}", phase, err))
}

/// A specific named configuration (e.g. "default", "low-latency-fp8")
///
/// Either `engine` alone or both `prefill` and `decode` are set; every
/// constructor and the deserializer reject any other combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNamedConfiguration", into = "RawNamedConfiguration")]
pub struct NamedConfiguration {
    pub name: String,
    pub attributes: ConfigAttributes,
    pub quantized_model_path: Option<String>,
    layout: EngineLayout,
}

#[derive(Serialize, Deserialize)]
struct RawNamedConfiguration {
    name: String,
    attributes: ConfigAttributes,
    #[serde(default)]
    quantized_model_path: Option<String>,
    #[serde(default)]
    engine: Option<EngineConfig>,
    #[serde(default)]
    prefill: Option<EngineConfig>,
    #[serde(default)]
    decode: Option<EngineConfig>,
}

impl TryFrom<RawNamedConfiguration> for NamedConfiguration {
    type Error = DeployConfError;

    fn try_from(raw: RawNamedConfiguration) -> Result<Self> {
        Self::from_parts(
            raw.name,
            raw.attributes,
            raw.quantized_model_path,
            raw.engine,
            raw.prefill,
            raw.decode,
        )
    }
}

impl From<NamedConfiguration> for RawNamedConfiguration {
    fn from(config: NamedConfiguration) -> Self {
        let (engine, prefill, decode) = match config.layout {
            EngineLayout::Unified(engine) => (Some(engine), None, None),
            EngineLayout::PhaseSplit { prefill, decode } => (None, Some(prefill), Some(decode)),
        };
        Self {
            name: config.name,
            attributes: config.attributes,
            quantized_model_path: config.quantized_model_path,
            engine,
            prefill,
            decode,
        }
    }
}

impl NamedConfiguration {
    /// Configuration with a single engine for the whole request
    pub fn unified(
        name: impl Into<String>,
        attributes: ConfigAttributes,
        engine: EngineConfig,
    ) -> Result<Self> {
        Self::with_layout(name, attributes, None, EngineLayout::Unified(engine))
    }

    /// Configuration with separate prefill and decode engines
    pub fn phase_split(
        name: impl Into<String>,
        attributes: ConfigAttributes,
        prefill: EngineConfig,
        decode: EngineConfig,
    ) -> Result<Self> {
        Self::with_layout(
            name,
            attributes,
            None,
            EngineLayout::PhaseSplit { prefill, decode },
        )
    }

    /// Build from the three optional engine slots as they appear in documents
    pub fn from_parts(
        name: impl Into<String>,
        attributes: ConfigAttributes,
        quantized_model_path: Option<String>,
        engine: Option<EngineConfig>,
        prefill: Option<EngineConfig>,
        decode: Option<EngineConfig>,
    ) -> Result<Self> {
        let layout = match (engine, prefill, decode) {
            (Some(engine), None, None) => EngineLayout::Unified(engine),
            (None, Some(prefill), Some(decode)) => EngineLayout::PhaseSplit { prefill, decode },
            (Some(_), _, _) => {
                return Err(DeployConfError::invariant(
                    "Cannot have both 'engine' and 'prefill'/'decode'. \
                     Use either 'engine' alone OR both 'prefill' and 'decode' together.",
                ))
            }
            (None, Some(_), None) => {
                return Err(DeployConfError::invariant(
                    "'prefill' requires 'decode' to also be set (engine is not set)",
                ))
            }
            (None, None, Some(_)) => {
                return Err(DeployConfError::invariant(
                    "'decode' requires 'prefill' to also be set (engine is not set)",
                ))
            }
            (None, None, None) => {
                return Err(DeployConfError::invariant(
                    "Must have either 'engine' OR both 'prefill' and 'decode'. \
                     Neither is currently set.",
                ))
            }
        };
        Self::with_layout(name, attributes, quantized_model_path, layout)
    }

    fn with_layout(
        name: impl Into<String>,
        attributes: ConfigAttributes,
        quantized_model_path: Option<String>,
        layout: EngineLayout,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DeployConfError::schema(
                "configuration 'name' must be a non-empty string",
            ));
        }
        layout.validate()?;
        Ok(Self {
            name,
            attributes,
            quantized_model_path,
            layout,
        })
    }

    pub fn with_quantized_model_path(mut self, path: impl Into<String>) -> Self {
        self.quantized_model_path = Some(path.into());
        self
    }

    pub fn layout(&self) -> &EngineLayout {
        &self.layout
    }

    /// Replace the engine layout after checking the new engines
    pub fn set_layout(&mut self, layout: EngineLayout) -> Result<()> {
        layout.validate()?;
        self.layout = layout;
        Ok(())
    }

    pub fn engine(&self) -> Option<&EngineConfig> {
        match &self.layout {
            EngineLayout::Unified(engine) => Some(engine),
            EngineLayout::PhaseSplit { .. } => None,
        }
    }

    pub fn prefill(&self) -> Option<&EngineConfig> {
        match &self.layout {
            EngineLayout::PhaseSplit { prefill, .. } => Some(prefill),
            EngineLayout::Unified(_) => None,
        }
    }

    pub fn decode(&self) -> Option<&EngineConfig> {
        match &self.layout {
            EngineLayout::PhaseSplit { decode, .. } => Some(decode),
            EngineLayout::Unified(_) => None,
        }
    }

    pub fn is_phase_split(&self) -> bool {
        matches!(self.layout, EngineLayout::PhaseSplit { .. })
    }

    /// Re-run every construction-time check against the current field values
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DeployConfError::schema(
                "configuration 'name' must be a non-empty string",
            ));
        }
        self.layout.validate()
    }
}

/// Configurations for one runtime version (legacy layout)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConfig {
    #[serde(default)]
    pub configurations: Vec<NamedConfiguration>,
}

/// Configuration for one hardware target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHardwareConfig", into = "RawHardwareConfig")]
pub enum HardwareConfig {
    /// Canonical layout: configurations directly under the hardware entry
    Flat {
        configurations: Vec<NamedConfiguration>,
    },
    /// Legacy layout: runtime version -> configurations
    Versioned {
        versions: IndexMap<String, VersionConfig>,
    },
}

#[derive(Serialize, Deserialize)]
struct RawHardwareConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    configurations: Option<Vec<NamedConfiguration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    versions: Option<IndexMap<String, VersionConfig>>,
}

impl TryFrom<RawHardwareConfig> for HardwareConfig {
    type Error = DeployConfError;

    fn try_from(raw: RawHardwareConfig) -> Result<Self> {
        match (raw.configurations, raw.versions) {
            (Some(configurations), None) => Ok(Self::Flat { configurations }),
            (None, Some(versions)) => Ok(Self::Versioned { versions }),
            (Some(_), Some(_)) => Err(DeployConfError::schema(
                "hardware config cannot have both 'configurations' and 'versions'",
            )),
            (None, None) => Err(DeployConfError::missing_field(
                "hardware config requires 'configurations' (or legacy 'versions')",
            )),
        }
    }
}

impl From<HardwareConfig> for RawHardwareConfig {
    fn from(config: HardwareConfig) -> Self {
        match config {
            HardwareConfig::Flat { configurations } => Self {
                configurations: Some(configurations),
                versions: None,
            },
            HardwareConfig::Versioned { versions } => Self {
                configurations: None,
                versions: Some(versions),
            },
        }
    }
}

impl HardwareConfig {
    pub fn flat(configurations: Vec<NamedConfiguration>) -> Self {
        Self::Flat { configurations }
    }

    pub fn versioned(version: impl Into<String>, configurations: Vec<NamedConfiguration>) -> Self {
        let mut versions = IndexMap::new();
        versions.insert(version.into(), VersionConfig { configurations });
        Self::Versioned { versions }
    }

    pub fn is_versioned(&self) -> bool {
        matches!(self, Self::Versioned { .. })
    }

    /// Every configuration list with its version key (None for the flat layout)
    pub fn configuration_lists(&self) -> Vec<(Option<&str>, &[NamedConfiguration])> {
        match self {
            Self::Flat { configurations } => vec![(None, configurations.as_slice())],
            Self::Versioned { versions } => versions
                .iter()
                .map(|(version, cfg)| (Some(version.as_str()), cfg.configurations.as_slice()))
                .collect(),
        }
    }

    /// Configuration list addressed by version; the version must be given
    /// exactly when the layout is versioned.
    pub fn configurations(&self, version: Option<&str>) -> Option<&Vec<NamedConfiguration>> {
        match (self, version) {
            (Self::Flat { configurations }, None) => Some(configurations),
            (Self::Versioned { versions }, Some(v)) => versions.get(v).map(|c| &c.configurations),
            _ => None,
        }
    }

    pub fn configurations_mut(
        &mut self,
        version: Option<&str>,
    ) -> Option<&mut Vec<NamedConfiguration>> {
        match (self, version) {
            (Self::Flat { configurations }, None) => Some(configurations),
            (Self::Versioned { versions }, Some(v)) => {
                versions.get_mut(v).map(|c| &mut c.configurations)
            }
            _ => None,
        }
    }

    pub fn total_configurations(&self) -> usize {
        self.configuration_lists()
            .iter()
            .map(|(_, configs)| configs.len())
            .sum()
    }
}

/// LLM-specific model attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmAttributes {
    pub thinking_capability: ThinkingCapability,
    #[serde(default)]
    pub tool_parser: Option<String>,
    #[serde(default)]
    pub reasoning_parser: Option<String>,
    #[serde(default)]
    pub chat_template: Option<String>,
}

impl LlmAttributes {
    pub fn new(thinking_capability: ThinkingCapability) -> Self {
        Self {
            thinking_capability,
            tool_parser: None,
            reasoning_parser: None,
            chat_template: None,
        }
    }
}

/// Model-level attributes, grouped by model type. Legacy documents keep the
/// LLM fields directly under `attributes`; they are read into `llm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AttributesRepr")]
pub struct ModelAttributes {
    pub llm: LlmAttributes,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AttributesRepr {
    Wrapped { llm: LlmAttributes },
    Flat(LlmAttributes),
}

impl From<AttributesRepr> for ModelAttributes {
    fn from(repr: AttributesRepr) -> Self {
        match repr {
            AttributesRepr::Wrapped { llm } | AttributesRepr::Flat(llm) => Self { llm },
        }
    }
}

impl From<LlmAttributes> for ModelAttributes {
    fn from(llm: LlmAttributes) -> Self {
        Self { llm }
    }
}

/// A specific model within a family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Display name, unique within the family
    pub name: String,
    /// Canonical model repository path (e.g. "org/Model-FP8")
    pub model_path: String,
    pub attributes: ModelAttributes,
    /// Hardware-specific configurations keyed by hardware name
    #[serde(default)]
    pub hardware: IndexMap<String, HardwareConfig>,
}

impl Model {
    pub fn new(
        name: impl Into<String>,
        model_path: impl Into<String>,
        attributes: impl Into<ModelAttributes>,
    ) -> Self {
        Self {
            name: name.into(),
            model_path: model_path.into(),
            attributes: attributes.into(),
            hardware: IndexMap::new(),
        }
    }

    pub fn configuration_count(&self) -> usize {
        self.hardware
            .values()
            .map(HardwareConfig::total_configurations)
            .sum()
    }
}

/// A family of related models sharing defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFamily {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub models: Vec<Model>,
}

impl ModelFamily {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            models: Vec::new(),
        }
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn model_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.iter_mut().find(|m| m.name == name)
    }
}

/// Root of a resolved document: one vendor and its families
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Vendor identifier (legacy documents call it `company`)
    #[serde(alias = "company")]
    pub vendor: String,
    #[serde(default)]
    pub families: Vec<ModelFamily>,
}

impl VendorConfig {
    pub fn new(vendor: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            families: Vec::new(),
        }
    }

    pub fn family(&self, name: &str) -> Option<&ModelFamily> {
        self.families.iter().find(|f| f.name == name)
    }

    pub fn family_mut(&mut self, name: &str) -> Option<&mut ModelFamily> {
        self.families.iter_mut().find(|f| f.name == name)
    }

    pub fn model_count(&self) -> usize {
        self.families.iter().map(|f| f.models.len()).sum()
    }
}
