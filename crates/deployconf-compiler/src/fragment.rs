//! Typed override fragments and the shallow per-key merge
//!
//! Every field of a fragment distinguishes "not mentioned" from "explicitly
//! null" from "set". Merging is a pure fold: a higher level replaces a key
//! whenever it mentions it, including with null.

use deployconf_types::{scalar, Quantization};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

/// One key of an override level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Key not mentioned at this level
    #[default]
    Absent,
    /// Key mentioned with an explicit null
    Null,
    Set(T),
}

impl<T> Patch<T> {
    /// Keep `self` unless it is absent
    pub fn or(self, lower: Patch<T>) -> Patch<T> {
        match self {
            Patch::Absent => lower,
            other => other,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Set(v) => Patch::Set(v),
        }
    }

    /// Absent and null both collapse to `None`
    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Set(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// A key that is present: null or a value
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Null,
        }
    }
}

// Fields carrying a Patch must also be `#[serde(default)]` so a missing key
// stays Absent; a present key always goes through here.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

/// `env_vars` patch with scalar values read as text
pub(crate) fn env_vars_patch<'de, D>(deserializer: D) -> Result<Patch<IndexMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar::string_map(deserializer).map(Patch::from)
}

/// `extra_args` patch with scalar items read as text
pub(crate) fn extra_args_patch<'de, D>(deserializer: D) -> Result<Patch<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar::string_list(deserializer).map(Patch::from)
}

/// A fragment that can be layered over a lower-precedence one
pub trait Layered: Default {
    /// Overlay `high` on `self`, key by key
    fn layer(self, high: Self) -> Self;
}

/// `low` then `high`; later wins per key
pub fn merge<F: Layered>(low: F, high: F) -> F {
    low.layer(high)
}

/// Fold levels ordered lowest to highest precedence
pub fn fold<F, I>(levels: I) -> F
where
    F: Layered,
    I: IntoIterator<Item = F>,
{
    levels.into_iter().fold(F::default(), merge)
}

/// Engine fields as they appear in configuration templates and
/// quantization overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineFragment {
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

impl Layered for EngineFragment {
    fn layer(self, high: Self) -> Self {
        Self {
            env_vars: high.env_vars.or(self.env_vars),
            tp: high.tp.or(self.tp),
            dp: high.dp.or(self.dp),
            ep: high.ep.or(self.ep),
            enable_dp_attention: high.enable_dp_attention.or(self.enable_dp_attention),
            extra_args: high.extra_args.or(self.extra_args),
        }
    }
}

/// Per-hardware override: engine fields plus the quantizations the
/// hardware accepts
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HardwareFragment {
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
    #[serde(default)]
    pub valid_quants: Patch<Vec<Quantization>>,
}

impl HardwareFragment {
    /// No key mentioned at all
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn engine(&self) -> EngineFragment {
        EngineFragment {
            env_vars: self.env_vars.clone(),
            tp: self.tp.clone(),
            dp: self.dp.clone(),
            ep: self.ep.clone(),
            enable_dp_attention: self.enable_dp_attention.clone(),
            extra_args: self.extra_args.clone(),
        }
    }

    /// A null or empty list places no restriction
    pub fn accepts(&self, quant: Quantization) -> bool {
        match &self.valid_quants {
            Patch::Set(allowed) if !allowed.is_empty() => allowed.contains(&quant),
            _ => true,
        }
    }
}

impl Layered for HardwareFragment {
    fn layer(self, high: Self) -> Self {
        Self {
            env_vars: high.env_vars.or(self.env_vars),
            tp: high.tp.or(self.tp),
            dp: high.dp.or(self.dp),
            ep: high.ep.or(self.ep),
            enable_dp_attention: high.enable_dp_attention.or(self.enable_dp_attention),
            extra_args: high.extra_args.or(self.extra_args),
            valid_quants: high.valid_quants.or(self.valid_quants),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hw(yaml: &str) -> HardwareFragment {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let f = hw("tp: null");
        assert_eq!(f.tp, Patch::Null);
        assert_eq!(f.dp, Patch::Absent);
        assert!(!f.is_empty());
        assert!(hw("{}").is_empty());
    }

    #[test]
    fn later_level_wins_per_key() {
        let merged = fold([hw("tp: 8\ndp: 2"), hw("tp: 4"), hw("dp: null")]);
        assert_eq!(merged.tp, Patch::Set(4));
        assert_eq!(merged.dp, Patch::Null);
        assert_eq!(merged.ep, Patch::Absent);
    }

    #[test]
    fn valid_quants_empty_means_unrestricted() {
        assert!(hw("valid_quants: []").accepts(Quantization::Bf16));
        assert!(hw("valid_quants: null").accepts(Quantization::Bf16));
        assert!(!hw("valid_quants: [fp8]").accepts(Quantization::Bf16));
        assert!(hw("valid_quants: [fp8]").accepts(Quantization::Fp8));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(serde_yaml::from_str::<HardwareFragment>("tpp: 8").is_err());
        assert!(serde_yaml::from_str::<EngineFragment>("valid_quants: [fp8]").is_err());
    }
}
