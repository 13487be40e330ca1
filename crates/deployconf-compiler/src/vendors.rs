//! Vendor registry (`vendors.yaml`)

use crate::io::load_yaml;
use deployconf_types::{DeployConfError, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const VENDORS_FILE_NAME: &str = "vendors.yaml";

/// One registry entry
#[derive(Debug, Clone, PartialEq)]
pub struct VendorInfo {
    pub huggingface_org: String,
    /// Remaining keys, kept for display
    pub extra: IndexMap<String, Value>,
}

#[derive(Deserialize)]
struct RawRegistry {
    #[serde(default)]
    vendors: Option<IndexMap<String, IndexMap<String, Value>>>,
}

/// Maps vendor ids to repository organizations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendorRegistry {
    vendors: IndexMap<String, VendorInfo>,
}

impl VendorRegistry {
    /// Registry file location for a source directory: its parent holds it
    pub fn default_path(input_dir: &Path) -> PathBuf {
        input_dir
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(VENDORS_FILE_NAME)
    }

    /// Load from a file; a missing file is an empty registry
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no vendor registry, using vendor ids literally");
            return Ok(Self::default());
        }
        let raw: Option<RawRegistry> = load_yaml(path)?;
        Self::from_raw(raw)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: Option<RawRegistry> = serde_yaml::from_str(text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: Option<RawRegistry>) -> Result<Self> {
        let entries = raw.and_then(|r| r.vendors).unwrap_or_default();
        let mut vendors = IndexMap::with_capacity(entries.len());
        for (id, mut fields) in entries {
            let org = match fields.shift_remove("huggingface_org") {
                Some(Value::String(org)) => org,
                Some(_) => {
                    return Err(DeployConfError::config(format!(
                        "Vendor '{}' has a non-string 'huggingface_org' field",
                        id
                    )))
                }
                None => {
                    return Err(DeployConfError::config(format!(
                        "Vendor '{}' missing required 'huggingface_org' field",
                        id
                    )))
                }
            };
            vendors.insert(
                id,
                VendorInfo {
                    huggingface_org: org,
                    extra: fields,
                },
            );
        }
        Ok(Self { vendors })
    }

    pub fn insert(&mut self, id: impl Into<String>, huggingface_org: impl Into<String>) {
        self.vendors.insert(
            id.into(),
            VendorInfo {
                huggingface_org: huggingface_org.into(),
                extra: IndexMap::new(),
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<&VendorInfo> {
        self.vendors.get(id)
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }

    /// Organization used to build default model paths. Unknown ids fall back
    /// to the id itself.
    pub fn resolve_org(&self, id: &str) -> String {
        match self.vendors.get(id) {
            Some(info) => info.huggingface_org.clone(),
            None => {
                warn!(vendor = %id, "vendor not found in registry, using id as organization");
                id.to_string()
            }
        }
    }
}
