//! Vendor document files on disk

use deployconf_compiler::io::{load_yaml, render_yaml, write_atomic};
use deployconf_types::{Result, VendorConfig};
use serde_yaml::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const FALLBACK_NAME: &str = "unnamed";

/// Lower-case, every character outside `[alphanumeric - _]` replaced with
/// `-`, leading and trailing `-`/`_` trimmed
pub fn sanitize_vendor_name(name: &str) -> String {
    let safe: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = safe.trim_matches(|c| c == '-' || c == '_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// File holding a vendor's document; always a direct child of `models_dir`
pub fn vendor_file_path(models_dir: &Path, vendor: &str) -> PathBuf {
    let file_name = format!("{}.yaml", sanitize_vendor_name(vendor));
    let candidate = Path::new(&file_name);
    let mut components = candidate.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => models_dir.join(candidate),
        _ => models_dir.join(format!("{}.yaml", FALLBACK_NAME)),
    }
}

/// `*.yaml` and `*.yml` files directly in `dir`, sorted
pub fn list_vendor_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    files.sort();
    Ok(files)
}

pub fn load_document(path: &Path) -> Result<VendorConfig> {
    load_yaml(path)
}

/// Raw value used for change summaries; an empty file is an empty mapping
pub fn load_raw_document(path: &Path) -> Result<Value> {
    let value: Value = load_yaml(path)?;
    Ok(match value {
        Value::Null => Value::Mapping(Default::default()),
        other => other,
    })
}

pub fn save_document(document: &VendorConfig, path: &Path) -> Result<()> {
    let text = render_yaml(document)?;
    write_atomic(path, &text)?;
    debug!(path = %path.display(), "saved document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_vendor_name("DeepSeek AI"), "deepseek-ai");
        assert_eq!(sanitize_vendor_name("../../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_vendor_name("__Qwen__"), "qwen");
        assert_eq!(sanitize_vendor_name("///"), FALLBACK_NAME);
        assert_eq!(sanitize_vendor_name(""), FALLBACK_NAME);
    }

    #[test]
    fn path_stays_in_models_dir() {
        let dir = Path::new("data/models");
        assert_eq!(vendor_file_path(dir, "../evil"), dir.join("evil.yaml"));
        assert_eq!(vendor_file_path(dir, "Moonshot AI"), dir.join("moonshot-ai.yaml"));
    }
}
