//! File I/O helpers shared by the compilers and the editor

use deployconf_types::{DeployConfError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .map_err(|e| DeployConfError::io(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_yaml::from_str(&text).map_err(|e| {
        DeployConfError::serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Block-style YAML, keys in declaration order, nulls written as `null`
pub fn render_yaml<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

/// Two-space indented JSON with a trailing newline
pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

/// Write through a temporary file in the target directory, then rename
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .map_err(|e| DeployConfError::io(format!("Failed to create {}: {}", dir.display(), e)))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| {
        DeployConfError::io(format!("Failed to write {}: {}", path.display(), e.error))
    })?;
    Ok(())
}
