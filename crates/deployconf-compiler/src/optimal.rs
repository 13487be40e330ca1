//! Optimal-config documents: YAML in, JSON out, with inferred `model` and
//! `version` metadata and a structural check

use crate::batch::DocumentCompiler;
use crate::io::{load_yaml, render_json};
use deployconf_types::{DeployConfError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Version recorded when the parent directory is not a version folder
pub const DEFAULT_FALLBACK_VERSION: &str = "v0.5.6";

const UI_OPTION_KEYS: [&str; 4] = ["hardware", "quantization", "scenario", "gpu_count"];

/// Add `model` (file stem) and `version` (parent folder starting with `v`,
/// else the fallback) when missing. New keys go after the existing ones.
pub fn add_metadata(mut source: Map<String, Value>, input: &Path, fallback_version: &str) -> Map<String, Value> {
    if !source.contains_key("model") {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        source.insert("model".to_string(), Value::String(stem));
    }

    if !source.contains_key("version") {
        let parent = input
            .parent()
            .and_then(Path::file_name)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let version = if parent.starts_with('v') {
            parent
        } else {
            fallback_version.to_string()
        };
        source.insert("version".to_string(), Value::String(version));
    }

    source
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Every structural problem, each prefixed with the file name
pub fn validate_optimal_config(config: &Map<String, Value>, filename: &str) -> Vec<String> {
    let mut errors = Vec::new();

    match config.get("ui_options") {
        None => errors.push(format!("{}: 'ui_options' is required", filename)),
        Some(ui) => {
            for key in UI_OPTION_KEYS {
                match ui.get(key) {
                    None => errors.push(format!("{}: 'ui_options.{}' is required", filename, key)),
                    Some(v) if !v.is_array() => {
                        errors.push(format!("{}: 'ui_options.{}' must be an array", filename, key))
                    }
                    Some(_) => {}
                }
            }
        }
    }

    match config.get("configs") {
        None => errors.push(format!("{}: 'configs' is required", filename)),
        Some(Value::Array(configs)) => {
            for (i, cfg) in configs.iter().enumerate() {
                let prefix = format!("{} configs[{}]", filename, i);
                for key in ["hardware", "quantization"] {
                    if !truthy(cfg.get(key)) {
                        errors.push(format!("{}: '{}' is required", prefix, key));
                    }
                }
                if cfg.get("gpu_count").is_none() {
                    errors.push(format!("{}: 'gpu_count' is required", prefix));
                }
                if !truthy(cfg.get("scenario")) {
                    errors.push(format!("{}: 'scenario' is required", prefix));
                }
                let parameters = cfg.get("parameters");
                if !truthy(parameters) {
                    errors.push(format!("{}: 'parameters' is required", prefix));
                } else if !truthy(parameters.and_then(|p| p.get("model_path"))) {
                    errors.push(format!("{}: 'parameters.model_path' is required", prefix));
                }
            }
        }
        Some(_) => errors.push(format!("{}: 'configs' must be an array", filename)),
    }

    errors
}

/// JSON form of a YAML value. Scalar mapping keys become their text
/// (`8:` is `"8"`), tags are dropped. Collection keys and non-finite
/// floats have no JSON form.
pub fn yaml_to_json(value: serde_yaml::Value) -> Result<Value> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| DeployConfError::schema(format!("number {} has no JSON form", n)))?
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect::<Result<_>>()?),
        Yaml::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, value) in mapping {
                object.insert(json_key(key)?, yaml_to_json(value)?);
            }
            Value::Object(object)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value)?,
    })
}

fn json_key(key: serde_yaml::Value) -> Result<String> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => json_key(tagged.value),
        Yaml::Sequence(_) | Yaml::Mapping(_) => Err(DeployConfError::schema(
            "mapping keys must be scalars".to_string(),
        )),
    }
}

/// Optimal-config YAML to JSON
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimalCompiler {
    pub fallback_version: String,
}

impl Default for OptimalCompiler {
    fn default() -> Self {
        Self {
            fallback_version: DEFAULT_FALLBACK_VERSION.to_string(),
        }
    }
}

impl OptimalCompiler {
    pub fn new(fallback_version: impl Into<String>) -> Self {
        Self {
            fallback_version: fallback_version.into(),
        }
    }

    /// Metadata added and validated, ready to render
    pub fn compile_value(&self, input: &Path) -> Result<Map<String, Value>> {
        let source: serde_yaml::Value = load_yaml(input)?;
        let source = yaml_to_json(source)
            .map_err(|e| DeployConfError::schema(format!("{}: {}", input.display(), e)))?;
        let Value::Object(source) = source else {
            return Err(DeployConfError::schema(format!(
                "{}: top level must be a mapping",
                input.display()
            )));
        };

        let compiled = add_metadata(source, input, &self.fallback_version);
        let filename = input
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let errors = validate_optimal_config(&compiled, &filename);
        if !errors.is_empty() {
            return Err(DeployConfError::validation(errors));
        }
        Ok(compiled)
    }
}

impl DocumentCompiler for OptimalCompiler {
    fn output_path(&self, output_dir: &Path, relative: &Path) -> PathBuf {
        output_dir.join(relative).with_extension("json")
    }

    fn compile(&self, input: &Path) -> Result<String> {
        render_json(&self.compile_value(input)?)
    }

    fn same_content(&self, rendered: &str, existing: &str) -> Result<bool> {
        let fresh: Value = serde_json::from_str(rendered)?;
        let current: Value = serde_json::from_str(existing)?;
        Ok(fresh == current)
    }
}
