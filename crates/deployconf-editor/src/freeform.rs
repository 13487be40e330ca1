//! Free-form YAML editing of a single named configuration

use deployconf_compiler::io::render_yaml;
use deployconf_types::{DeployConfError, NamedConfiguration, Result};
use serde_yaml::Value;

const EDIT_HEADER: &str = "\
# Edit this configuration. Save and exit to apply changes.
# To cancel, delete all content and save.
#
# Use EITHER 'engine' alone (unified config)
# OR BOTH 'prefill' AND 'decode' together (phase-split config).
# Set unwanted sections to null (e.g. engine: null).
#
# Valid values:
#   nodes: single | multi
#   optimization: balanced | low-latency | high-throughput
#   quantization: fp8 | int4 | bf16 | fp4 (required)
#   tp: positive integer (required in every engine block)
#   dp, ep: positive integers or null
#   enable_dp_attention: true | false | null
#   env_vars: key-value pairs or {}
#   extra_args: list of strings or []
#
";

/// Text handed to an external editor: a comment header and the
/// configuration as YAML
pub fn configuration_edit_template(config: &NamedConfiguration) -> Result<String> {
    Ok(format!("{}{}", EDIT_HEADER, render_yaml(config)?))
}

/// Parse edited text back into a configuration, running every
/// construction check. Empty text (or only comments) is an error.
pub fn parse_configuration_yaml(text: &str) -> Result<NamedConfiguration> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| {
        DeployConfError::serialization(format!(
            "Invalid YAML syntax (check for unquoted special characters): {}",
            e
        ))
    })?;
    if value.is_null() {
        return Err(DeployConfError::invalid_parameter("Empty configuration"));
    }
    serde_yaml::from_value(value).map_err(|e| DeployConfError::schema(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deployconf_types::{ConfigAttributes, EngineConfig, Nodes, Optimization, Quantization};

    #[test]
    fn template_parses_back() {
        let config = NamedConfiguration::unified(
            "default",
            ConfigAttributes::new(Nodes::Single, Optimization::Balanced, Quantization::Fp8),
            EngineConfig::new(8).unwrap(),
        )
        .unwrap();
        let text = configuration_edit_template(&config).unwrap();
        assert!(text.starts_with("# Edit this configuration."));
        assert_eq!(parse_configuration_yaml(&text).unwrap(), config);
    }

    #[test]
    fn comments_only_is_empty() {
        let err = parse_configuration_yaml("# nothing here\n").unwrap_err();
        assert!(err.to_string().contains("Empty configuration"));
    }

    #[test]
    fn syntax_and_invariant_errors() {
        let err = parse_configuration_yaml("name: [unclosed").unwrap_err();
        assert!(err.is_io());

        let err = parse_configuration_yaml(
            "name: x\nattributes: {nodes: single, optimization: balanced, quantization: fp8}\nengine: {tp: 1}\nprefill: {tp: 1}\n",
        )
        .unwrap_err();
        assert!(err.is_structural());
        assert!(err.to_string().contains("Cannot have both 'engine' and 'prefill'/'decode'"));
    }
}
