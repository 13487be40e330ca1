use deployconf_compiler::*;
use deployconf_types::*;

fn compile(yaml: &str) -> VendorConfig {
    compile_with(yaml, &CompileOptions::default())
}

fn compile_with(yaml: &str, options: &CompileOptions) -> VendorConfig {
    let source = SourceDocument::from_yaml_str(yaml).unwrap();
    let mut vendors = VendorRegistry::default();
    vendors.insert("acme", "AcmeAI");
    compile_config(&source, &vendors, options).unwrap()
}

fn engine<'a>(doc: &'a VendorConfig, model: &str, hw: &str) -> &'a EngineConfig {
    let model = doc.families[0].model(model).unwrap();
    let configs = model.hardware[hw].configurations(None).unwrap();
    configs[0].engine().unwrap()
}

const BASIC: &str = r#"
vendor: acme
defaults:
  hardware:
    h100: {tp: 8}
    h200: {tp: 8}
    b200: {tp: 4}
  configurations:
    - name: default
families:
  - name: Foo
    description: Foo family
    models:
      - base_name: 7B
        quantizations: [fp8]
"#;

#[test]
fn name_construction_example() {
    let doc = compile(BASIC);
    let family = &doc.families[0];
    assert_eq!(family.description.as_deref(), Some("Foo family"));
    assert_eq!(family.models.len(), 1);
    let model = &family.models[0];
    assert_eq!(model.name, "Foo-7B-FP8");
    assert_eq!(model.model_path, "AcmeAI/Foo-7B-FP8");
    let hw: Vec<&str> = model.hardware.keys().map(String::as_str).collect();
    assert_eq!(hw, vec!["h100", "h200", "b200"]);
}

#[test]
fn built_in_defaults_fill_engine() {
    let doc = compile(
        r#"
vendor: acme
defaults:
  hardware: [h100]
  configurations:
    - name: default
families:
  - name: Foo
    models: [Foo-Tiny]
"#,
    );
    let model = &doc.families[0].models[0];
    assert_eq!(model.model_path, "AcmeAI/Foo-Tiny");
    assert_eq!(model.attributes.llm.thinking_capability, ThinkingCapability::NonThinking);

    let config = &model.hardware["h100"].configurations(None).unwrap()[0];
    assert_eq!(config.attributes.quantization, Quantization::Fp8);
    assert_eq!(config.attributes.nodes, Nodes::Single);
    assert_eq!(config.attributes.optimization, Optimization::Balanced);
    let e = config.engine().unwrap();
    assert_eq!(e.tp, 8);
    assert!(e.env_vars.is_empty());
    assert!(e.extra_args.is_empty());
    assert_eq!(e.dp, None);
    assert!(config.quantized_model_path.is_none());
}

#[test]
fn merge_precedence_highest_level_wins() {
    let doc = compile(
        r#"
vendor: acme
defaults:
  hardware:
    h100: {tp: 1, dp: 1, ep: 1, extra_args: [file]}
  configurations:
    - name: default
      tp: 99
      enable_dp_attention: true
families:
  - name: Foo
    hardware:
      default: {dp: 2, ep: 2}
      h100: {ep: 3, extra_args: [family]}
    models:
      - name: Foo-Explicit
        hardware:
          default: {dp: 4}
          h100: {tp: 2}
"#,
    );
    let e = engine(&doc, "Foo-Explicit", "h100");
    assert_eq!(e.tp, 2);
    assert_eq!(e.dp, Some(4));
    assert_eq!(e.ep, Some(3));
    assert_eq!(e.extra_args, vec!["family".to_string()]);
    assert_eq!(e.enable_dp_attention, Some(true));
}

#[test]
fn explicit_null_overrides_lower_levels() {
    let doc = compile(
        r#"
vendor: acme
defaults:
  hardware:
    h100: {dp: 2}
  configurations:
    - name: default
families:
  - name: Foo
    models:
      - name: Foo-Explicit
        hardware:
          h100: {dp: null}
"#,
    );
    assert_eq!(engine(&doc, "Foo-Explicit", "h100").dp, None);
}

#[test]
fn unquoted_engine_args_read_the_same_at_every_level() {
    let fragment = "{extra_args: [--max-running-requests, 128], env_vars: {NCCL_X: 1}}";
    let sources = [
        format!(
            "vendor: acme\ndefaults:\n  hardware:\n    h100: {f}\n  configurations:\n    - name: default\nfamilies:\n  - name: Foo\n    models:\n      - base_name: 7B\n        quantizations: [bf16]\n",
            f = fragment
        ),
        format!(
            "vendor: acme\ndefaults:\n  hardware: [h100]\n  configurations:\n    - name: default\nfamilies:\n  - name: Foo\n    hardware:\n      h100: {f}\n    models:\n      - base_name: 7B\n        quantizations: [bf16]\n",
            f = fragment
        ),
        format!(
            "vendor: acme\ndefaults:\n  hardware: [h100]\n  configurations:\n    - name: default\nfamilies:\n  - name: Foo\n    models:\n      - base_name: 7B\n        quantizations: [bf16]\n        hardware:\n          h100: {f}\n",
            f = fragment
        ),
        format!(
            "vendor: acme\ndefaults:\n  hardware: [h100]\n  configurations:\n    - name: default\nfamilies:\n  - name: Foo\n    models:\n      - name: Foo-7B\n        hardware:\n          h100: {f}\n",
            f = fragment
        ),
        format!(
            "vendor: acme\ndefaults:\n  hardware: [h100]\n  configurations:\n    - {{name: default, extra_args: [--max-running-requests, 128], env_vars: {{NCCL_X: 1}}}}\nfamilies:\n  - name: Foo\n    models:\n      - base_name: 7B\n        quantizations: [bf16]\n"
        ),
    ];

    for source in &sources {
        let doc = compile(source);
        let e = engine(&doc, "Foo-7B", "h100");
        assert_eq!(e.env_vars.get("NCCL_X").map(String::as_str), Some("1"), "{}", source);
        assert_eq!(e.extra_args, vec!["--max-running-requests", "128"], "{}", source);
    }
}

#[test]
fn model_hardware_keys_narrow_the_list() {
    let doc = compile(
        r#"
vendor: acme
defaults:
  hardware:
    h100: {}
    h200: {}
    b200: {}
  configurations:
    - name: default
families:
  - name: Foo
    hardware:
      h100: {tp: 8}
      mi300x: {tp: 8}
    models:
      - base_name: 7B
        quantizations: [bf16]
        hardware:
          default: {tp: 4}
          b200: {}
          h200: {}
"#,
    );
    let model = &doc.families[0].models[0];
    let hw: Vec<&str> = model.hardware.keys().map(String::as_str).collect();
    assert_eq!(hw, vec!["b200", "h200"]);
    assert_eq!(engine(&doc, "Foo-7B", "b200").tp, 4);
}

#[test]
fn family_hardware_keys_used_only_without_defaults() {
    let source = r#"
vendor: acme
defaults:
  hardware: [h100, h200, b200]
  configurations:
    - name: default
families:
  - name: Foo
    hardware:
      h200: {tp: 4}
    models: [Foo-A]
"#;
    let doc = compile(source);
    let hw: Vec<&str> = doc.families[0].models[0].hardware.keys().map(String::as_str).collect();
    assert_eq!(hw, vec!["h200"]);

    let with_default = source.replace("      h200: {tp: 4}", "      default: {dp: 2}\n      h200: {tp: 4}");
    let doc = compile(&with_default);
    let hw: Vec<&str> = doc.families[0].models[0].hardware.keys().map(String::as_str).collect();
    assert_eq!(hw, vec!["h100", "h200", "b200"]);
    assert_eq!(engine(&doc, "Foo-A", "h200").tp, 4);
    assert_eq!(engine(&doc, "Foo-A", "h100").dp, Some(2));
}

#[test]
fn variant_count_and_order() {
    let doc = compile(
        r#"
vendor: acme
defaults:
  hardware: [h100]
  configurations:
    - name: default
families:
  - name: Foo
    model_name_suffix:
      instruct: -Instruct
      thinking: -Thinking
    models:
      - base_name: 30B
        capabilities: [instruct, thinking]
        quantizations: [bf16, fp8]
"#,
    );
    let names: Vec<&str> = doc.families[0].models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Foo-30B-Instruct",
            "Foo-30B-Instruct-FP8",
            "Foo-30B-Thinking",
            "Foo-30B-Thinking-FP8"
        ]
    );
}

#[test]
fn default_capabilities_and_quantizations() {
    let doc = compile(
        r#"
vendor: acme
defaults:
  hardware: [h100]
  configurations:
    - name: default
families:
  - name: Foo
    models:
      - base_name: 7B
"#,
    );
    let names: Vec<&str> = doc.families[0].models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Foo-7B", "Foo-7B-FP8"]);
}

#[test]
fn valid_quants_filtering() {
    let source = r#"
vendor: acme
defaults:
  hardware:
    h100: {valid_quants: [fp8]}
    b200: {}
  configurations:
    - name: default
families:
  - name: Foo
    models:
      - base_name: 7B
        quantizations: [bf16, fp8]
"#;
    let doc = compile(source);
    let models = &doc.families[0].models;
    assert_eq!(models.len(), 2);
    assert!(!models[0].hardware.contains_key("h100"));
    assert!(models[0].hardware.contains_key("b200"));
    assert!(models[1].hardware.contains_key("h100"));

    let only_h100 = source.replace("    b200: {}\n", "");
    let doc = compile(&only_h100);
    let names: Vec<&str> = doc.families[0].models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Foo-7B-FP8"]);
}

#[test]
fn explicit_models_ignore_valid_quants() {
    let doc = compile(
        r#"
vendor: acme
defaults:
  hardware:
    h100: {valid_quants: [fp8]}
  configurations:
    - name: default
families:
  - name: Foo
    models:
      - name: Foo-BF16
        quantization: bf16
        model_path: custom/path
"#,
    );
    let model = &doc.families[0].models[0];
    assert_eq!(model.model_path, "custom/path");
    let config = &model.hardware["h100"].configurations(None).unwrap()[0];
    assert_eq!(config.attributes.quantization, Quantization::Bf16);
}

#[test]
fn quantized_paths_and_overrides() {
    let doc = compile(
        r#"
vendor: acme
defaults:
  hardware:
    h100: {tp: 8}
  configurations:
    - name: default
families:
  - name: Foo
    models:
      - base_name: 7B
        quantizations: [bf16, fp8]
        quantized_paths:
          fp8: other-org/Foo-7B-FP8-dynamic
        quant_overrides:
          fp8: {tp: 4, ep: 2}
"#,
    );
    let models = &doc.families[0].models;
    assert_eq!(models[0].model_path, "AcmeAI/Foo-7B");
    assert_eq!(models[1].model_path, "other-org/Foo-7B-FP8-dynamic");
    assert_eq!(engine(&doc, "Foo-7B", "h100").tp, 8);
    let fp8 = engine(&doc, "Foo-7B-FP8", "h100");
    assert_eq!(fp8.tp, 4);
    assert_eq!(fp8.ep, Some(2));
}

#[test]
fn top_level_quant_override_convention() {
    let source = r#"
vendor: acme
defaults:
  hardware: [h100]
  configurations:
    - name: default
families:
  - name: Foo
    models:
      - base_name: 7B
        quantizations: [fp8]
        fp8: {tp: 2}
        quant_overrides:
          fp8: {tp: 1}
"#;
    assert_eq!(engine(&compile(source), "Foo-7B-FP8", "h100").tp, 1);

    let options = CompileOptions {
        conventions: SourceConventions {
            quant_override_key: QuantOverrideKey::TopLevel,
            ..SourceConventions::default()
        },
        ..CompileOptions::default()
    };
    assert_eq!(engine(&compile_with(source, &options), "Foo-7B-FP8", "h100").tp, 2);
}

#[test]
fn capability_suffix_convention_and_table_choice() {
    let source = r#"
vendor: acme
defaults:
  hardware: [h100]
  configurations:
    - name: default
families:
  - name: Foo
    capability_suffix:
      instruct: -it
      thinking: -think
    model_name_suffix:
      instruct: -Instruct
    models:
      - base_name: 7B
        capabilities: [instruct, thinking]
        quantizations: [bf16]
        capability_suffix:
          instruct: -IT
"#;
    let names = |doc: &VendorConfig| -> Vec<String> {
        doc.families[0].models.iter().map(|m| m.name.clone()).collect()
    };
    assert_eq!(names(&compile(source)), vec!["Foo-7B-Instruct", "Foo-7B"]);

    let options = CompileOptions {
        conventions: SourceConventions {
            capability_suffix_key: CapabilitySuffixKey::CapabilitySuffix,
            ..SourceConventions::default()
        },
        ..CompileOptions::default()
    };
    // The model table replaces the family one, so thinking falls to the built-in
    assert_eq!(names(&compile_with(source, &options)), vec!["Foo-7B-IT", "Foo-7B"]);
}

#[test]
fn model_suffix_table_replaces_family_table() {
    let doc = compile(
        r#"
vendor: acme
defaults:
  hardware: [h100]
  configurations:
    - name: default
families:
  - name: Foo
    model_name_suffix:
      thinking: -Thinking
    quant_suffix:
      fp8: -F8
      int4: -Q4
    models:
      - base_name: 7B
        capabilities: [thinking]
        quantizations: [fp8, int4]
        model_name_suffix:
          instruct: -Instruct
        quant_suffix:
          fp8: -8bit
      - base_name: 8B
        capabilities: [thinking]
        quantizations: [int4]
"#,
    );
    let names: Vec<&str> = doc.families[0].models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Foo-7B-8bit", "Foo-7B-INT4", "Foo-8B-Thinking-Q4"]);
    assert_eq!(
        doc.families[0].model("Foo-7B-8bit").unwrap().model_path,
        "AcmeAI/Foo-7B-8bit"
    );
}

#[test]
fn attribute_inference_end_to_end() {
    let doc = compile(
        r#"
vendor: acme
defaults:
  hardware: [h100]
  configurations:
    - name: default
families:
  - name: Foo
    llm:
      thinking_capability: null
      tool_parser: qwen25
      reasoning_parser: qwen3
    model_name_suffix:
      thinking: -Thinking
      instruct: -Instruct
    models:
      - base_name: 7B
        capabilities: [thinking, base, instruct]
        quantizations: [bf16]
      - base_name: 8B
        capabilities: [base]
        quantizations: [bf16]
        thinking_capability: hybrid
"#,
    );
    let llm = |name: &str| doc.families[0].model(name).unwrap().attributes.llm.clone();

    let thinking = llm("Foo-7B-Thinking");
    assert_eq!(thinking.thinking_capability, ThinkingCapability::Thinking);
    assert_eq!(thinking.reasoning_parser.as_deref(), Some("qwen3"));
    assert_eq!(thinking.tool_parser.as_deref(), Some("qwen25"));

    let base = llm("Foo-7B");
    assert_eq!(base.thinking_capability, ThinkingCapability::NonThinking);
    assert_eq!(base.reasoning_parser, None);

    assert_eq!(llm("Foo-7B-Instruct").reasoning_parser, None);

    let hybrid = llm("Foo-8B");
    assert_eq!(hybrid.thinking_capability, ThinkingCapability::Hybrid);
    assert_eq!(hybrid.reasoning_parser.as_deref(), Some("qwen3"));
}

#[test]
fn versioned_layout() {
    let options = CompileOptions {
        layout: SchemaLayout::Versioned("v0.5.6".to_string()),
        ..CompileOptions::default()
    };
    let doc = compile_with(BASIC, &options);
    let hw = &doc.families[0].models[0].hardware["h100"];
    assert!(hw.is_versioned());
    assert_eq!(hw.configurations(Some("v0.5.6")).unwrap().len(), 1);
}

#[test]
fn unknown_vendor_falls_back_to_literal_id() {
    let source = SourceDocument::from_yaml_str(&BASIC.replace("vendor: acme", "company: other")).unwrap();
    let doc = compile_config(&source, &VendorRegistry::default(), &CompileOptions::default()).unwrap();
    assert_eq!(doc.vendor, "other");
    assert_eq!(doc.families[0].models[0].model_path, "other/Foo-7B-FP8");
}

#[test]
fn missing_vendor_is_an_error() {
    let source = SourceDocument::from_yaml_str("families: []").unwrap();
    let err = compile_config(&source, &VendorRegistry::default(), &CompileOptions::default()).unwrap_err();
    assert!(err.to_string().contains("Model config must specify 'vendor' or 'company'"));
}

#[test]
fn invalid_merged_values_are_rejected() {
    let source = SourceDocument::from_yaml_str(&BASIC.replace("b200: {tp: 4}", "b200: {tp: 0}")).unwrap();
    let err = compile_config(&source, &VendorRegistry::default(), &CompileOptions::default()).unwrap_err();
    assert!(err.is_structural());
    assert!(err.to_string().contains("b200"));
}

#[test]
fn duplicate_generated_names_fail_validation() {
    let source = SourceDocument::from_yaml_str(
        r#"
vendor: acme
defaults:
  hardware: [h100]
  configurations:
    - name: default
families:
  - name: Foo
    models:
      - base_name: 7B
        quantizations: [fp8]
      - Foo-7B-FP8
"#,
    )
    .unwrap();
    let err = compile_config(&source, &VendorRegistry::default(), &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, DeployConfError::Validation { .. }));
}

#[test]
fn compiled_output_round_trips_through_yaml() {
    let doc = compile(BASIC);
    let text = serde_yaml::to_string(&doc).unwrap();
    assert!(text.contains("prefill: null"));
    assert!(text.contains("llm:"));
    let back: VendorConfig = serde_yaml::from_str(&text).unwrap();
    assert_eq!(back, doc);
}
