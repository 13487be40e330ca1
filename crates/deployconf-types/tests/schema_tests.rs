use deployconf_types::*;

fn attrs(q: Quantization) -> ConfigAttributes {
    ConfigAttributes::new(Nodes::Single, Optimization::Balanced, q)
}

#[test]
fn enum_wire_names() {
    assert_eq!(Optimization::LowLatency.as_str(), "low-latency");
    assert_eq!(
        serde_json::to_string(&Optimization::HighThroughput).unwrap(),
        "\"high-throughput\""
    );
    assert_eq!(
        serde_json::to_string(&ThinkingCapability::NonThinking).unwrap(),
        "\"non_thinking\""
    );
    assert_eq!("fp4".parse::<Quantization>().unwrap(), Quantization::Fp4);
    assert!("fp16".parse::<Quantization>().is_err());
    assert!("medium".parse::<Optimization>().is_err());
    assert_eq!("multi".parse::<Nodes>().unwrap(), Nodes::Multi);
}

#[test]
fn engine_config_defaults_optional_fields() {
    let engine: EngineConfig = serde_yaml::from_str("tp: 4").unwrap();
    assert_eq!(engine.tp, 4);
    assert!(engine.env_vars.is_empty());
    assert!(engine.extra_args.is_empty());
    assert_eq!(engine.dp, None);

    let engine: EngineConfig =
        serde_yaml::from_str("tp: 8\nenv_vars: null\nextra_args: null\ndp: 2").unwrap();
    assert!(engine.env_vars.is_empty());
    assert_eq!(engine.dp, Some(2));
}

#[test]
fn engine_config_rejects_bad_degrees() {
    assert!(serde_yaml::from_str::<EngineConfig>("tp: 0").is_err());
    assert!(serde_yaml::from_str::<EngineConfig>("tp: 8\ndp: 0").is_err());
    assert!(serde_yaml::from_str::<EngineConfig>("tp: 8\nep: -1").is_err());
    assert!(serde_yaml::from_str::<EngineConfig>("dp: 2").is_err());
    assert!(EngineConfig::new(0).is_err());

    let mut engine = EngineConfig::new(2).unwrap();
    engine.ep = Some(0);
    assert!(engine.validate().is_err());
}

#[test]
fn named_configuration_unified_serializes_null_phases() {
    let engine = EngineConfig::new(8)
        .unwrap()
        .with_env("NCCL_DEBUG", "INFO")
        .with_extra_args(["--trust-remote-code"]);
    let config = NamedConfiguration::unified("default", attrs(Quantization::Fp8), engine).unwrap();

    let value = serde_json::to_value(&config).unwrap();
    assert_eq!(value["name"], "default");
    assert_eq!(value["attributes"]["quantization"], "fp8");
    assert!(value["quantized_model_path"].is_null());
    assert!(value["prefill"].is_null());
    assert!(value["decode"].is_null());
    assert_eq!(value["engine"]["tp"], 8);
    assert!(value["engine"]["dp"].is_null());
    assert_eq!(value["engine"]["env_vars"]["NCCL_DEBUG"], "INFO");

    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(
        keys,
        vec![
            "name",
            "attributes",
            "quantized_model_path",
            "engine",
            "prefill",
            "decode"
        ]
    );
}

#[test]
fn named_configuration_phase_split() {
    let config = NamedConfiguration::phase_split(
        "disagg",
        attrs(Quantization::Bf16),
        EngineConfig::new(4).unwrap(),
        EngineConfig::new(8).unwrap().with_dp(2),
    )
    .unwrap();
    assert!(config.is_phase_split());
    assert!(config.engine().is_none());
    assert_eq!(config.prefill().unwrap().tp, 4);
    assert_eq!(config.decode().unwrap().dp, Some(2));

    let yaml = serde_yaml::to_string(&config).unwrap();
    let back: NamedConfiguration = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, config);
}

#[test]
fn named_configuration_engine_exclusivity() {
    let e = || Some(EngineConfig::new(1).unwrap());
    let a = attrs(Quantization::Fp8);

    let err = NamedConfiguration::from_parts("x", a, None, e(), e(), None).unwrap_err();
    assert!(err.to_string().contains("Cannot have both 'engine' and 'prefill'/'decode'"));

    let err = NamedConfiguration::from_parts("x", a, None, None, e(), None).unwrap_err();
    assert!(err.to_string().contains("'prefill' requires 'decode'"));

    let err = NamedConfiguration::from_parts("x", a, None, None, None, e()).unwrap_err();
    assert!(err.to_string().contains("'decode' requires 'prefill'"));

    let err = NamedConfiguration::from_parts("x", a, None, None, None, None).unwrap_err();
    assert!(err.to_string().contains("Neither is currently set"));
    assert!(matches!(err, DeployConfError::InvariantViolation { .. }));
}

#[test]
fn named_configuration_rejects_empty_name() {
    let err = NamedConfiguration::unified(
        "  ",
        attrs(Quantization::Fp8),
        EngineConfig::new(1).unwrap(),
    )
    .unwrap_err();
    assert!(err.is_structural());
}

#[test]
fn named_configuration_deserialize_enforces_invariant() {
    let yaml = r#"
name: broken
attributes: {nodes: single, optimization: balanced, quantization: fp8}
prefill: {tp: 4}
"#;
    let err = serde_yaml::from_str::<NamedConfiguration>(yaml).unwrap_err();
    assert!(err.to_string().contains("'prefill' requires 'decode'"));
}

#[test]
fn hardware_config_layouts() {
    let flat: HardwareConfig = serde_yaml::from_str("configurations: []").unwrap();
    assert!(!flat.is_versioned());
    assert_eq!(flat.total_configurations(), 0);

    let yaml = r#"
versions:
  v0.5.6:
    configurations:
      - name: default
        attributes: {nodes: single, optimization: balanced, quantization: fp8}
        engine: {tp: 8}
"#;
    let versioned: HardwareConfig = serde_yaml::from_str(yaml).unwrap();
    assert!(versioned.is_versioned());
    assert_eq!(versioned.total_configurations(), 1);
    assert!(versioned.configurations(Some("v0.5.6")).is_some());
    assert!(versioned.configurations(None).is_none());

    assert!(serde_yaml::from_str::<HardwareConfig>("{}").is_err());
    assert!(serde_yaml::from_str::<HardwareConfig>("configurations: []\nversions: {}").is_err());
}

#[test]
fn model_attributes_accept_flat_and_wrapped() {
    let wrapped: ModelAttributes =
        serde_yaml::from_str("llm:\n  thinking_capability: hybrid\n  tool_parser: qwen25")
            .unwrap();
    let flat: ModelAttributes =
        serde_yaml::from_str("thinking_capability: hybrid\ntool_parser: qwen25").unwrap();
    assert_eq!(wrapped, flat);
    assert_eq!(flat.llm.tool_parser.as_deref(), Some("qwen25"));

    let value = serde_json::to_value(&flat).unwrap();
    assert_eq!(value["llm"]["thinking_capability"], "hybrid");
    assert!(value["llm"]["reasoning_parser"].is_null());
}

#[test]
fn vendor_config_accepts_company_alias() {
    let yaml = r#"
company: acme
families:
  - name: Foo
    models:
      - name: Foo-7B
        model_path: acme/Foo-7B
        attributes: {thinking_capability: non_thinking}
        hardware:
          h100:
            configurations: []
"#;
    let doc: VendorConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(doc.vendor, "acme");
    assert_eq!(doc.model_count(), 1);
    let model = doc.family("Foo").unwrap().model("Foo-7B").unwrap();
    assert!(model.hardware.contains_key("h100"));

    let out = serde_json::to_value(&doc).unwrap();
    assert_eq!(out["vendor"], "acme");
    assert!(out.get("company").is_none());
}
