use deployconf_compiler::*;
use std::fs;
use std::path::Path;

const VALID: &str = r#"
ui_options:
  hardware: [h100, b200]
  quantization: [fp8]
  scenario: [chat]
  gpu_count: [8]
configs:
  - hardware: h100
    quantization: fp8
    scenario: chat
    gpu_count: 8
    parameters:
      model_path: deepseek-ai/DeepSeek-R1
      note: "模型"
"#;

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn compiles_to_pretty_json_with_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let out = dir.path().join("generated");
    write(&src.join("v0.5.9/deepseek-r1.yaml"), VALID);

    let report = run_batch(&OptimalCompiler::default(), &BatchJob::new(&src, &out)).unwrap();
    assert!(report.is_success());

    let text = fs::read_to_string(out.join("v0.5.9/deepseek-r1.json")).unwrap();
    assert!(text.ends_with("}\n"));
    assert!(text.starts_with("{\n  \"ui_options\": {\n    \"hardware\": ["));
    assert!(text.contains("\"note\": \"模型\""));

    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["ui_options", "configs", "model", "version"]);
    assert_eq!(value["model"], "deepseek-r1");
    assert_eq!(value["version"], "v0.5.9");

    let check = run_batch(&OptimalCompiler::default(), &BatchJob::new(&src, &out).check_only(true)).unwrap();
    assert!(check.is_success());
}

#[test]
fn fallback_version_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("src/qwen.yaml");
    write(&input, VALID);

    let value = OptimalCompiler::new("v1.0.0").compile_value(&input).unwrap();
    assert_eq!(value["version"], "v1.0.0");
    assert_eq!(value["model"], "qwen");
}

#[test]
fn validation_collects_every_problem() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.yaml");
    write(
        &input,
        r#"
ui_options:
  hardware: h100
  quantization: [fp8]
  scenario: [chat]
configs:
  - hardware: ""
    quantization: fp8
    scenario: chat
    parameters: {}
  - hardware: h100
    quantization: fp8
    scenario: chat
    gpu_count: 8
    parameters: {tp: 8}
"#,
    );

    let err = OptimalCompiler::default().compile_value(&input).unwrap_err();
    assert_eq!(
        err.messages(),
        vec![
            "bad.yaml: 'ui_options.hardware' must be an array".to_string(),
            "bad.yaml: 'ui_options.gpu_count' is required".to_string(),
            "bad.yaml configs[0]: 'hardware' is required".to_string(),
            "bad.yaml configs[0]: 'gpu_count' is required".to_string(),
            "bad.yaml configs[0]: 'parameters' is required".to_string(),
            "bad.yaml configs[1]: 'parameters.model_path' is required".to_string(),
        ]
    );
}

#[test]
fn missing_top_level_sections() {
    let config = serde_json::json!({"model": "x"});
    let errors = validate_optimal_config(config.as_object().unwrap(), "x.yaml");
    assert_eq!(
        errors,
        vec![
            "x.yaml: 'ui_options' is required".to_string(),
            "x.yaml: 'configs' is required".to_string(),
        ]
    );

    let config = serde_json::json!({"ui_options": {"hardware": [], "quantization": [], "scenario": [], "gpu_count": []}, "configs": {}});
    let errors = validate_optimal_config(config.as_object().unwrap(), "x.yaml");
    assert_eq!(errors, vec!["x.yaml: 'configs' must be an array".to_string()]);
}

#[test]
fn stale_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let out = dir.path().join("generated");
    write(&src.join("a.yaml"), VALID);
    write(&out.join("a.json"), "{\"model\": \"a\"}\n");

    let report = run_batch(&OptimalCompiler::default(), &BatchJob::new(&src, &out).check_only(true)).unwrap();
    assert_eq!(report.results[0].outcome, FileOutcome::Stale);
}

#[test]
fn integer_mapping_keys_are_written_as_strings() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("src/v0.5.9/glm.yaml");
    write(
        &input,
        r#"
ui_options:
  hardware: [h100]
  quantization: [fp8]
  scenario: [chat]
  gpu_count: [8]
configs:
  - hardware: h100
    quantization: fp8
    scenario: chat
    gpu_count: 8
    parameters:
      model_path: zai-org/GLM-4.5
      cuda_graph_bs:
        8: 256
        16: 128
"#,
    );

    let value = OptimalCompiler::default().compile_value(&input).unwrap();
    let table = value["configs"][0]["parameters"]["cuda_graph_bs"].as_object().unwrap();
    let keys: Vec<&str> = table.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["8", "16"]);
    assert_eq!(table["16"], 128);
}
