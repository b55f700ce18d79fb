use assert_cmd::prelude::*;
use serde_json::Value;
use std::process::Command;
use tempfile::TempDir;

/// Isolated command: no user config file, no inherited API keys.
fn webpilot(home: &TempDir) -> Command {
    let bin = assert_cmd::cargo::cargo_bin!("webpilot");
    let mut cmd = Command::new(bin);
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("WEBPILOT__LLM__API_KEYS")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("utf8 output");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn tools_lists_builtin_catalog_as_json() {
    let home = TempDir::new().expect("tempdir");
    let assert = webpilot(&home)
        .args(["tools", "--output", "json"])
        .assert()
        .success();

    let value = stdout_json(assert.get_output());
    let names: Vec<&str> = value
        .as_array()
        .expect("array of descriptors")
        .iter()
        .filter_map(|tool| tool["name"].as_str())
        .collect();
    assert!(names.contains(&"navigate"));
    assert!(names.contains(&"take_screenshot"));
    assert!(names.contains(&"select_option"));
}

#[test]
fn tools_prompt_matches_planner_catalog() {
    let home = TempDir::new().expect("tempdir");
    let assert = webpilot(&home).args(["tools", "--prompt"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 output");
    assert!(stdout.starts_with("Available browser tools:"));
    assert!(stdout.contains("• click:"));
}

#[test]
fn config_show_masks_api_keys() {
    let home = TempDir::new().expect("tempdir");
    let assert = webpilot(&home)
        .env("OPENAI_API_KEY", "sk-test-secret-9876")
        .args(["config", "show", "--output", "json"])
        .assert()
        .success();

    let value = stdout_json(assert.get_output());
    assert_eq!(value["agent"]["max_iterations"].as_u64(), Some(5));
    assert_eq!(value["llm"]["api_keys"][0].as_str(), Some("****9876"));
    assert!(!value.to_string().contains("sk-test-secret"));
}

#[test]
fn config_file_overrides_defaults() {
    let home = TempDir::new().expect("tempdir");
    let file = home.path().join("custom.yaml");
    std::fs::write(&file, "agent:\n  max_iterations: 9\n").expect("write config");

    let assert = webpilot(&home)
        .args(["--config", file.to_str().expect("utf8 path")])
        .args(["config", "show", "--output", "json"])
        .assert()
        .success();

    let value = stdout_json(assert.get_output());
    assert_eq!(value["agent"]["max_iterations"].as_u64(), Some(9));
}

#[test]
fn missing_config_file_is_an_error() {
    let home = TempDir::new().expect("tempdir");
    let file = home.path().join("absent.yaml");
    webpilot(&home)
        .args(["--config", file.to_str().expect("utf8 path"), "config", "show"])
        .assert()
        .failure();
}

#[test]
fn run_without_api_key_fails_before_launching_browser() {
    let home = TempDir::new().expect("tempdir");
    let assert = webpilot(&home)
        .args(["run", "--goal", "open example.com"])
        .assert()
        .failure();

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8 output");
    assert!(stderr.contains("API key"), "stderr was: {stderr}");
}

#[test]
fn run_rejects_blank_goal() {
    let home = TempDir::new().expect("tempdir");
    webpilot(&home)
        .env("OPENAI_API_KEY", "sk-unused")
        .args(["run", "--goal", "   "])
        .assert()
        .failure();
}
