//! Runs the `fdb-replay` binary against scenario files.

use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

const SCENARIO: &str = r#"
objects:
  ports: [1, 2]
  lags: [1]
  vlans: [10, 20]
steps:
  - op: register
    mac: "00:11:22:33:44:55"
    vlan: 10
  - op: learn
    mac: "00:11:22:33:44:55"
    vlan: 10
    port: "port:1"
  - op: learn
    mac: "00:11:22:33:44:66"
    vlan: 20
    port: "lag:1"
    entry_type: static
  - op: drain
  - op: move
    mac: "00:11:22:33:44:55"
    vlan: 10
    port: "port:2"
  - op: flush
    vlan: 20
    entry_type: dynamic
  - op: dump
  - op: age
    mac: "00:11:22:33:44:55"
    vlan: 10
  - op: drain
"#;

fn replay(scenario: &str, extra: &[&str]) -> Output {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(scenario.as_bytes()).unwrap();
    run(&path, &dir.path().join("absent.toml"), extra)
}

fn run(scenario: &Path, config: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fdb-replay"))
        .arg(scenario)
        .arg("--config")
        .arg(config)
        .args(["--log-level", "error"])
        .args(extra)
        .output()
        .unwrap()
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_replay_json_output() {
    let output = replay(SCENARIO, &["--json"]);
    assert!(output.status.success());

    let lines = json_lines(&output);
    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0]["event"], "learned");
    assert_eq!(lines[0]["key"]["mac"], "00:11:22:33:44:55");
    assert_eq!(lines[0]["key"]["vlan"], 10);

    // The static LAG entry survives the dynamic flush.
    let dump = &lines[1];
    assert_eq!(dump["entries"].as_array().unwrap().len(), 2);
    assert_eq!(dump["registered"][0]["in_changelist"], true);

    // Move then age collapse onto one AGED notification.
    assert_eq!(lines[2]["event"], "aged");
    assert_eq!(lines[2]["port"], 0x0001_0000_0000_0002_u64);
}

#[test]
fn test_replay_text_output() {
    let output = replay(SCENARIO, &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("learned MAC:00:11:22:33:44:55 vlan:10"));
    assert!(stdout.contains("Total entries: 2"));
    assert!(stdout.contains("Total registered: 1"));
}

#[test]
fn test_strict_mode_fails_on_bad_step() {
    let scenario = r#"
objects:
  ports: [1]
  vlans: [10]
steps:
  - op: age
    mac: "00:11:22:33:44:55"
    vlan: 10
"#;
    assert!(replay(scenario, &[]).status.success());
    assert!(!replay(scenario, &["--strict"]).status.success());
}

#[test]
fn test_missing_scenario_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(
        &dir.path().join("missing.yaml"),
        &dir.path().join("absent.toml"),
        &[],
    );
    assert!(!output.status.success());
}

#[test]
fn test_zero_batch_size_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = dir.path().join("scenario.yaml");
    std::fs::write(&scenario, SCENARIO).unwrap();
    let config = dir.path().join("cache.toml");
    std::fs::write(&config, "notification_batch_size = 0\n").unwrap();

    let output = run(&scenario, &config, &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("notification_batch_size"));
}

#[test]
fn test_teardown_flushes_owned_entries() {
    let scenario = r#"
objects:
  ports: [1]
  vlans: [10]
steps:
  - op: register
    mac: "00:11:22:33:44:55"
    vlan: 10
  - op: learn
    mac: "00:11:22:33:44:55"
    vlan: 10
    port: "port:1"
  - op: teardown
    object: "port:1"
  - op: drain
"#;
    let output = replay(scenario, &["--json", "--strict"]);
    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["event"], "flushed");
}
