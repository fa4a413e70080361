//! End-to-end tests driving the built binary: parent process, child processes, configuration files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;

const MARKERS: &str = "Microsoft.VisualStudio.TestTools.UnitTesting";

fn attrun(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_attrun"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_unit(dir: &TempDir, file: &str, class: &str, body: Value) -> PathBuf {
    let manifest = json!({
        "format": "attrun-unit/1",
        "types": [{
            "name": class,
            "markers": [format!("{MARKERS}.TestClassAttribute")],
            "methods": [{ "name": "Runs", "markers": [format!("{MARKERS}.TestMethodAttribute")], "body": body }],
        }],
    });
    let path = dir.path().join(file);
    fs::write(&path, manifest.to_string()).unwrap();
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_passing_unit_exits_zero() {
    let dir = TempDir::new().unwrap();
    let unit = write_unit(&dir, "passing.json", "Sample.Passing", json!([]));

    let output = attrun(&[arg(&unit)]);

    let text = stdout(&output);
    assert!(output.status.success(), "{text}");
    assert!(text.contains("Sample.Passing"), "{text}");
    assert!(text.contains("1 passed"), "{text}");
}

#[test]
fn test_one_failing_unit_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let passing = write_unit(&dir, "passing.json", "Sample.Passing", json!([]));
    let failing = write_unit(
        &dir,
        "failing.json",
        "Sample.Failing",
        json!([{ "throw": { "type": "System.InvalidOperationException", "message": "nope" } }]),
    );

    let output = attrun(&[arg(&passing), arg(&failing)]);

    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(1), "{text}");
    assert!(text.contains("1 passed, 1 failed"), "{text}");
    assert!(text.contains("System.InvalidOperationException: nope"), "{text}");
}

#[test]
fn test_child_mode_writes_the_event_stream() {
    let dir = TempDir::new().unwrap();
    let failing = write_unit(
        &dir,
        "failing.json",
        "Sample.Failing",
        json!([{ "throw": { "type": "System.InvalidOperationException", "message": "nope" } }]),
    );

    let output = attrun(&["--single-unit", arg(&failing)]);

    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(1));
    assert!(text.lines().all(|line| line.starts_with("@@attrun-event@@ ")), "{text}");
    assert!(text.contains("@@attrun-event@@ MethodUnexpectedExceptionEvent"), "{text}");
    assert!(text.contains(r#""fullName":"System.InvalidOperationException""#), "{text}");
}

#[test]
fn test_each_unit_sees_its_own_configuration() {
    let dir = TempDir::new().unwrap();
    let first = write_unit(
        &dir,
        "first.json",
        "Sample.First",
        json!([{ "assertSetting": { "key": "endpoint", "equals": "http://first" } }]),
    );
    let second = write_unit(
        &dir,
        "second.json",
        "Sample.Second",
        json!([{ "assertSetting": { "key": "endpoint", "equals": "http://second" } }]),
    );
    fs::write(dir.path().join("first.json.config"), "[app_settings]\nendpoint = \"http://first\"\n").unwrap();
    fs::write(dir.path().join("second.json.config"), "[app_settings]\nendpoint = \"http://second\"\n").unwrap();

    let output = attrun(&[arg(&first), arg(&second)]);

    let text = stdout(&output);
    assert!(output.status.success(), "{text}");
    assert!(text.contains("2 passed"), "{text}");
}

#[test]
fn test_broken_configuration_is_reported() {
    let dir = TempDir::new().unwrap();
    let unit = write_unit(&dir, "unit.json", "Sample.Configured", json!([]));
    fs::write(dir.path().join("unit.json.config"), "[app_settings\n").unwrap();

    let output = attrun(&[arg(&unit)]);

    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(1), "{text}");
    assert!(text.contains("invalid configuration file"), "{text}");
}

#[test]
fn test_foreign_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let readme = dir.path().join("README.txt");
    fs::write(&readme, "not a unit").unwrap();

    let output = attrun(&[arg(&readme)]);

    let text = stdout(&output);
    assert!(output.status.success(), "{text}");
    assert!(text.contains("skipped, not a test unit"), "{text}");
}

#[test]
fn test_missing_unit_exits_one() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");

    let output = attrun(&[arg(&missing)]);

    let text = stdout(&output);
    assert_eq!(output.status.code(), Some(1), "{text}");
    assert!(text.contains("not found"), "{text}");
}

#[test]
fn test_no_arguments_prints_usage() {
    let output = attrun(&[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("UNIT"));
}
