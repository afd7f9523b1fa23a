use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use tempfile::TempDir;

fn run_graph(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_livecanvas"))
        .env_remove("LIVECANVAS_CONFIG")
        .env("RUST_LOG", "warn")
        .arg("graph")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn livecanvas graph");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write samples");
    child.wait_with_output().expect("failed to wait for livecanvas")
}

#[test]
fn graph_reports_stats_for_numeric_lines() {
    let output = run_graph(&[], "1\n2\nabc\n3\n");
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim_end(), "Points: 3   Average: 2.00");
}

#[test]
fn graph_with_no_input_reports_zero_points() {
    let output = run_graph(&[], "");
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim_end(), "Points: 0   Average: 0.00");
}

#[test]
fn emitted_ops_reuse_one_background_gradient() {
    let input: String = (1..=20).map(|n| format!("{n}\n")).collect();
    let output = run_graph(&["--emit-ops"], &input);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.pop(), Some("Points: 20   Average: 10.50"));

    let calls: Vec<Value> = lines
        .iter()
        .map(|line| serde_json::from_str(line).expect("each call is one JSON line"))
        .collect();
    assert_eq!(calls[0]["primitive"], "createLinearGradient");

    let gradients = calls
        .iter()
        .filter(|call| call["primitive"] == "createLinearGradient")
        .count();
    assert_eq!(gradients, 1);

    let background_fills: Vec<&Value> = calls
        .iter()
        .filter(|call| call["primitive"] == "fillStyle" && call["args"][0].is_object())
        .collect();
    assert!(!background_fills.is_empty());
    for fill in background_fills {
        assert_eq!(fill["args"][0]["handle"], "linearGradient");
        assert_eq!(fill["args"][0]["id"], 1);
    }
}

#[test]
fn config_file_is_validated() {
    let root = TempDir::new().unwrap();
    let config_path = root.path().join("livecanvas.toml");
    fs::write(&config_path, "version = 2\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_livecanvas"))
        .env_remove("LIVECANVAS_CONFIG")
        .arg("graph")
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("failed to run livecanvas graph");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unsupported config version 2"), "{stderr}");
}

#[test]
fn config_can_come_from_the_environment() {
    let root = TempDir::new().unwrap();
    let config_path = root.path().join("livecanvas.toml");
    fs::write(
        &config_path,
        "version = 1\n[graph]\nwidth = 400\nheight = 200\npadding = 20\n",
    )
    .unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_livecanvas"))
        .env("LIVECANVAS_CONFIG", &config_path)
        .args(["graph", "--emit-ops"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn livecanvas graph");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"5\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let clear: Value = stdout
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find(|call| call["primitive"] == "clearRect")
        .expect("a clearRect call");
    assert_eq!(clear["args"][2], 400.0);
    assert_eq!(clear["args"][3], 200.0);
}
