//! CLI command integration tests.
//! Each test writes its scenario into its own temp directory.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const GUARD: &str = r#"
[run]
frames = 10
dt = 1.0

[[sensors]]
name = "guard"
cooldown = 30.0

[[sensors.cones]]
fov = 60
range = 5.0
awareness = "medium"

[[signals]]
name = "walker"
position = [0.0, 0.0, 8.0]
velocity = [0.0, 0.0, -1.0]
"#;

fn perceive_cmd() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("perceive").unwrap()
}

fn write_scenario(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("scenario.toml");
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn check_valid_scenario() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(&dir, GUARD);
    perceive_cmd()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("sensors:    1"))
        .stdout(predicate::str::contains("cones:      1"))
        .stdout(predicate::str::contains("signals:    1"))
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn check_rejects_invalid_cone() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(&dir, &GUARD.replace("fov = 60", "fov = 270"));
    perceive_cmd()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load scenario"))
        .stderr(predicate::str::contains("fov 270 exceeds 180"));
}

#[test]
fn check_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    perceive_cmd()
        .arg("check")
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load scenario"));
}

#[test]
fn run_prints_detections_and_memory() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(&dir, GUARD);
    perceive_cmd()
        .arg("run")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("guard -> walker: medium (vision)"))
        .stdout(predicate::str::contains("guard: alertness=medium"))
        .stdout(predicate::str::contains("detections: 1"));
}

#[test]
fn run_frames_override_stops_early() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(&dir, GUARD);
    perceive_cmd()
        .args(["run", "--frames", "3"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("(no detections)"))
        .stdout(predicate::str::contains("detections: 0"));
}

#[test]
fn run_json_lines() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(&dir, GUARD);
    let output = perceive_cmd()
        .args(["run", "--json"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["sensor"], "guard");
    assert_eq!(lines[0]["signal"], "walker");
    assert_eq!(lines[0]["awareness"], "medium");
    assert_eq!(lines[0]["frame"], 4);
    assert_eq!(lines[1]["summary"][0]["alertness"], "medium");
}

#[test]
fn run_rejects_non_positive_dt() {
    let dir = TempDir::new().unwrap();
    let path = write_scenario(&dir, GUARD);
    perceive_cmd()
        .args(["run", "--dt", "0"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--dt must be a positive"));
}
