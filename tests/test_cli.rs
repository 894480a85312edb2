use assert_cmd::prelude::*;
use predicates::prelude::*;

use std::process::Command;

#[test]
fn test_cli() {
    let mut cmd = Command::cargo_bin("burstsim").expect("Calling binary failed");
    cmd.assert().failure();
}

#[test]
fn test_version() {
    let expected_version = "burstsim 0.1.0\n";
    let mut cmd = Command::cargo_bin("burstsim").expect("Calling binary failed");
    cmd.arg("--version").assert().stdout(expected_version);
}

#[test]
fn test_run_reports_timelines() {
    let expected = "1 1 _ _ _ _ 1 1\n\
                    _ _ _ 1 1 1 _ _\n\
                    _ _ _ _ _ _ _ _\n\
                    8\n\
                    1\n";

    let mut cmd = Command::cargo_bin("burstsim").expect("Calling binary failed");
    cmd.arg("run")
        .arg("tests/data/simple.txt")
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn test_run_missing_input_fails() {
    let mut cmd = Command::cargo_bin("burstsim").expect("Calling binary failed");
    cmd.arg("run")
        .arg("tests/data/does_not_exist.txt")
        .assert()
        .failure();
}

#[test]
fn test_run_rejects_bad_workload() {
    let mut cmd = Command::cargo_bin("burstsim").expect("Calling binary failed");
    cmd.arg("run")
        .arg("tests/data/unclosed.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("UnclosedResource"));
}
