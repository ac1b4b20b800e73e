// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet validate` specs

use crate::prelude::*;

#[test]
fn valid_config_summarizes() {
    let project = Project::with_config(WINDOWS_CONFIG);
    project
        .fleet()
        .args(&["validate"])
        .passes()
        .stdout_has("config ok")
        .stdout_has("runners (us-east-1)")
        .stdout_has("subnet-a, subnet-b")
        .stdout_has("rate(7 days)")
        .stdout_has("300s");
}

#[test]
fn config_flag_overrides_env() {
    let project = Project::with_config(LINUX_CONFIG);
    let config = project.config_path();
    cli()
        .env("FLEET_CONFIG", "/nonexistent/fleet.toml")
        .args(&["validate", "--config", config.to_str().unwrap()])
        .passes()
        .stdout_has("manual only")
        .stdout_has("spot");
}

#[test]
fn json_output_is_machine_readable() {
    let project = Project::with_config(LINUX_CONFIG);
    let run = project.fleet().args(&["validate", "-o", "json"]).passes();
    let json = run.json();
    assert_eq!(json["valid"], true);
    assert_eq!(json["architecture"], "arm64");
    assert_eq!(json["runnerInstanceType"], "m7g.large");
    assert!(json["rebuildSchedule"].is_null());
}

#[test]
fn missing_config_exits_with_config_code() {
    cli()
        .args(&["validate", "--config", "/nonexistent/fleet.toml"])
        .exits(2)
        .stderr_has("failed to read");
}

#[test]
fn runner_architecture_mismatch_is_reported() {
    let content = WINDOWS_CONFIG.replace(
        "heartbeat_timeout = \"5m\"",
        "heartbeat_timeout = \"5m\"\ninstance_type = \"m6g.large\"",
    );
    let project = Project::with_config(&content);
    project
        .fleet()
        .args(&["validate"])
        .exits(2)
        .stderr_has("AMI architecture (x86_64) doesn't match runner instance type (m6g.large / arm64)");
}

#[test]
fn empty_subnets_are_reported() {
    let content = WINDOWS_CONFIG.replace("[\"subnet-a\", \"subnet-b\"]", "[]");
    let project = Project::with_config(&content);
    project.fleet().args(&["validate"]).exits(2).stderr_has("at least one subnet");
}

#[test]
fn zero_heartbeat_window_is_reported() {
    let content = WINDOWS_CONFIG.replace("heartbeat_timeout = \"5m\"", "heartbeat_timeout = \"0\"");
    let project = Project::with_config(&content);
    project
        .fleet()
        .args(&["validate"])
        .exits(2)
        .stderr_has("provider.heartbeat_timeout must be greater than zero");
}
