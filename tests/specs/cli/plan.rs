// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet plan` specs

use crate::prelude::*;

#[test]
fn windows_plan_has_fast_launch_and_schedules() {
    let project = Project::with_config(WINDOWS_CONFIG);
    let run = project.fleet().args(&["plan", "-o", "json"]).passes();
    let json = run.json();

    let distribution = &json["pipeline"]["distribution"];
    assert_eq!(distribution["region"], "us-east-1");
    assert_eq!(distribution["fast_launch"]["max_parallel_launches"], 6);
    assert_eq!(distribution["fast_launch"]["target_resource_count"], 5);
    assert!(distribution["ami"]["name"]
        .as_str()
        .unwrap()
        .ends_with("-{{ imagebuilder:buildDate }}"));
    assert_eq!(json["pipeline"]["schedule"]["start_condition"], "EXPRESSION_MATCH_ONLY");
    assert_eq!(json["infrastructure"]["http_put_response_hop_limit"], 2);

    let schedules = json["collectors"]["schedules"].as_array().unwrap();
    let ids: Vec<_> = schedules.iter().map(|s| s["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["Delete AMI Schedule", "Reaper Schedule AMI"]);
    assert_eq!(schedules[0]["payload"]["RequestType"], "Scheduled");
    assert_eq!(schedules[0]["payload"]["BuilderName"], "runners/windows");
    assert_eq!(json["collectors"]["teardown"][0]["resource_type"], "Custom::AmiDeleter");
}

#[test]
fn linux_plan_has_no_fast_launch_or_schedule() {
    let project = Project::with_config(LINUX_CONFIG);
    let run = project.fleet().args(&["plan", "-o", "json"]).passes();
    let json = run.json();
    assert!(json["pipeline"]["distribution"].get("fast_launch").is_none());
    assert!(json["pipeline"].get("schedule").is_none());
}

#[test]
fn plan_text_lists_collectors() {
    let project = Project::with_config(WINDOWS_CONFIG);
    project
        .fleet()
        .args(&["plan"])
        .passes()
        .stdout_has("6 parallel, 5 snapshots")
        .stdout_has("delete-ami (300s)")
        .stdout_has("reaper (180s)")
        .stdout_has("Custom::AmiDeleter -> delete-ami [teardown]");
}
