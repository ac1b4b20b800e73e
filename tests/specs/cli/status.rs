// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet status` specs

use crate::prelude::*;

#[test]
fn status_json_uses_camel_case_keys() {
    let project = Project::with_config(WINDOWS_CONFIG);
    let run = project.fleet().args(&["status", "--output", "json"]).passes();
    let json = run.json();
    assert_eq!(json["type"], "FastLaunchProvider");
    assert_eq!(json["labels"], serde_json::json!(["windows", "fast"]));
    assert_eq!(json["securityGroups"], serde_json::json!(["sg-runner"]));
    assert!(json["ami"]["launchTemplate"].as_str().unwrap().starts_with("lt-"));
    assert!(json["ami"]["amiBuilderLogGroup"].as_str().unwrap().starts_with("/aws/imagebuilder/"));
}

#[test]
fn status_text_lists_fields() {
    let project = Project::with_config(WINDOWS_CONFIG);
    project
        .fleet()
        .args(&["status"])
        .passes()
        .stdout_has("windows, fast")
        .stdout_has("/fleet/runners/runners");
}
