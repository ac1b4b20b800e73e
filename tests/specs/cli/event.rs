// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet event` specs

use crate::prelude::*;

#[test]
fn scheduled_cleaner_event_sweeps() {
    cli()
        .args(&["event", "delete-ami", "-o", "json"])
        .stdin(r#"{"RequestType":"Scheduled","StackName":"runners","BuilderName":"runners/windows","LaunchTemplateId":"lt-1"}"#)
        .passes()
        .stdout_has("\"action\": \"swept\"");
}

#[test]
fn create_event_only_acknowledges_and_redacts_url() {
    let project = Project::with_config(WINDOWS_CONFIG);
    let payload = project.file(
        "create.json",
        r#"{
            "RequestType": "Create",
            "ResponseURL": "http://callback.local/resp?X-Signature=secret",
            "StackId": "stack-1",
            "RequestId": "req-1",
            "LogicalResourceId": "Deleter",
            "ResourceProperties": {"StackName": "runners", "BuilderName": "runners/windows"}
        }"#,
    );
    let run = cli()
        .args(&["event", "delete-ami", payload.to_str().unwrap(), "--output", "json"])
        .passes()
        .stdout_lacks("secret");
    let json = run.json();
    assert_eq!(json["outcome"]["action"], "acknowledged");
    assert_eq!(json["event"]["ResponseURL"], "http://callback.local/resp?<redacted>");
}

#[test]
fn delete_without_owner_fails() {
    cli()
        .args(&["event", "delete-ami"])
        .stdin(r#"{"RequestType":"Delete"}"#)
        .exits(3)
        .stderr_has("StackName");
}

#[test]
fn reaper_event_reports_recipe() {
    cli()
        .args(&["event", "reaper", "-"])
        .stdin(r#"{"RecipeName":"runners-windows-abc"}"#)
        .passes()
        .stdout_has("runners-windows-abc")
        .stdout_has("0 listed");
}

#[test]
fn malformed_payload_exits_with_event_code() {
    cli().args(&["event", "reaper"]).stdin("{not json").exits(3).stderr_has("invalid reaper event");
}
