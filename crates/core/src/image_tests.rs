// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn artifact_tags_carry_name_stack_and_builder() {
    let owner = OwnerTags::new("gh-runner", "gh-runner/x64-windows-builder");
    let t = owner.artifact_tags("x64-windows-builder");
    assert_eq!(t.get(NAME_TAG).map(String::as_str), Some("x64-windows-builder"));
    assert_eq!(t.get(STACK_TAG).map(String::as_str), Some("gh-runner"));
    assert_eq!(t.get(BUILDER_TAG).map(String::as_str), Some("gh-runner/x64-windows-builder"));
    assert!(owner.matches(&t));
}

#[yare::parameterized(
    both_match     = { &[(STACK_TAG, "s"), (BUILDER_TAG, "b")], true },
    other_builder  = { &[(STACK_TAG, "s"), (BUILDER_TAG, "c")], false },
    other_stack    = { &[(STACK_TAG, "t"), (BUILDER_TAG, "b")], false },
    stack_only     = { &[(STACK_TAG, "s")],                     false },
    untagged       = { &[],                                     false },
)]
fn ownership_requires_both_tags(pairs: &[(&str, &str)], expected: bool) {
    assert_eq!(OwnerTags::new("s", "b").matches(&tags(pairs)), expected);
}

#[test]
fn snapshot_ids_skip_devices_without_snapshots() {
    let artifact = ImageArtifact {
        image_id: Some("ami-1".into()),
        block_devices: vec![
            BlockDeviceMapping { device_name: "/dev/sda1".into(), snapshot_id: Some("snap-1".into()) },
            BlockDeviceMapping { device_name: "xvdca".into(), snapshot_id: None },
            BlockDeviceMapping { device_name: "xvdf".into(), snapshot_id: Some("snap-2".into()) },
        ],
        ..Default::default()
    };
    assert_eq!(artifact.snapshot_ids().collect::<Vec<_>>(), vec!["snap-1", "snap-2"]);
}

#[test]
fn build_version_is_immutable_once_terminal() {
    let mut v = ImageBuildVersion::new("arn:v1", "recipe", 0);
    v.advance(BuildStatus::Building).unwrap();
    v.succeed("ami-1").unwrap();
    assert_eq!(v.status, BuildStatus::Available);
    assert_eq!(v.image_id.as_deref(), Some("ami-1"));

    assert!(matches!(v.succeed("ami-2"), Err(BuildVersionError::AlreadyTerminal { .. })));
    assert!(v.advance(BuildStatus::Building).is_err());
    assert_eq!(v.image_id.as_deref(), Some("ami-1"));
}

#[test]
fn failed_build_has_no_image() {
    let mut v = ImageBuildVersion::new("arn:v2", "recipe", 0);
    v.advance(BuildStatus::Failed("component step 2 exited 1".into())).unwrap();
    assert!(v.status.is_terminal());
    assert!(v.image_id.is_none());
    assert!(v.succeed("ami-x").is_err());
}

#[test]
fn available_requires_an_image() {
    let mut v = ImageBuildVersion::new("arn:v3", "recipe", 0);
    assert_eq!(v.advance(BuildStatus::Available), Err(BuildVersionError::MissingImage("arn:v3".into())));
}

#[test]
fn build_status_serde_shape() {
    let json = serde_json::to_value(BuildStatus::Failed("boom".into())).unwrap();
    assert_eq!(json, serde_json::json!({"state": "failed", "reason": "boom"}));
    let json = serde_json::to_value(BuildStatus::Building).unwrap();
    assert_eq!(json, serde_json::json!({"state": "building"}));
}
