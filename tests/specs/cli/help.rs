// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Help output specs

use crate::prelude::*;

#[test]
fn binary_is_built_beside_the_specs() {
    let binary = fleet_binary();
    let exe = std::env::current_exe().unwrap();
    let profile_dir = exe.parent().and_then(|p| p.parent()).unwrap();
    assert_eq!(binary.parent(), Some(profile_dir));
    assert!(binary.is_file());
}

#[test]
fn no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn help_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("validate")
        .stdout_has("boot-script")
        .stdout_has("plan")
        .stdout_has("status")
        .stdout_has("event");
}

#[test]
fn event_help_names_collectors() {
    cli().args(&["event", "--help"]).passes().stdout_has("delete-ami").stdout_has("reaper");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}
