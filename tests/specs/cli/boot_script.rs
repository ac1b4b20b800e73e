// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet boot-script` specs

use crate::prelude::*;

#[test]
fn windows_script_powers_off_in_finally() {
    let project = Project::with_config(WINDOWS_CONFIG);
    project
        .fleet()
        .args(&["boot-script", "--owner", "acme", "--repo", "widgets", "--token", "tkn-spec"])
        .passes()
        .stdout_has("tkn-spec")
        .stdout_has("https://github.com/acme/widgets")
        .stdout_has("windows,fast")
        .stdout_has("finally")
        .stdout_has("Stop-Computer");
}

#[test]
fn linux_script_traps_exit() {
    let project = Project::with_config(LINUX_CONFIG);
    project
        .fleet()
        .args(&["boot-script", "--owner", "acme", "--repo", "widgets"])
        .passes()
        .stdout_has("trap finish EXIT")
        .stdout_has("poweroff")
        .stdout_has("send-task-heartbeat");
}

#[test]
fn registration_secret_comes_from_env_and_is_escaped() {
    let project = Project::with_config(LINUX_CONFIG);
    project
        .fleet()
        .env("FLEET_REGISTRATION_TOKEN", "se\"cr$t")
        .args(&["boot-script", "--owner", "acme", "--repo", "widgets"])
        .passes()
        .stdout_has("se\\\"cr\\$t");
}
