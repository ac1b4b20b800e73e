// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fleet_core::RunnerProvisioningRequestBuilder;
use yare::parameterized;

fn params() -> BootScriptParams {
    BootScriptParams {
        task_token: "P1-token".to_string(),
        log_destination: "P2-logs".to_string(),
        runner_name: "P3-runner".to_string(),
        registration_domain: "P4-domain".to_string(),
        owner: "P5-owner".to_string(),
        repo: "P6-repo".to_string(),
        registration_token: "P7-secret".to_string(),
        labels: "P8-labels".to_string(),
        registration_url: "P9-url".to_string(),
    }
}

#[parameterized(windows = { Os::Windows }, linux = { Os::Linux })]
fn bundled_templates_parse(os: Os) {
    let template = BootScriptTemplate::for_os(os).unwrap();
    assert_eq!(template.os(), os);
}

#[parameterized(windows = { Os::Windows }, linux = { Os::Linux })]
fn values_are_substituted_in_positional_order(os: Os) {
    let script = BootScriptTemplate::for_os(os).unwrap().render(&params());
    let positions: Vec<usize> = (1..=9)
        .map(|n| script.find(&format!("\"P{n}-")).unwrap_or_else(|| panic!("P{n} missing")))
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[test]
fn windows_assigns_token_variable() {
    let script = BootScriptTemplate::for_os(Os::Windows).unwrap().render(&params());
    assert!(script.starts_with("<powershell>\n$TASK_TOKEN = \"P1-token\"\n"));
    assert!(script.contains("--task-output '{ }'"));
    assert!(script.contains("%{$_.Matches.Groups[1].Value}"));
}

#[test]
fn windows_powers_off_in_finally_block() {
    let script = BootScriptTemplate::for_os(Os::Windows).unwrap().render(&params());
    let finally = script.find("} finally {").unwrap();
    let stop = script.find("Stop-Computer -ComputerName localhost -Force").unwrap();
    assert!(stop > finally);
    assert!(!script.contains("\nexit"));
    // config failure and run failure return distinct codes to the try block
    assert!(script.contains("return 1"));
    assert!(script.contains("return 2"));
}

#[test]
fn linux_powers_off_from_exit_trap() {
    let script = BootScriptTemplate::for_os(Os::Linux).unwrap().render(&params());
    let trap = script.find("trap finish EXIT").unwrap();
    let action = script.rfind("\naction\n").unwrap();
    assert!(trap < action);
    let finish = &script[script.find("finish () {").unwrap()..trap];
    assert!(finish.contains("sleep 10"));
    assert!(finish.contains("poweroff"));
    assert!(script.trim_end().ends_with("exit $?"));
}

/// Run the rendered Linux script with `action` forced to return `rc`, under
/// stub `aws`, `poweroff` and `sleep` commands. Returns the stub call log.
#[cfg(unix)]
fn run_linux_script(rc: u8) -> Option<String> {
    use std::os::unix::fs::PermissionsExt;
    use std::process::Command;

    let bash = Command::new("bash").arg("-c").arg("true").status();
    if !bash.map(|s| s.success()).unwrap_or(false) {
        return None;
    }

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let stubs = [
        ("aws", "#!/bin/sh\necho \"aws $*\" >> \"$STUB_LOG\"\n"),
        ("poweroff", "#!/bin/sh\necho poweroff >> \"$STUB_LOG\"\n"),
        // The heartbeat loop ends at its first sleep.
        ("sleep", "#!/bin/sh\nif [ \"$1\" = 60 ]; then kill \"$PPID\"; fi\nexit 0\n"),
    ];
    for (name, body) in stubs {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    let script = BootScriptTemplate::for_os(Os::Linux)
        .unwrap()
        .render(&params())
        .replace("cd /home/runner || return 1", &format!("return {rc}"))
        .replace("/tmp/log.conf", &dir.path().join("log.conf").display().to_string());
    let script_path = dir.path().join("boot.sh");
    std::fs::write(&script_path, script).unwrap();

    let path = format!("{}:{}", dir.path().display(), std::env::var("PATH").unwrap_or_default());
    Command::new("bash")
        .arg(&script_path)
        .env("PATH", path)
        .env("STUB_LOG", &log)
        .output()
        .unwrap();
    Some(std::fs::read_to_string(&log).unwrap_or_default())
}

#[cfg(unix)]
#[parameterized(job_ok = { 0 }, config_failed = { 1 }, run_failed = { 2 })]
fn linux_script_powers_off_on_every_exit(rc: u8) {
    let Some(log) = run_linux_script(rc) else {
        return;
    };
    let lines: Vec<&str> = log.lines().collect();
    assert!(lines.contains(&"poweroff"), "{log}");
    if rc == 0 {
        assert!(log.contains("aws stepfunctions send-task-success --task-token P1-token"), "{log}");
        assert!(!log.contains("send-task-failure"), "{log}");
    } else {
        assert!(
            log.contains(&format!("aws stepfunctions send-task-failure --task-token P1-token --error exit {rc}")),
            "{log}"
        );
    }
    let reported = lines.iter().position(|l| l.contains("send-task-success") || l.contains("send-task-failure"));
    let off = lines.iter().position(|l| *l == "poweroff");
    assert!(reported < off, "{log}");
}

#[test]
fn heartbeat_loop_starts_before_job() {
    for os in [Os::Windows, Os::Linux] {
        let script = BootScriptTemplate::for_os(os).unwrap().render(&params());
        let heartbeat = script.find("send-task-heartbeat").unwrap();
        let config = script.find("--unattended").unwrap();
        assert!(heartbeat < config, "{os:?}");
        assert!(script.contains("sleep 60"));
    }
}

#[parameterized(
    linux_quote = { Os::Linux, "a\"b", "a\\\"b" },
    linux_dollar = { Os::Linux, "$(reboot)", "\\$(reboot)" },
    linux_backtick = { Os::Linux, "`id`", "\\`id\\`" },
    linux_backslash = { Os::Linux, "a\\b", "a\\\\b" },
    windows_quote = { Os::Windows, "a\"b", "a`\"b" },
    windows_dollar = { Os::Windows, "$env:X", "`$env:X" },
    windows_backtick = { Os::Windows, "a`b", "a``b" },
    windows_newline = { Os::Windows, "a\nb", "a`nb" },
    windows_smart_quote = { Os::Windows, "a\u{201C}b", "a`\u{201C}b" },
    plain = { Os::Linux, "acme/widgets", "acme/widgets" },
)]
fn escapes_for_double_quoted_context(os: Os, raw: &str, escaped: &str) {
    assert_eq!(escape(os, raw), escaped);
}

#[test]
fn hostile_value_stays_inside_its_quotes() {
    let mut p = params();
    p.runner_name = "x\"; poweroff -f; echo \"".to_string();
    let script = BootScriptTemplate::for_os(Os::Linux).unwrap().render(&p);
    assert!(script.contains("runnerNamePath=\"x\\\"; poweroff -f; echo \\\"\"\n"));
}

#[test]
fn params_from_request_use_label_list() {
    let request = RunnerProvisioningRequestBuilder::default()
        .labels(vec!["windows".to_string(), "fast".to_string()])
        .build();
    let p = BootScriptParams::from_request(&request);
    assert_eq!(p.labels, "windows,fast");
    assert_eq!(p.task_token, request.token.to_string());
    assert_eq!(p.registration_url, request.registration_url);
}

#[parameterized(
    too_few = { "a {} b {}", 2 },
    too_many = { "{}{}{}{}{}{}{}{}{}{}", 10 },
)]
fn rejects_wrong_placeholder_count(source: &'static str, found: usize) {
    assert_eq!(
        BootScriptTemplate::parse(Os::Linux, source).unwrap_err(),
        TemplateError::PlaceholderCount { expected: 9, found }
    );
}

#[test]
fn rejects_unbalanced_brace() {
    assert_eq!(
        BootScriptTemplate::parse(Os::Linux, "echo { oops").unwrap_err(),
        TemplateError::UnbalancedBrace { brace: '{', offset: 5 }
    );
}

#[test]
fn escaped_braces_are_literal() {
    let source = "{{{}}} {} {} {} {} {} {} {} {}";
    let rendered = BootScriptTemplate::parse(Os::Linux, source).unwrap().render(&params());
    assert!(rendered.starts_with("{P1-token} P2-logs"));
}

/// Walk an escaped value and fail on any special character that is not
/// consumed by the escape character before it.
fn bare_specials(escaped: &str, escape_char: char, specials: &[char]) -> Vec<char> {
    let mut bare = Vec::new();
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == escape_char {
            chars.next();
        } else if specials.contains(&c) {
            bare.push(c);
        }
    }
    bare
}

proptest::proptest! {
    #[test]
    fn linux_escape_leaves_no_bare_specials(value in "\\PC*") {
        let escaped = escape(Os::Linux, &value);
        let bare = bare_specials(&escaped, '\\', &['"', '$', '`']);
        proptest::prop_assert!(bare.is_empty(), "bare specials {:?} in {:?}", bare, escaped);
    }

    #[test]
    fn windows_escape_leaves_no_bare_specials(value in "\\PC*") {
        let escaped = escape(Os::Windows, &value);
        let bare = bare_specials(&escaped, '`', &['"', '$', '\u{201C}', '\u{201D}', '\u{201E}']);
        proptest::prop_assert!(bare.is_empty(), "bare specials {:?} in {:?}", bare, escaped);
    }
}
