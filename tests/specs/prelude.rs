// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for CLI specs.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

pub const WINDOWS_CONFIG: &str = r#"
[stack]
name = "runners"
region = "us-east-1"
account = "123456789012"

[provider]
labels = ["windows", "fast"]
subnets = ["subnet-a", "subnet-b"]
security_groups = ["sg-runner"]
heartbeat_timeout = "5m"

[builder]
name = "runners/windows"
base_image = "ami-base"
security_groups = ["sg-build"]

[[builder.components]]
name = "git"
platform = "windows"
commands = ["choco install -y git"]
"#;

pub const LINUX_CONFIG: &str = r#"
[stack]
name = "runners"
region = "eu-west-1"
account = "123456789012"

[provider]
subnets = ["subnet-a"]
instance_type = "m7g.large"
os = "linux"
storage_gib = 16
spot = true

[builder]
name = "runners/linux-arm"
os = "linux"
architecture = "arm64"
instance_type = "t4g.large"
base_image = "ami-al2023"
rebuild_interval = "0"
"#;

/// Path to the `fleet` binary, built once per test run.
///
/// The binary belongs to another package in the workspace, so it is built
/// into the same profile directory as this test executable.
pub fn fleet_binary() -> &'static Path {
    static BINARY: OnceLock<PathBuf> = OnceLock::new();
    BINARY.get_or_init(|| {
        let exe = std::env::current_exe().unwrap();
        // target/<profile>/deps/specs-<hash>
        let profile_dir = exe.parent().and_then(Path::parent).unwrap().to_path_buf();
        let target_dir = profile_dir.parent().unwrap();

        let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
        let mut build = Command::new(cargo);
        build
            .args(["build", "--quiet", "-p", "fleet", "--bin", "fleet", "--target-dir"])
            .arg(target_dir)
            .arg("--manifest-path")
            .arg(Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml"));
        if profile_dir.file_name().is_some_and(|n| n == "release") {
            build.arg("--release");
        }
        let status = build.status().unwrap();
        assert!(status.success(), "building fleet failed: {status}");

        let binary = profile_dir.join(format!("fleet{}", std::env::consts::EXE_SUFFIX));
        assert!(binary.exists(), "fleet binary missing at {}", binary.display());
        binary
    })
}

/// `fleet` with logging quiet and no ambient config.
pub fn cli() -> CliBuilder {
    let mut cmd = assert_cmd::Command::new(fleet_binary());
    cmd.env_remove("FLEET_CONFIG").env("FLEET_LOG", "error").env("NO_COLOR", "1");
    CliBuilder { cmd }
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input.to_string());
        self
    }

    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert::from(output);
        assert_eq!(run.code, Some(0), "expected success\nstdout:\n{}\nstderr:\n{}", run.stdout, run.stderr);
        run
    }

    pub fn exits(mut self, code: i32) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert::from(output);
        assert_eq!(run.code, Some(code), "unexpected exit\nstdout:\n{}\nstderr:\n{}", run.stdout, run.stderr);
        run
    }
}

pub struct RunAssert {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for RunAssert {
    fn from(output: std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunAssert {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout missing {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(!self.stdout.contains(needle), "stdout has {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr missing {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).unwrap()
    }
}

/// A temp directory holding one `fleet.toml`.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn with_config(content: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fleet.toml"), content).unwrap();
        Self { dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("fleet.toml")
    }

    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// `fleet` pointed at this project's config.
    pub fn fleet(&self) -> CliBuilder {
        let config = self.config_path();
        cli().env("FLEET_CONFIG", config.to_str().unwrap())
    }
}
