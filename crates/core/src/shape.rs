// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance shapes, CPU architectures and operating system families.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("invalid instance type '{0}': expected <family>.<size>, e.g. m5.large")]
    InvalidInstanceType(String),
    #[error("unknown architecture '{0}'")]
    UnknownArchitecture(String),
    #[error("unknown os '{0}'")]
    UnknownOs(String),
}

/// CPU architecture of an image or instance shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    #[serde(alias = "x64", alias = "amd64")]
    X86_64,
    #[serde(alias = "aarch64")]
    Arm64,
}

crate::simple_display! {
    Architecture {
        X86_64 => "x86_64",
        Arm64 => "arm64",
    }
}

impl Architecture {
    /// Whether an instance of this shape can boot an image of this architecture.
    pub fn instance_type_match(&self, instance_type: &InstanceType) -> bool {
        instance_type.architecture() == *self
    }
}

impl FromStr for Architecture {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86_64" | "x64" | "amd64" => Ok(Architecture::X86_64),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            _ => Err(ShapeError::UnknownArchitecture(s.to_string())),
        }
    }
}

/// Operating system family. Selects the boot script dialect and storage floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Os {
    Windows,
    Linux,
}

crate::simple_display! {
    Os {
        Windows => "windows",
        Linux => "linux",
    }
}

impl Os {
    /// Smallest root volume the OS image will boot from, in GiB.
    pub fn min_storage_gib(&self) -> u32 {
        match self {
            Os::Windows => 30,
            Os::Linux => 8,
        }
    }

    /// Platform name as the image-build service spells it.
    pub fn platform_name(&self) -> &'static str {
        match self {
            Os::Windows => "Windows",
            Os::Linux => "Linux",
        }
    }
}

impl FromStr for Os {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(Os::Windows),
            "linux" => Ok(Os::Linux),
            _ => Err(ShapeError::UnknownOs(s.to_string())),
        }
    }
}

/// An instance shape such as `m5.large`.
///
/// The family is `<class><generation><attributes>`, e.g. `t3a` or `c7gn`.
/// A `g` among the attributes marks a Graviton (arm64) family; `a1` is the
/// one arm64 family that predates that convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceType {
    family: String,
    size: String,
}

impl InstanceType {
    pub fn new(family: &str, size: &str) -> Result<Self, ShapeError> {
        format!("{family}.{size}").parse()
    }

    /// General-purpose default shape for runners and builders.
    pub fn m5_large() -> Self {
        Self { family: "m5".to_string(), size: "large".to_string() }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn architecture(&self) -> Architecture {
        if self.family == "a1" {
            return Architecture::Arm64;
        }
        let attributes = self
            .family
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .trim_start_matches(|c: char| c.is_ascii_digit());
        if attributes.contains('g') {
            Architecture::Arm64
        } else {
            Architecture::X86_64
        }
    }
}

impl FromStr for InstanceType {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ShapeError::InvalidInstanceType(s.to_string());
        let (family, size) = s.trim().split_once('.').ok_or_else(invalid)?;
        if size.is_empty() || size.contains('.') {
            return Err(invalid());
        }
        let class_len = family.chars().take_while(|c| c.is_ascii_lowercase()).count();
        let generation_len =
            family[class_len..].chars().take_while(|c| c.is_ascii_digit()).count();
        if class_len == 0 || generation_len == 0 {
            return Err(invalid());
        }
        if !family.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            return Err(invalid());
        }
        Ok(Self { family: family.to_string(), size: size.to_string() })
    }
}

impl TryFrom<String> for InstanceType {
    type Error = ShapeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<InstanceType> for String {
    fn from(t: InstanceType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family, self.size)
    }
}

#[cfg(test)]
#[path = "shape_tests.rs"]
mod tests;
