// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleet.toml`: stack identity, runner provider and image builder settings.

use crate::builder::{AmiBuilderSettings, BuilderError};
use fleet_core::{
    parse_duration, Architecture, Component, InstanceType, MarketOptions, Os, Placement,
};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("provider.subnets must list at least one subnet")]
    NoSubnets,
    #[error("provider.spot_max_price requires provider.spot = true")]
    SpotPriceWithoutSpot,
    #[error("AMI architecture ({architecture}) doesn't match runner instance type ({instance_type} / {})", instance_type.architecture())]
    ArchitectureMismatch { architecture: Architecture, instance_type: InstanceType },
    #[error("provider.storage_gib = {size} is below the {os} minimum of {min} GiB")]
    StorageTooSmall { size: u32, os: Os, min: u32 },
    #[error("provider.{field} must be greater than zero")]
    ZeroWindow { field: &'static str },
    #[error("runner os ({provider}) doesn't match builder os ({builder})")]
    OsMismatch { provider: Os, builder: Os },
    #[error(transparent)]
    Builder(#[from] BuilderError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetConfig {
    pub stack: StackConfig,
    pub provider: ProviderConfig,
    pub builder: BuilderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    pub name: String,
    pub region: String,
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
    /// Tried in order for every launch.
    pub subnets: Vec<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default = "default_instance_type")]
    pub instance_type: InstanceType,
    #[serde(default = "default_storage_gib")]
    pub storage_gib: u32,
    #[serde(default)]
    pub spot: bool,
    #[serde(default)]
    pub spot_max_price: Option<String>,
    #[serde(default = "default_heartbeat_timeout", deserialize_with = "de_duration")]
    pub heartbeat_timeout: Duration,
    #[serde(default = "default_launch_timeout", deserialize_with = "de_duration")]
    pub launch_timeout: Duration,
    #[serde(default)]
    pub log_group: Option<String>,
    #[serde(default = "default_os")]
    pub os: Os,
    #[serde(default)]
    pub instance_profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderConfig {
    /// Logical builder path, e.g. `runners/windows`.
    pub name: String,
    #[serde(default = "default_os")]
    pub os: Os,
    #[serde(default = "default_architecture")]
    pub architecture: Architecture,
    pub base_image: String,
    #[serde(default = "default_instance_type")]
    pub instance_type: InstanceType,
    #[serde(default = "default_rebuild_interval", deserialize_with = "de_duration")]
    pub rebuild_interval: Duration,
    #[serde(default)]
    pub subnet: Option<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,
}

fn default_labels() -> Vec<String> {
    vec!["ec2".to_string()]
}

fn default_instance_type() -> InstanceType {
    InstanceType::m5_large()
}

fn default_storage_gib() -> u32 {
    Os::Windows.min_storage_gib()
}

fn default_heartbeat_timeout() -> Duration {
    crate::orchestrator::DEFAULT_HEARTBEAT_TIMEOUT
}

fn default_launch_timeout() -> Duration {
    crate::orchestrator::DEFAULT_LAUNCH_TIMEOUT
}

fn default_rebuild_interval() -> Duration {
    Duration::from_secs(7 * 86_400)
}

fn default_os() -> Os {
    Os::Windows
}

fn default_architecture() -> Architecture {
    Architecture::X86_64
}

fn default_log_retention_days() -> u32 {
    30
}

fn de_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

impl FleetConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), stack = %config.stack.name, "loaded config");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FleetConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.provider;
        let b = &self.builder;
        if p.subnets.is_empty() {
            return Err(ConfigError::NoSubnets);
        }
        if p.spot_max_price.is_some() && !p.spot {
            return Err(ConfigError::SpotPriceWithoutSpot);
        }
        if p.heartbeat_timeout.is_zero() {
            return Err(ConfigError::ZeroWindow { field: "heartbeat_timeout" });
        }
        if p.launch_timeout.is_zero() {
            return Err(ConfigError::ZeroWindow { field: "launch_timeout" });
        }
        if p.os != b.os {
            return Err(ConfigError::OsMismatch { provider: p.os, builder: b.os });
        }
        let min = p.os.min_storage_gib();
        if p.storage_gib < min {
            return Err(ConfigError::StorageTooSmall { size: p.storage_gib, os: p.os, min });
        }
        if !b.architecture.instance_type_match(&b.instance_type) {
            return Err(BuilderError::ArchitectureMismatch {
                architecture: b.architecture,
                instance_type: b.instance_type.clone(),
            }
            .into());
        }
        if !b.architecture.instance_type_match(&p.instance_type) {
            return Err(ConfigError::ArchitectureMismatch {
                architecture: b.architecture,
                instance_type: p.instance_type.clone(),
            });
        }
        if let Some(c) = b.components.iter().find(|c| c.platform != b.os) {
            return Err(BuilderError::ForeignComponent {
                component: c.name.clone(),
                platform: c.platform,
                os: b.os,
            }
            .into());
        }
        Ok(())
    }

    pub fn placements(&self) -> Vec<Placement> {
        self.provider.subnets.iter().map(Placement::new).collect()
    }

    pub fn market(&self) -> MarketOptions {
        if self.provider.spot {
            MarketOptions::Spot { max_price: self.provider.spot_max_price.clone() }
        } else {
            MarketOptions::OnDemand
        }
    }

    pub fn log_group(&self) -> String {
        self.provider
            .log_group
            .clone()
            .unwrap_or_else(|| format!("/fleet/{}/runners", self.stack.name))
    }

    pub fn instance_profile(&self) -> String {
        self.provider
            .instance_profile
            .clone()
            .unwrap_or_else(|| format!("{}-runner", self.stack.name))
    }

    pub fn builder_settings(&self) -> AmiBuilderSettings {
        let b = &self.builder;
        let subnet = b
            .subnet
            .clone()
            .or_else(|| self.provider.subnets.first().cloned())
            .unwrap_or_default();
        AmiBuilderSettings {
            stack_name: self.stack.name.clone(),
            region: self.stack.region.clone(),
            account: self.stack.account.clone(),
            builder_path: b.name.clone(),
            os: b.os,
            architecture: b.architecture,
            base_image: b.base_image.clone(),
            instance_type: b.instance_type.clone(),
            rebuild_interval: b.rebuild_interval,
            subnet: Placement::new(subnet),
            security_groups: b.security_groups.clone(),
            components: b.components.clone(),
            log_retention_days: b.log_retention_days,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
