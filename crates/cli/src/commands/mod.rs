// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod boot_script;
pub mod event;
pub mod plan;
pub mod status;
pub mod validate;

use crate::dry_run::DryRunCompute;
use crate::exit_error::ExitError;
use fleet_engine::{
    CollectorRegistry, FastLaunchAmiBuilder, FastLaunchProvider, FleetConfig, TaskTokenRegistry,
};
use std::path::Path;

/// Everything a config-driven command needs, wired against dry-run adapters.
pub struct Context {
    pub config: FleetConfig,
    pub registry: CollectorRegistry,
    pub builder: FastLaunchAmiBuilder,
    pub provider: FastLaunchProvider<DryRunCompute>,
}

impl Context {
    pub fn load(path: &Path) -> Result<Self, ExitError> {
        let config = FleetConfig::load(path).map_err(ExitError::config)?;
        let registry = CollectorRegistry::new();
        let builder = FastLaunchAmiBuilder::new(config.builder_settings(), registry.clone())
            .map_err(ExitError::config)?;
        let provider =
            FastLaunchProvider::new(&config, &builder, DryRunCompute, TaskTokenRegistry::new())
                .map_err(ExitError::config)?;
        Ok(Self { config, registry, builder, provider })
    }
}
