// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fast-launch runner provider: ties an AMI builder, the active launch
//! template and the orchestrator together for one runner configuration.

use crate::active::{ActiveImage, ActiveTemplate};
use crate::boot_script::{BootScriptParams, BootScriptTemplate, TemplateError};
use crate::builder::{BoundAmi, BuilderError, ImageBuilder};
use crate::config::{ConfigError, FleetConfig};
use crate::orchestrator::{LaunchOrchestrator, LaunchSettings, OrchestratorError};
use crate::pipeline::BuildPipeline;
use crate::signal::TaskTokenRegistry;
use fleet_adapters::{ComputeAdapter, ImageBuildService};
use fleet_core::{
    LaunchOutcome, LaunchTemplate, LaunchTemplateId, RunnerProvisioningRequest, NAME_TAG,
    STACK_TAG,
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

const PROVIDER_TYPE: &str = "FastLaunchProvider";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Builder(#[from] BuilderError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Read-only snapshot of a provider for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    #[serde(rename = "type")]
    pub kind: String,
    pub labels: Vec<String>,
    pub security_groups: Vec<String>,
    pub log_group: String,
    pub ami: AmiStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmiStatus {
    pub launch_template: LaunchTemplateId,
    pub ami_builder_log_group: String,
}

pub struct FastLaunchProvider<C: ComputeAdapter> {
    labels: Vec<String>,
    security_groups: Vec<String>,
    log_group: String,
    bound: BoundAmi,
    active: ActiveTemplate,
    script: BootScriptTemplate,
    orchestrator: LaunchOrchestrator<C>,
}

impl<C: ComputeAdapter> FastLaunchProvider<C> {
    pub fn new(
        config: &FleetConfig,
        builder: &dyn ImageBuilder,
        compute: C,
        signals: TaskTokenRegistry,
    ) -> Result<Self, ProviderError> {
        let p = &config.provider;
        let bound = builder.bind_ami()?;
        if !bound.architecture.instance_type_match(&p.instance_type) {
            return Err(ConfigError::ArchitectureMismatch {
                architecture: bound.architecture,
                instance_type: p.instance_type.clone(),
            }
            .into());
        }

        let template = LaunchTemplate::bind(
            bound.launch_template.image_id.clone(),
            p.instance_type.clone(),
            config.placements(),
            p.security_groups.clone(),
        );
        let active = ActiveTemplate::new(ActiveImage { template, root_device_name: None });
        let script = BootScriptTemplate::for_os(bound.os)?;
        let settings = LaunchSettings {
            heartbeat_timeout: p.heartbeat_timeout,
            launch_timeout: p.launch_timeout,
            instance_profile: Some(config.instance_profile()),
            storage_gib: p.storage_gib,
            os: bound.os,
            market: config.market(),
            tags: BTreeMap::from([
                (NAME_TAG.to_string(), format!("{}-runner", config.stack.name)),
                (STACK_TAG.to_string(), config.stack.name.clone()),
            ]),
        };
        let orchestrator = LaunchOrchestrator::new(
            compute,
            signals,
            active.clone(),
            script.clone(),
            settings,
        );

        tracing::info!(
            stack = %config.stack.name,
            labels = ?p.labels,
            template = %active.current().template.id,
            "runner provider ready"
        );
        Ok(Self {
            labels: p.labels.clone(),
            security_groups: p.security_groups.clone(),
            log_group: config.log_group(),
            bound,
            active,
            script,
            orchestrator,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn active(&self) -> &ActiveTemplate {
        &self.active
    }

    pub fn bound(&self) -> &BoundAmi {
        &self.bound
    }

    pub fn signals(&self) -> &TaskTokenRegistry {
        self.orchestrator.signals()
    }

    /// Runners started here always carry this provider's labels.
    fn with_labels(&self, request: &RunnerProvisioningRequest) -> RunnerProvisioningRequest {
        RunnerProvisioningRequest { labels: self.labels.clone(), ..request.clone() }
    }

    pub fn render_boot_script(&self, request: &RunnerProvisioningRequest) -> String {
        self.script.render(&BootScriptParams::from_request(&self.with_labels(request)))
    }

    pub async fn launch(
        &self,
        request: &RunnerProvisioningRequest,
    ) -> Result<LaunchOutcome, OrchestratorError> {
        self.orchestrator.launch(&self.with_labels(request)).await
    }

    /// A build runner for this provider's pipeline that activates its
    /// output for subsequent launches.
    pub fn pipeline<B: ImageBuildService>(&self, service: B, compute: C) -> BuildPipeline<B, C> {
        BuildPipeline::new(service, compute, self.bound.pipeline.name.clone(), self.active.clone())
    }

    pub fn status(&self) -> ProviderStatus {
        ProviderStatus {
            kind: PROVIDER_TYPE.to_string(),
            labels: self.labels.clone(),
            security_groups: self.security_groups.clone(),
            log_group: self.log_group.clone(),
            ami: AmiStatus {
                launch_template: self.active.current().template.id.clone(),
                ami_builder_log_group: self.bound.log_group.clone(),
            },
        }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
