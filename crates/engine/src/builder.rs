// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image builder capability and the fast-launch AMI builder.
//!
//! A builder turns a recipe into the definitions the image-build service
//! runs: one infrastructure context, one image definition, one pipeline with
//! its distribution settings. Builders that cannot produce some kind of
//! output say so with [`BuilderError::UnsupportedCapability`].

use crate::cleaner::CLEANER_TIMEOUT;
use crate::reaper::REAPER_TIMEOUT;
use crate::registry::{
    CollectorFunction, CollectorRegistry, CollectorSchedule, TeardownHook, DAILY, DELETE_AMI,
    REAPER,
};
use fleet_core::{
    rate_expression, whole_days, Architecture, Component, ImageRecipe, InstanceType,
    LaunchTemplate, LaunchTemplateId, Os, OwnerTags, Placement,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Pre-warm policy for fast launch.
pub const FAST_LAUNCH_MAX_PARALLEL_LAUNCHES: u32 = 6;
pub const FAST_LAUNCH_TARGET_RESOURCE_COUNT: u32 = 5;
/// Shape of the builder's own launch template used for pre-warming.
pub const PREWARM_INSTANCE_TYPE: &str = "t3a.large";
/// Build instances need a second metadata hop for container steps.
pub const IMDS_HOP_LIMIT: u8 = 2;
/// Distributed AMI names are cut to this length before the date suffix.
const AMI_NAME_MAX: usize = 90;
const BUILD_DATE_SUFFIX: &str = "{{ imagebuilder:buildDate }}";
const RUNNER_VERSION_UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("{0} is not supported by this builder")]
    UnsupportedCapability(&'static str),
    #[error("Builder architecture ({architecture}) doesn't match selected instance type ({instance_type} / {})", instance_type.architecture())]
    ArchitectureMismatch { architecture: Architecture, instance_type: InstanceType },
    #[error("component {component} targets {platform}, builder is {os}")]
    ForeignComponent { component: String, platform: Os, os: Os },
    #[error("invalid builder shape: {0}")]
    Shape(#[from] fleet_core::ShapeError),
}

/// Everything a fast-launch AMI builder needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct AmiBuilderSettings {
    pub stack_name: String,
    pub region: String,
    pub account: String,
    /// Logical path of the builder, e.g. `runners/windows-fast`.
    pub builder_path: String,
    pub os: Os,
    pub architecture: Architecture,
    pub base_image: String,
    pub instance_type: InstanceType,
    /// Zero disables scheduled rebuilds.
    pub rebuild_interval: Duration,
    pub subnet: Placement,
    pub security_groups: Vec<String>,
    pub components: Vec<Component>,
    pub log_retention_days: u32,
}

impl AmiBuilderSettings {
    pub fn owner(&self) -> OwnerTags {
        OwnerTags::new(&self.stack_name, &self.builder_path)
    }

    /// Last segment of the builder path.
    pub fn builder_id(&self) -> &str {
        self.builder_path.rsplit('/').next().unwrap_or(&self.builder_path)
    }

    /// Deployment-unique name for resources owned by this builder.
    pub fn unique_name(&self) -> String {
        unique_name(&self.stack_name, &self.builder_path, AMI_NAME_MAX)
    }
}

/// `<stack>-<path>` with anything outside `[A-Za-z0-9_-]` replaced by `-`,
/// cut to `max` characters.
pub fn unique_name(stack: &str, path: &str, max: usize) -> String {
    format!("{stack}-{path}")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
        .take(max)
        .collect()
}

/// Compute, network and role context the build instances run in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuilderInfrastructure {
    pub name: String,
    pub instance_types: Vec<InstanceType>,
    pub subnet: Placement,
    pub security_groups: Vec<String>,
    pub instance_profile: String,
    pub http_tokens_required: bool,
    pub http_put_response_hop_limit: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeLog {
    pub group: String,
    pub retention_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDefinition {
    pub recipe: ImageRecipe,
    pub recipe_name: String,
    pub infrastructure: String,
    pub log: RecipeLog,
    pub image_tests_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmiDistribution {
    pub name: String,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastLaunchConfig {
    pub account_id: String,
    pub enabled: bool,
    pub launch_template_id: LaunchTemplateId,
    pub max_parallel_launches: u32,
    pub target_resource_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionConfig {
    pub name: String,
    pub region: String,
    pub ami: AmiDistribution,
    pub launch_template_ids: Vec<LaunchTemplateId>,
    /// Fast launch exists only for Windows images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fast_launch: Option<FastLaunchConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartCondition {
    /// Start on every tick, whether or not the recipe changed.
    ExpressionMatchOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSchedule {
    pub expression: String,
    pub start_condition: StartCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineDefinition {
    pub name: String,
    pub recipe_name: String,
    pub infrastructure: String,
    pub distribution: DistributionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<PipelineSchedule>,
    pub image_tests_enabled: bool,
}

/// What a runner provider gets from binding an AMI builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundAmi {
    /// Launch template the distribution keeps pointed at the newest image.
    pub launch_template: LaunchTemplate,
    pub architecture: Architecture,
    pub os: Os,
    pub log_group: String,
    pub runner_version: String,
    pub owner: OwnerTags,
    pub pipeline: PipelineDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundDockerImage {
    pub repository: String,
    pub tag: String,
    pub architecture: Architecture,
    pub os: Os,
    pub log_group: String,
}

/// Capabilities an image builder variant may offer.
pub trait ImageBuilder: Send + Sync {
    fn bind_ami(&self) -> Result<BoundAmi, BuilderError>;

    fn bind_docker_image(&self) -> Result<BoundDockerImage, BuilderError>;

    /// The builder's infrastructure context. Repeated calls return the same one.
    fn create_infrastructure(&self) -> Result<BuilderInfrastructure, BuilderError>;

    fn create_image(
        &self,
        infrastructure: &BuilderInfrastructure,
        log: &RecipeLog,
        recipe: &ImageRecipe,
    ) -> Result<ImageDefinition, BuilderError>;

    fn create_pipeline(
        &self,
        image: &ImageDefinition,
        distribution: DistributionConfig,
    ) -> Result<PipelineDefinition, BuilderError>;
}

/// Builds Windows (or Linux) AMIs and distributes them with fast launch
/// pre-warming.
pub struct FastLaunchAmiBuilder {
    settings: AmiBuilderSettings,
    registry: CollectorRegistry,
    infrastructure: Mutex<Option<BuilderInfrastructure>>,
    bound: Mutex<Option<BoundAmi>>,
}

impl FastLaunchAmiBuilder {
    pub fn new(
        settings: AmiBuilderSettings,
        registry: CollectorRegistry,
    ) -> Result<Self, BuilderError> {
        if !settings.architecture.instance_type_match(&settings.instance_type) {
            return Err(BuilderError::ArchitectureMismatch {
                architecture: settings.architecture,
                instance_type: settings.instance_type.clone(),
            });
        }
        Ok(Self {
            settings,
            registry,
            infrastructure: Mutex::new(None),
            bound: Mutex::new(None),
        })
    }

    pub fn settings(&self) -> &AmiBuilderSettings {
        &self.settings
    }

    fn recipe(&self) -> Result<ImageRecipe, BuilderError> {
        let recipe = ImageRecipe {
            name_prefix: self.settings.unique_name(),
            base_image: self.settings.base_image.clone(),
            architecture: self.settings.architecture,
            platform: self.settings.os,
            components: self.settings.components.clone(),
        };
        if let Some(c) = recipe.foreign_components().next() {
            return Err(BuilderError::ForeignComponent {
                component: c.name.clone(),
                platform: c.platform,
                os: self.settings.os,
            });
        }
        Ok(recipe)
    }

    fn distribution(&self, launch_template: &LaunchTemplate) -> DistributionConfig {
        let s = &self.settings;
        let name = s.unique_name();
        let fast_launch = (s.os == Os::Windows).then(|| FastLaunchConfig {
            account_id: s.account.clone(),
            enabled: true,
            launch_template_id: launch_template.id.clone(),
            max_parallel_launches: FAST_LAUNCH_MAX_PARALLEL_LAUNCHES,
            target_resource_count: FAST_LAUNCH_TARGET_RESOURCE_COUNT,
        });
        DistributionConfig {
            ami: AmiDistribution {
                name: format!("{name}-{BUILD_DATE_SUFFIX}"),
                tags: s.owner().artifact_tags(s.builder_id()),
            },
            name,
            region: s.region.clone(),
            launch_template_ids: vec![launch_template.id.clone()],
            fast_launch,
        }
    }

    /// Register the shared collectors and this builder's schedules.
    fn register_collectors(&self, launch_template: &LaunchTemplate, recipe_name: &str) {
        let s = &self.settings;
        self.registry.function(DELETE_AMI, || CollectorFunction {
            name: DELETE_AMI.to_string(),
            description: "Delete old GitHub Runner AMIs".to_string(),
            timeout: CLEANER_TIMEOUT,
            log_retention_days: 30,
        });
        self.registry.function(REAPER, || CollectorFunction {
            name: REAPER.to_string(),
            description: "Image build version reaper deletes old image build versions pointing to deleted AMIs".to_string(),
            timeout: REAPER_TIMEOUT,
            log_retention_days: 30,
        });

        self.registry.add_schedule(CollectorSchedule {
            id: "Delete AMI Schedule".to_string(),
            owner: s.builder_path.clone(),
            collector: DELETE_AMI.to_string(),
            expression: DAILY.to_string(),
            description: format!("Delete old AMIs for {}", s.builder_path),
            payload: serde_json::json!({
                "RequestType": "Scheduled",
                "LaunchTemplateId": launch_template.id,
                "StackName": s.stack_name,
                "BuilderName": s.builder_path,
            }),
        });
        self.registry.add_schedule(CollectorSchedule {
            id: "Reaper Schedule AMI".to_string(),
            owner: s.builder_path.clone(),
            collector: REAPER.to_string(),
            expression: DAILY.to_string(),
            description: format!("Delete old image build versions for {recipe_name}"),
            payload: serde_json::json!({ "RecipeName": recipe_name }),
        });
        self.registry.add_teardown(TeardownHook {
            resource_type: "Custom::AmiDeleter".to_string(),
            owner: s.builder_path.clone(),
            collector: DELETE_AMI.to_string(),
            properties: serde_json::json!({
                "StackName": s.stack_name,
                "BuilderName": s.builder_path,
            }),
        });
    }
}

impl ImageBuilder for FastLaunchAmiBuilder {
    fn bind_ami(&self) -> Result<BoundAmi, BuilderError> {
        if let Some(bound) = self.bound.lock().as_ref() {
            return Ok(bound.clone());
        }

        let s = &self.settings;
        let recipe = self.recipe()?;
        let recipe_name = recipe.name();
        let log = RecipeLog {
            group: format!("/aws/imagebuilder/{recipe_name}"),
            retention_days: s.log_retention_days,
        };
        let infrastructure = self.create_infrastructure()?;
        let image = self.create_image(&infrastructure, &log, &recipe)?;

        // Seeded with the base image; each distribution moves it to the new AMI.
        let launch_template = LaunchTemplate::bind(
            s.base_image.clone(),
            PREWARM_INSTANCE_TYPE.parse::<InstanceType>()?,
            vec![s.subnet.clone()],
            s.security_groups.clone(),
        );
        let pipeline = self.create_pipeline(&image, self.distribution(&launch_template))?;
        self.register_collectors(&launch_template, &recipe_name);

        let bound = BoundAmi {
            launch_template,
            architecture: s.architecture,
            os: s.os,
            log_group: log.group,
            runner_version: RUNNER_VERSION_UNKNOWN.to_string(),
            owner: s.owner(),
            pipeline,
        };
        tracing::info!(
            builder = %s.builder_path,
            recipe = %recipe_name,
            schedule = ?bound.pipeline.schedule.as_ref().map(|p| &p.expression),
            "ami builder bound"
        );
        *self.bound.lock() = Some(bound.clone());
        Ok(bound)
    }

    fn bind_docker_image(&self) -> Result<BoundDockerImage, BuilderError> {
        Err(BuilderError::UnsupportedCapability("docker image"))
    }

    fn create_infrastructure(&self) -> Result<BuilderInfrastructure, BuilderError> {
        let mut slot = self.infrastructure.lock();
        if let Some(infra) = slot.as_ref() {
            return Ok(infra.clone());
        }
        let s = &self.settings;
        let name = s.unique_name();
        let infra = BuilderInfrastructure {
            instance_profile: format!("{name}-profile"),
            name,
            instance_types: vec![s.instance_type.clone()],
            subnet: s.subnet.clone(),
            security_groups: s.security_groups.clone(),
            http_tokens_required: true,
            http_put_response_hop_limit: IMDS_HOP_LIMIT,
        };
        *slot = Some(infra.clone());
        Ok(infra)
    }

    fn create_image(
        &self,
        infrastructure: &BuilderInfrastructure,
        log: &RecipeLog,
        recipe: &ImageRecipe,
    ) -> Result<ImageDefinition, BuilderError> {
        Ok(ImageDefinition {
            recipe_name: recipe.name(),
            recipe: recipe.clone(),
            infrastructure: infrastructure.name.clone(),
            log: log.clone(),
            image_tests_enabled: false,
        })
    }

    fn create_pipeline(
        &self,
        image: &ImageDefinition,
        distribution: DistributionConfig,
    ) -> Result<PipelineDefinition, BuilderError> {
        let interval = self.settings.rebuild_interval;
        let schedule = if whole_days(interval) > 0 {
            rate_expression(interval).map(|expression| PipelineSchedule {
                expression,
                start_condition: StartCondition::ExpressionMatchOnly,
            })
        } else {
            None
        };
        Ok(PipelineDefinition {
            name: self.settings.unique_name(),
            recipe_name: image.recipe_name.clone(),
            infrastructure: image.infrastructure.clone(),
            distribution,
            schedule,
            image_tests_enabled: false,
        })
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
