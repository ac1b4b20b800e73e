// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-engine: launches runners and keeps their images current.
//!
//! The launch side renders a boot script, walks the placement chain and
//! waits on the task-token registry for the instance to report back. The
//! image side binds an AMI builder, runs builds into the active template,
//! and collects artifacts and build versions nothing refers to anymore.

pub mod active;
pub mod boot_script;
pub mod builder;
pub mod cleaner;
pub mod config;
pub mod orchestrator;
pub mod pipeline;
pub mod provider;
pub mod reaper;
pub mod registry;
pub mod signal;

pub use active::{ActiveImage, ActiveTemplate};
pub use boot_script::{escape, BootScriptParams, BootScriptTemplate, TemplateError};
pub use builder::{
    AmiBuilderSettings, BoundAmi, BoundDockerImage, BuilderError, BuilderInfrastructure,
    DistributionConfig, FastLaunchAmiBuilder, ImageBuilder, ImageDefinition, PipelineDefinition,
};
pub use cleaner::{AmiCleaner, CleanerError, CleanerEvent, CleanerOutcome, RequestType, SweepReport};
pub use config::{ConfigError, FleetConfig};
pub use orchestrator::{LaunchOrchestrator, LaunchSettings, OrchestratorError};
pub use pipeline::{BuildPipeline, PipelineError};
pub use provider::{FastLaunchProvider, ProviderError, ProviderStatus};
pub use reaper::{ImageReaper, ReapReport, ReaperError, ReaperEvent};
pub use registry::CollectorRegistry;
pub use signal::{TaskSignal, TaskTokenRegistry, TaskWaiter, TokenError};
