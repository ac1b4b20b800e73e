// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fleet-core: domain model for ephemeral runner instances and their images.
//!
//! Nothing in this crate performs I/O. The launch state machine, tagging
//! scheme, recipe identity and instance-shape rules are all pure so that the
//! engine can drive them against real or fake adapters.

pub mod macros;

pub mod duration;
pub mod id;
pub mod image;
pub mod launch;
pub mod recipe;
pub mod request;
pub mod shape;
pub mod template;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use duration::{parse_duration, rate_expression, whole_days, DurationError};
pub use id::{short, TaskToken};
pub use image::{
    BlockDeviceMapping, BuildStatus, BuildVersionError, ImageArtifact, ImageBuildVersion, OwnerTags, BUILDER_TAG,
    NAME_TAG, STACK_TAG,
};
pub use launch::{
    AttemptRecord, FailureReason, LaunchEffect, LaunchInput, LaunchMachine, LaunchOutcome,
    LaunchState, TransitionError,
};
pub use recipe::{Component, ImageRecipe};
pub use request::{Placement, RunnerProvisioningRequest};
#[cfg(any(test, feature = "test-support"))]
pub use request::RunnerProvisioningRequestBuilder;
pub use shape::{Architecture, InstanceType, Os, ShapeError};
pub use template::{LaunchTemplate, LaunchTemplateId, MarketOptions, StorageOverride};
