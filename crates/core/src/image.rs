// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image artifacts, their backing snapshots, and build versions.
//!
//! Ownership of an artifact is decided only by its tags. There is no separate
//! manifest: the stack tag and builder tag written at distribution time are
//! the sole key the collectors filter on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const STACK_TAG: &str = "GitHubRunners:Stack";
pub const BUILDER_TAG: &str = "GitHubRunners:Builder";
pub const NAME_TAG: &str = "Name";

/// The (stack, builder) pair that owns an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerTags {
    pub stack: String,
    pub builder: String,
}

impl OwnerTags {
    pub fn new(stack: impl Into<String>, builder: impl Into<String>) -> Self {
        Self { stack: stack.into(), builder: builder.into() }
    }

    /// Full tag set stamped onto a newly distributed artifact.
    pub fn artifact_tags(&self, name: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (NAME_TAG.to_string(), name.to_string()),
            (STACK_TAG.to_string(), self.stack.clone()),
            (BUILDER_TAG.to_string(), self.builder.clone()),
        ])
    }

    /// Both tags must be present and equal; a partial match is not ownership.
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        tags.get(STACK_TAG) == Some(&self.stack) && tags.get(BUILDER_TAG) == Some(&self.builder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDeviceMapping {
    pub device_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

/// A bootable image as reported by the compute provider.
///
/// Fields are optional because provider listings can be partial; collectors
/// skip entries they cannot act on instead of failing the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub block_devices: Vec<BlockDeviceMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_device_name: Option<String>,
}

impl ImageArtifact {
    /// Snapshot ids referenced by this artifact's block devices.
    pub fn snapshot_ids(&self) -> impl Iterator<Item = &str> {
        self.block_devices.iter().filter_map(|b| b.snapshot_id.as_deref())
    }

    pub fn is_owned_by(&self, owner: &OwnerTags) -> bool {
        owner.matches(&self.tags)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum BuildStatus {
    Pending,
    Building,
    Testing,
    Distributing,
    Available,
    Failed(String),
    Cancelled,
}

crate::simple_display! {
    BuildStatus {
        Pending => "pending",
        Building => "building",
        Testing => "testing",
        Distributing => "distributing",
        Available => "available",
        Failed(..) => "failed",
        Cancelled => "cancelled",
    }
}

impl BuildStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Available | BuildStatus::Failed(_) | BuildStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildVersionError {
    #[error("build version {arn} is already {status} and cannot change")]
    AlreadyTerminal { arn: String, status: String },
    #[error("build version {0} finished without an output image")]
    MissingImage(String),
}

/// One execution of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBuildVersion {
    pub arn: String,
    pub recipe_name: String,
    pub status: BuildStatus,
    /// Output image, set only once the build is `Available`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub created_at_ms: u64,
}

impl ImageBuildVersion {
    pub fn new(arn: impl Into<String>, recipe_name: impl Into<String>, created_at_ms: u64) -> Self {
        Self {
            arn: arn.into(),
            recipe_name: recipe_name.into(),
            status: BuildStatus::Pending,
            image_id: None,
            created_at_ms,
        }
    }

    /// Move to a new non-terminal status.
    pub fn advance(&mut self, status: BuildStatus) -> Result<(), BuildVersionError> {
        self.ensure_open()?;
        if status == BuildStatus::Available {
            return Err(BuildVersionError::MissingImage(self.arn.clone()));
        }
        self.status = status;
        Ok(())
    }

    /// Finish successfully with exactly one output image.
    pub fn succeed(&mut self, image_id: impl Into<String>) -> Result<(), BuildVersionError> {
        self.ensure_open()?;
        self.status = BuildStatus::Available;
        self.image_id = Some(image_id.into());
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), BuildVersionError> {
        if self.status.is_terminal() {
            return Err(BuildVersionError::AlreadyTerminal {
                arn: self.arn.clone(),
                status: self.status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
