// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapters for running commands without a cloud account.
//!
//! Listings come back empty, mutations are logged and reported as done,
//! and anything that would start compute is refused.

use async_trait::async_trait;
use fleet_adapters::{
    redact_url, AckError, AckResponse, AckSink, ComputeAdapter, ComputeError, ImageBuildError,
    ImageBuildService, LaunchSpec,
};
use fleet_core::{ImageArtifact, ImageBuildVersion, OwnerTags};

const DRY_RUN_CODE: &str = "DryRunOperation";

#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunCompute;

#[async_trait]
impl ComputeAdapter for DryRunCompute {
    async fn run_instance(&self, spec: &LaunchSpec) -> Result<String, ComputeError> {
        tracing::info!(placement = %spec.placement, client_token = %spec.client_token, "dry run: launch refused");
        Err(ComputeError::from_code(DRY_RUN_CODE, "launches are disabled in dry-run mode"))
    }

    async fn describe_images(&self, owner: &OwnerTags) -> Result<Vec<ImageArtifact>, ComputeError> {
        tracing::info!(stack = %owner.stack, builder = %owner.builder, "dry run: no images listed");
        Ok(Vec::new())
    }

    async fn describe_image(&self, _image_id: &str) -> Result<Option<ImageArtifact>, ComputeError> {
        Ok(None)
    }

    async fn deregister_image(&self, image_id: &str) -> Result<(), ComputeError> {
        tracing::info!(image_id, "dry run: would deregister");
        Ok(())
    }

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ComputeError> {
        tracing::info!(snapshot_id, "dry run: would delete snapshot");
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunImageBuild;

#[async_trait]
impl ImageBuildService for DryRunImageBuild {
    async fn start_pipeline(&self, pipeline_name: &str) -> Result<String, ImageBuildError> {
        Err(ImageBuildError::Service(format!("dry run: {pipeline_name} not started")))
    }

    async fn get_build_version(&self, arn: &str) -> Result<ImageBuildVersion, ImageBuildError> {
        Err(ImageBuildError::NotFound(arn.to_string()))
    }

    async fn list_build_versions(
        &self,
        recipe_name: &str,
    ) -> Result<Vec<ImageBuildVersion>, ImageBuildError> {
        tracing::info!(recipe = recipe_name, "dry run: no build versions listed");
        Ok(Vec::new())
    }

    async fn delete_build_version(&self, arn: &str) -> Result<(), ImageBuildError> {
        tracing::info!(arn, "dry run: would delete build version");
        Ok(())
    }
}

/// Logs the acknowledgement instead of delivering it.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunAck;

#[async_trait]
impl AckSink for DryRunAck {
    async fn respond(&self, response_url: &str, response: &AckResponse) -> Result<(), AckError> {
        tracing::info!(
            url = %redact_url(response_url),
            status = %response.status,
            physical_id = %response.physical_resource_id,
            "dry run: acknowledgement not sent"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "dry_run_tests.rs"]
mod tests;
