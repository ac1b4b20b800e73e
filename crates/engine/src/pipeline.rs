// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one build of an image pipeline and activates its output.

use crate::active::{ActiveImage, ActiveTemplate};
use fleet_adapters::{ComputeAdapter, ImageBuildError, ImageBuildService};
use fleet_core::{BuildStatus, ImageBuildVersion};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Windows builds with fast-launch distribution regularly take over an hour.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Service(#[from] ImageBuildError),
    #[error("build {arn} failed: {reason}")]
    Failed { arn: String, reason: String },
    #[error("build {0} was cancelled")]
    Cancelled(String),
    #[error("build {0} finished without an output image")]
    MissingImage(String),
    #[error("build {arn} still running after {waited:?}")]
    Timeout { arn: String, waited: Duration },
}

pub struct BuildPipeline<B: ImageBuildService, C: ComputeAdapter> {
    service: B,
    compute: C,
    pipeline_name: String,
    active: ActiveTemplate,
    poll_interval: Duration,
    build_timeout: Duration,
}

impl<B: ImageBuildService, C: ComputeAdapter> BuildPipeline<B, C> {
    pub fn new(
        service: B,
        compute: C,
        pipeline_name: impl Into<String>,
        active: ActiveTemplate,
    ) -> Self {
        Self {
            service,
            compute,
            pipeline_name: pipeline_name.into(),
            active,
            poll_interval: DEFAULT_POLL_INTERVAL,
            build_timeout: DEFAULT_BUILD_TIMEOUT,
        }
    }

    pub fn with_polling(mut self, poll_interval: Duration, build_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.build_timeout = build_timeout;
        self
    }

    /// Start a build, wait for it, and on success activate a new template
    /// bound to the output image.
    ///
    /// A failed or cancelled build produces no image and leaves the active
    /// template as it was.
    pub async fn run_build(&self) -> Result<(ImageBuildVersion, Arc<ActiveImage>), PipelineError> {
        let arn = self.service.start_pipeline(&self.pipeline_name).await?;
        tracing::info!(pipeline = %self.pipeline_name, arn = %arn, "build started");

        let version = tokio::time::timeout(self.build_timeout, self.wait(&arn))
            .await
            .map_err(|_| PipelineError::Timeout { arn: arn.clone(), waited: self.build_timeout })??;

        match &version.status {
            BuildStatus::Available => {}
            BuildStatus::Failed(reason) => {
                tracing::warn!(arn = %arn, reason = %reason, "build failed, active template unchanged");
                return Err(PipelineError::Failed { arn, reason: reason.clone() });
            }
            _ => {
                tracing::warn!(arn = %arn, status = %version.status, "build cancelled");
                return Err(PipelineError::Cancelled(arn));
            }
        }
        let image_id =
            version.image_id.clone().ok_or_else(|| PipelineError::MissingImage(arn.clone()))?;

        let root_device_name = match self.compute.describe_image(&image_id).await {
            Ok(image) => image.and_then(|i| i.root_device_name),
            Err(e) => {
                tracing::warn!(image_id = %image_id, error = %e, "root device lookup failed, using default");
                None
            }
        };
        let current = self.active.current();
        let next = ActiveImage { template: current.template.rebind(&image_id), root_device_name };
        let previous = self.active.swap(next);
        let active = self.active.current();
        tracing::info!(
            image_id = %image_id,
            template = %active.template.id,
            previous_template = %previous.template.id,
            "activated new image"
        );
        Ok((version, active))
    }

    async fn wait(&self, arn: &str) -> Result<ImageBuildVersion, PipelineError> {
        loop {
            let version = self.service.get_build_version(arn).await?;
            if version.status.is_terminal() {
                return Ok(version);
            }
            tracing::debug!(arn, status = %version.status, "build in progress");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
