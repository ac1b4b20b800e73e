// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image reaper: deletes build versions whose output image no longer exists.

use fleet_adapters::{ComputeAdapter, ImageBuildError, ImageBuildService};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const REAPER_TIMEOUT: Duration = Duration::from_secs(3 * 60);

#[derive(Debug, Error)]
pub enum ReaperError {
    #[error("listing build versions failed: {0}")]
    Listing(#[source] ImageBuildError),
    #[error("reap did not finish within {0:?}")]
    Timeout(Duration),
}

/// Reaper invocation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReaperEvent {
    pub recipe_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReapReport {
    pub listed: usize,
    pub deleted: Vec<String>,
    pub kept: usize,
    pub errors: Vec<String>,
}

pub struct ImageReaper<B: ImageBuildService, C: ComputeAdapter> {
    builds: B,
    compute: C,
    timeout: Duration,
}

impl<B: ImageBuildService, C: ComputeAdapter> ImageReaper<B, C> {
    pub fn new(builds: B, compute: C) -> Self {
        Self { builds, compute, timeout: REAPER_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn handle(&self, event: &ReaperEvent) -> Result<ReapReport, ReaperError> {
        tokio::time::timeout(self.timeout, self.reap(&event.recipe_name))
            .await
            .map_err(|_| ReaperError::Timeout(self.timeout))?
    }

    /// Delete every build version of `recipe_name` whose image is gone.
    ///
    /// Versions with no image (failed or still running) are kept. A failed
    /// image lookup keeps the version and moves on.
    pub async fn reap(&self, recipe_name: &str) -> Result<ReapReport, ReaperError> {
        let versions =
            self.builds.list_build_versions(recipe_name).await.map_err(ReaperError::Listing)?;
        let mut report = ReapReport { listed: versions.len(), ..Default::default() };
        tracing::info!(recipe = recipe_name, count = versions.len(), "found build versions");

        for version in &versions {
            let Some(image_id) = version.image_id.as_deref() else {
                report.kept += 1;
                continue;
            };
            match self.compute.describe_image(image_id).await {
                Ok(Some(_)) => report.kept += 1,
                Ok(None) => match self.builds.delete_build_version(&version.arn).await {
                    Ok(()) => {
                        tracing::info!(arn = %version.arn, image_id, "deleted orphaned build version");
                        report.deleted.push(version.arn.clone());
                    }
                    Err(e) if e.is_not_found() => {
                        tracing::debug!(arn = %version.arn, "build version already gone");
                    }
                    Err(e) => {
                        tracing::warn!(arn = %version.arn, error = %e, "build version delete failed");
                        report.errors.push(format!("{}: {e}", version.arn));
                    }
                },
                Err(e) => {
                    tracing::warn!(arn = %version.arn, image_id, error = %e, "image lookup failed, keeping version");
                    report.kept += 1;
                    report.errors.push(format!("{}: {e}", version.arn));
                }
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
