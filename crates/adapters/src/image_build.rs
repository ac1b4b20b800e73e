// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image-build service adapter: pipeline executions and build versions.

use async_trait::async_trait;
use fleet_core::ImageBuildVersion;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageBuildError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("pipeline {0} already has a build in progress")]
    Busy(String),
    #[error("image build service error: {0}")]
    Service(String),
}

impl ImageBuildError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ImageBuildError::NotFound(_))
    }
}

#[async_trait]
pub trait ImageBuildService: Clone + Send + Sync + 'static {
    /// Start one pipeline execution and return the new build version's ARN.
    async fn start_pipeline(&self, pipeline_name: &str) -> Result<String, ImageBuildError>;

    async fn get_build_version(&self, arn: &str) -> Result<ImageBuildVersion, ImageBuildError>;

    /// Every build version produced from `recipe_name`, any status.
    async fn list_build_versions(
        &self,
        recipe_name: &str,
    ) -> Result<Vec<ImageBuildVersion>, ImageBuildError>;

    async fn delete_build_version(&self, arn: &str) -> Result<(), ImageBuildError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ImageBuildError, ImageBuildService};
    use async_trait::async_trait;
    use fleet_core::{BuildStatus, ImageBuildVersion};
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
    use std::sync::Arc;

    /// Recorded image-build call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum BuildCall {
        StartPipeline { pipeline: String },
        GetBuildVersion { arn: String },
        ListBuildVersions { recipe: String },
        DeleteBuildVersion { arn: String },
    }

    /// How the next started build ends.
    #[derive(Debug, Clone)]
    enum ScriptedBuild {
        Succeed(String),
        Fail(String),
    }

    #[derive(Default)]
    struct FakeImageBuildState {
        pipelines: HashMap<String, String>,
        versions: BTreeMap<String, ImageBuildVersion>,
        scripted: VecDeque<ScriptedBuild>,
        fail_delete: HashSet<String>,
        next_version: u32,
        calls: Vec<BuildCall>,
    }

    /// In-memory image-build service.
    ///
    /// A started build reports `Building` on its first poll and its scripted
    /// outcome on the next one. Builds with no scripted outcome stay `Building`.
    #[derive(Clone, Default)]
    pub struct FakeImageBuild {
        inner: Arc<Mutex<FakeImageBuildState>>,
    }

    impl FakeImageBuild {
        pub fn new() -> Self {
            Self::default()
        }

        /// Declare a pipeline and the recipe it builds.
        pub fn add_pipeline(&self, pipeline: &str, recipe: &str) {
            self.inner.lock().pipelines.insert(pipeline.to_string(), recipe.to_string());
        }

        pub fn succeed_next(&self, image_id: &str) {
            self.inner.lock().scripted.push_back(ScriptedBuild::Succeed(image_id.to_string()));
        }

        pub fn fail_next(&self, reason: &str) {
            self.inner.lock().scripted.push_back(ScriptedBuild::Fail(reason.to_string()));
        }

        pub fn insert_version(&self, version: ImageBuildVersion) {
            self.inner.lock().versions.insert(version.arn.clone(), version);
        }

        pub fn fail_delete(&self, arn: &str) {
            self.inner.lock().fail_delete.insert(arn.to_string());
        }

        pub fn version_arns(&self) -> Vec<String> {
            self.inner.lock().versions.keys().cloned().collect()
        }

        pub fn calls(&self) -> Vec<BuildCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl ImageBuildService for FakeImageBuild {
        async fn start_pipeline(&self, pipeline_name: &str) -> Result<String, ImageBuildError> {
            let mut state = self.inner.lock();
            state.calls.push(BuildCall::StartPipeline { pipeline: pipeline_name.to_string() });
            let recipe = state
                .pipelines
                .get(pipeline_name)
                .cloned()
                .ok_or_else(|| ImageBuildError::NotFound(pipeline_name.to_string()))?;
            let busy = state
                .versions
                .values()
                .any(|v| v.recipe_name == recipe && !v.status.is_terminal());
            if busy {
                return Err(ImageBuildError::Busy(pipeline_name.to_string()));
            }
            state.next_version += 1;
            let arn = format!("arn:image/{recipe}/1.0.{}", state.next_version);
            let created = u64::from(state.next_version);
            state.versions.insert(arn.clone(), ImageBuildVersion::new(&arn, recipe, created));
            Ok(arn)
        }

        async fn get_build_version(&self, arn: &str) -> Result<ImageBuildVersion, ImageBuildError> {
            let mut state = self.inner.lock();
            state.calls.push(BuildCall::GetBuildVersion { arn: arn.to_string() });
            let status = state
                .versions
                .get(arn)
                .map(|v| v.status.clone())
                .ok_or_else(|| ImageBuildError::NotFound(arn.to_string()))?;
            if status == BuildStatus::Building {
                if let Some(outcome) = state.scripted.pop_front() {
                    let version = state
                        .versions
                        .get_mut(arn)
                        .ok_or_else(|| ImageBuildError::NotFound(arn.to_string()))?;
                    let applied = match outcome {
                        ScriptedBuild::Succeed(image) => version.succeed(image),
                        ScriptedBuild::Fail(reason) => version.advance(BuildStatus::Failed(reason)),
                    };
                    applied.map_err(|e| ImageBuildError::Service(e.to_string()))?;
                }
            } else if status == BuildStatus::Pending {
                if let Some(version) = state.versions.get_mut(arn) {
                    version
                        .advance(BuildStatus::Building)
                        .map_err(|e| ImageBuildError::Service(e.to_string()))?;
                }
            }
            state
                .versions
                .get(arn)
                .cloned()
                .ok_or_else(|| ImageBuildError::NotFound(arn.to_string()))
        }

        async fn list_build_versions(
            &self,
            recipe_name: &str,
        ) -> Result<Vec<ImageBuildVersion>, ImageBuildError> {
            let mut state = self.inner.lock();
            state.calls.push(BuildCall::ListBuildVersions { recipe: recipe_name.to_string() });
            Ok(state.versions.values().filter(|v| v.recipe_name == recipe_name).cloned().collect())
        }

        async fn delete_build_version(&self, arn: &str) -> Result<(), ImageBuildError> {
            let mut state = self.inner.lock();
            state.calls.push(BuildCall::DeleteBuildVersion { arn: arn.to_string() });
            if state.fail_delete.contains(arn) {
                return Err(ImageBuildError::Service(format!("cannot delete {arn}")));
            }
            state
                .versions
                .remove(arn)
                .map(|_| ())
                .ok_or_else(|| ImageBuildError::NotFound(arn.to_string()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{BuildCall, FakeImageBuild};

#[cfg(test)]
#[path = "image_build_tests.rs"]
mod tests;
