// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compute provider adapter: instance launches and image/snapshot storage.

use async_trait::async_trait;
use fleet_core::{ImageArtifact, LaunchTemplateId, MarketOptions, OwnerTags, Placement, StorageOverride};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Coarse classification of provider error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeErrorKind {
    /// No on-demand capacity (or addresses, or instance type support) in this placement.
    Capacity,
    /// Spot market could not satisfy the request.
    SpotCapacity,
    Throttled,
    /// The launch call itself timed out or the service was unavailable.
    LaunchTimeout,
    NotFound,
    /// Still referenced by something else (e.g. snapshot of a live image).
    InUse,
    InvalidRequest,
    Unauthorized,
    Other,
}

fleet_core::simple_display! {
    ComputeErrorKind {
        Capacity => "capacity",
        SpotCapacity => "spot_capacity",
        Throttled => "throttled",
        LaunchTimeout => "launch_timeout",
        NotFound => "not_found",
        InUse => "in_use",
        InvalidRequest => "invalid_request",
        Unauthorized => "unauthorized",
        Other => "other",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ComputeError {
    pub kind: ComputeErrorKind,
    pub code: String,
    pub message: String,
}

impl ComputeError {
    /// Classify a provider error code.
    pub fn from_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let kind = match code.as_str() {
            "InsufficientInstanceCapacity"
            | "InsufficientHostCapacity"
            | "InsufficientCapacity"
            | "InsufficientFreeAddressesInSubnet"
            | "Unsupported" => ComputeErrorKind::Capacity,
            "InsufficientSpotCapacity" | "SpotMaxPriceTooLow" | "MaxSpotInstanceCountExceeded" => {
                ComputeErrorKind::SpotCapacity
            }
            "RequestLimitExceeded" | "Throttling" => ComputeErrorKind::Throttled,
            "RequestTimeout" | "ServiceUnavailable" | "Unavailable" | "InternalError" => {
                ComputeErrorKind::LaunchTimeout
            }
            "UnauthorizedOperation" | "AuthFailure" => ComputeErrorKind::Unauthorized,
            c if c.ends_with(".InUse") => ComputeErrorKind::InUse,
            c if c.ends_with(".NotFound") => ComputeErrorKind::NotFound,
            c if c.starts_with("InvalidParameter") || c.starts_with("Invalid") => {
                ComputeErrorKind::InvalidRequest
            }
            _ => ComputeErrorKind::Other,
        };
        Self { kind, code, message: message.into() }
    }

    /// Capacity and timeout class errors move the launch to the next placement.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ComputeErrorKind::Capacity
                | ComputeErrorKind::SpotCapacity
                | ComputeErrorKind::Throttled
                | ComputeErrorKind::LaunchTimeout
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ComputeErrorKind::NotFound
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownBehavior {
    /// Powering off from inside the instance releases it.
    #[default]
    Terminate,
    Stop,
}

/// One launch call: exactly one instance into one placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    pub launch_template_id: LaunchTemplateId,
    pub placement: Placement,
    /// Rendered boot script, plain text; the adapter applies any transport encoding.
    pub user_data: String,
    /// Idempotency key; a repeated call with the same key never starts a second instance.
    pub client_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_profile: Option<String>,
    pub shutdown_behavior: ShutdownBehavior,
    pub require_imds_tokens: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_volume: Option<StorageOverride>,
    pub market: MarketOptions,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Compute provider operations used by the orchestrator and the collectors.
#[async_trait]
pub trait ComputeAdapter: Clone + Send + Sync + 'static {
    /// Start one instance. Returns its id once the provider has accepted it.
    async fn run_instance(&self, spec: &LaunchSpec) -> Result<String, ComputeError>;

    /// List images owned by this account carrying both owner tags.
    async fn describe_images(&self, owner: &OwnerTags) -> Result<Vec<ImageArtifact>, ComputeError>;

    /// Look up a single image. `Ok(None)` means it does not exist.
    async fn describe_image(&self, image_id: &str) -> Result<Option<ImageArtifact>, ComputeError>;

    async fn deregister_image(&self, image_id: &str) -> Result<(), ComputeError>;

    async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ComputeError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ComputeAdapter, ComputeError, LaunchSpec};
    use async_trait::async_trait;
    use fleet_core::{ImageArtifact, OwnerTags};
    use parking_lot::Mutex;
    use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
    use std::sync::Arc;

    /// Recorded compute call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ComputeCall {
        RunInstance { subnet: String, client_token: String },
        DescribeImages { stack: String, builder: String },
        DescribeImage { image_id: String },
        DeregisterImage { image_id: String },
        DeleteSnapshot { snapshot_id: String },
    }

    #[derive(Default)]
    struct FakeComputeState {
        images: Vec<ImageArtifact>,
        snapshots: BTreeSet<String>,
        launch_results: HashMap<String, VecDeque<Result<String, ComputeError>>>,
        launched: HashMap<String, String>,
        hanging: HashSet<String>,
        next_instance: u32,
        fail_deregister: HashSet<String>,
        fail_snapshot: HashSet<String>,
        fail_describe: HashSet<String>,
        fail_listing: Option<ComputeError>,
        calls: Vec<ComputeCall>,
    }

    /// In-memory compute provider.
    ///
    /// Mirrors provider rules the collectors depend on: deleting something
    /// that is gone returns a `.NotFound` error, and a snapshot still backing
    /// a registered image cannot be deleted (`InvalidSnapshot.InUse`).
    #[derive(Clone, Default)]
    pub struct FakeCompute {
        inner: Arc<Mutex<FakeComputeState>>,
    }

    impl FakeCompute {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register an image and the snapshots it references.
        pub fn add_image(&self, image: ImageArtifact) {
            let mut state = self.inner.lock();
            for snap in image.snapshot_ids() {
                state.snapshots.insert(snap.to_string());
            }
            state.images.push(image);
        }

        /// Add a snapshot not referenced by any image.
        pub fn add_snapshot(&self, snapshot_id: &str) {
            self.inner.lock().snapshots.insert(snapshot_id.to_string());
        }

        /// Queue the result of the next launch into `subnet`.
        ///
        /// Subnets with nothing queued launch successfully.
        pub fn push_launch_result(&self, subnet: &str, result: Result<String, ComputeError>) {
            self.inner.lock().launch_results.entry(subnet.to_string()).or_default().push_back(result);
        }

        /// Launches into `subnet` never return.
        pub fn hang_launches(&self, subnet: &str) {
            self.inner.lock().hanging.insert(subnet.to_string());
        }

        pub fn fail_deregister(&self, image_id: &str) {
            self.inner.lock().fail_deregister.insert(image_id.to_string());
        }

        pub fn fail_snapshot_delete(&self, snapshot_id: &str) {
            self.inner.lock().fail_snapshot.insert(snapshot_id.to_string());
        }

        pub fn fail_describe(&self, image_id: &str) {
            self.inner.lock().fail_describe.insert(image_id.to_string());
        }

        pub fn fail_listing(&self, error: ComputeError) {
            self.inner.lock().fail_listing = Some(error);
        }

        pub fn image_ids(&self) -> Vec<String> {
            self.inner.lock().images.iter().filter_map(|i| i.image_id.clone()).collect()
        }

        pub fn snapshot_ids(&self) -> Vec<String> {
            self.inner.lock().snapshots.iter().cloned().collect()
        }

        /// Instance id → client token for every accepted launch.
        pub fn launched(&self) -> HashMap<String, String> {
            self.inner.lock().launched.clone()
        }

        pub fn calls(&self) -> Vec<ComputeCall> {
            self.inner.lock().calls.clone()
        }

        pub fn clear_calls(&self) {
            self.inner.lock().calls.clear();
        }
    }

    #[async_trait]
    impl ComputeAdapter for FakeCompute {
        async fn run_instance(&self, spec: &LaunchSpec) -> Result<String, ComputeError> {
            let subnet = spec.placement.subnet_id.clone();
            let hang = {
                let mut state = self.inner.lock();
                state.calls.push(ComputeCall::RunInstance {
                    subnet: subnet.clone(),
                    client_token: spec.client_token.clone(),
                });
                state.hanging.contains(&subnet)
            };
            if hang {
                std::future::pending::<()>().await;
            }
            let mut state = self.inner.lock();
            if let Some((id, _)) =
                state.launched.iter().find(|(_, token)| **token == spec.client_token)
            {
                return Ok(id.clone());
            }
            let scripted = state.launch_results.get_mut(&subnet).and_then(|q| q.pop_front());
            let result = match scripted {
                Some(r) => r,
                None => {
                    state.next_instance += 1;
                    Ok(format!("i-{:08x}", state.next_instance))
                }
            };
            if let Ok(id) = &result {
                state.launched.insert(id.clone(), spec.client_token.clone());
            }
            result
        }

        async fn describe_images(
            &self,
            owner: &OwnerTags,
        ) -> Result<Vec<ImageArtifact>, ComputeError> {
            let mut state = self.inner.lock();
            state.calls.push(ComputeCall::DescribeImages {
                stack: owner.stack.clone(),
                builder: owner.builder.clone(),
            });
            if let Some(err) = state.fail_listing.clone() {
                return Err(err);
            }
            Ok(state.images.iter().filter(|i| i.is_owned_by(owner)).cloned().collect())
        }

        async fn describe_image(&self, image_id: &str) -> Result<Option<ImageArtifact>, ComputeError> {
            let mut state = self.inner.lock();
            state.calls.push(ComputeCall::DescribeImage { image_id: image_id.to_string() });
            if state.fail_describe.contains(image_id) {
                return Err(ComputeError::from_code("InternalError", "describe failed"));
            }
            Ok(state.images.iter().find(|i| i.image_id.as_deref() == Some(image_id)).cloned())
        }

        async fn deregister_image(&self, image_id: &str) -> Result<(), ComputeError> {
            let mut state = self.inner.lock();
            state.calls.push(ComputeCall::DeregisterImage { image_id: image_id.to_string() });
            if state.fail_deregister.contains(image_id) {
                return Err(ComputeError::from_code("UnauthorizedOperation", "deregister denied"));
            }
            let before = state.images.len();
            state.images.retain(|i| i.image_id.as_deref() != Some(image_id));
            if state.images.len() == before {
                return Err(ComputeError::from_code(
                    "InvalidAMIID.NotFound",
                    format!("image {image_id} does not exist"),
                ));
            }
            Ok(())
        }

        async fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ComputeError> {
            let mut state = self.inner.lock();
            state.calls.push(ComputeCall::DeleteSnapshot { snapshot_id: snapshot_id.to_string() });
            if state.fail_snapshot.contains(snapshot_id) {
                return Err(ComputeError::from_code("RequestLimitExceeded", "slow down"));
            }
            if state.images.iter().any(|i| i.snapshot_ids().any(|s| s == snapshot_id)) {
                return Err(ComputeError::from_code(
                    "InvalidSnapshot.InUse",
                    format!("snapshot {snapshot_id} is in use by a registered image"),
                ));
            }
            if !state.snapshots.remove(snapshot_id) {
                return Err(ComputeError::from_code(
                    "InvalidSnapshot.NotFound",
                    format!("snapshot {snapshot_id} does not exist"),
                ));
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ComputeCall, FakeCompute};

#[cfg(test)]
#[path = "compute_tests.rs"]
mod tests;
