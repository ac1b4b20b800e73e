// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AMI cleaner: deletes every image owned by a (stack, builder) pair
//! together with its snapshots.
//!
//! Invoked on a daily schedule and on teardown of the owning builder. The
//! teardown path must always be acknowledged, with `FAILED` if anything went
//! wrong, or the owner's deletion hangs.

use fleet_adapters::{
    redact_url, AckError, AckResponse, AckSink, AckStatus, ComputeAdapter, ComputeError,
};
use fleet_core::OwnerTags;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const CLEANER_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Physical id reported for the teardown resource on create and update.
pub const CLEANER_PHYSICAL_ID: &str = "DeleteAmis";

#[derive(Debug, Error)]
pub enum CleanerError {
    #[error("event has no StackName/BuilderName")]
    MissingOwner,
    #[error("listing images failed: {0}")]
    Listing(#[source] ComputeError),
    #[error("sweep did not finish within {0:?}")]
    Timeout(Duration),
    #[error("sweep left {} item(s) behind: {}", .0.len(), .0.join("; "))]
    Incomplete(Vec<String>),
    #[error("acknowledgement failed: {0}")]
    Ack(#[from] AckError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
    Scheduled,
}

fleet_core::simple_display! {
    RequestType {
        Create => "Create",
        Update => "Update",
        Delete => "Delete",
        Scheduled => "Scheduled",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OwnerProperties {
    pub stack_name: String,
    pub builder_name: String,
}

/// Cleaner invocation payload.
///
/// Lifecycle events carry the owner in `ResourceProperties` and include the
/// callback fields; scheduled events carry it at the top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CleanerEvent {
    pub request_type: RequestType,
    #[serde(default, rename = "ResponseURL", skip_serializing_if = "Option::is_none")]
    pub response_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_properties: Option<OwnerProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_template_id: Option<String>,
}

impl CleanerEvent {
    pub fn owner(&self) -> Option<OwnerTags> {
        if let Some(p) = &self.resource_properties {
            return Some(OwnerTags::new(&p.stack_name, &p.builder_name));
        }
        match (&self.stack_name, &self.builder_name) {
            (Some(stack), Some(builder)) => Some(OwnerTags::new(stack, builder)),
            _ => None,
        }
    }

    /// Whether this event performs a sweep (as opposed to only acknowledging).
    pub fn sweeps(&self) -> bool {
        matches!(self.request_type, RequestType::Delete | RequestType::Scheduled)
    }

    /// The event with its callback URL redacted, for logging.
    pub fn redacted(&self) -> Self {
        let mut event = self.clone();
        event.response_url = event.response_url.as_deref().map(redact_url);
        event
    }
}

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub listed: usize,
    pub deregistered: Vec<String>,
    pub snapshots_deleted: Vec<String>,
    /// Listed entries without an image id.
    pub skipped: usize,
    /// One line per item that could not be removed.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CleanerOutcome {
    Acknowledged,
    Swept(SweepReport),
}

pub struct AmiCleaner<C: ComputeAdapter, A: AckSink> {
    compute: C,
    ack: A,
    timeout: Duration,
}

impl<C: ComputeAdapter, A: AckSink> AmiCleaner<C, A> {
    pub fn new(compute: C, ack: A) -> Self {
        Self { compute, ack, timeout: CLEANER_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delete every image tagged with `owner`, then its snapshots.
    ///
    /// An image is deregistered before any of its snapshots are touched; if
    /// deregistration fails its snapshots are left alone. Items that fail
    /// are recorded and the sweep moves on. Only a failed listing aborts.
    pub async fn sweep(&self, owner: &OwnerTags) -> Result<SweepReport, CleanerError> {
        let images = self.compute.describe_images(owner).await.map_err(CleanerError::Listing)?;
        let mut report = SweepReport { listed: images.len(), ..Default::default() };
        tracing::info!(stack = %owner.stack, builder = %owner.builder, count = images.len(), "found images");

        for image in &images {
            let Some(image_id) = image.image_id.as_deref() else {
                tracing::warn!(name = ?image.name, "listed image has no id, skipping");
                report.skipped += 1;
                continue;
            };
            // Ownership is re-checked per item; the listing filter is not trusted alone.
            if !image.is_owned_by(owner) {
                tracing::warn!(image_id, "listed image is not owned by this builder, skipping");
                report.skipped += 1;
                continue;
            }

            match self.compute.deregister_image(image_id).await {
                Ok(()) => {
                    tracing::info!(image_id, "deregistered image");
                    report.deregistered.push(image_id.to_string());
                }
                Err(e) if e.is_not_found() => {
                    tracing::info!(image_id, "image already deregistered");
                }
                Err(e) => {
                    tracing::warn!(image_id, error = %e, "deregister failed, keeping its snapshots");
                    report.errors.push(format!("{image_id}: {e}"));
                    continue;
                }
            }

            for snapshot_id in image.snapshot_ids() {
                match self.compute.delete_snapshot(snapshot_id).await {
                    Ok(()) => {
                        tracing::info!(image_id, snapshot_id, "deleted snapshot");
                        report.snapshots_deleted.push(snapshot_id.to_string());
                    }
                    Err(e) if e.is_not_found() => {
                        tracing::debug!(snapshot_id, "snapshot already gone");
                    }
                    Err(e) => {
                        tracing::warn!(image_id, snapshot_id, error = %e, "snapshot delete failed");
                        report.errors.push(format!("{snapshot_id}: {e}"));
                    }
                }
            }
        }
        Ok(report)
    }

    /// Handle one invocation, acknowledging it when it carries a callback URL.
    ///
    /// `log_stream` names this invocation's log stream; it is the physical
    /// id reported on failure so the operator can find the details.
    pub async fn handle(
        &self,
        event: &CleanerEvent,
        log_stream: &str,
    ) -> Result<CleanerOutcome, CleanerError> {
        tracing::info!(event = ?event.redacted(), "cleaner invoked");
        let result = self.dispatch(event).await;

        let Some(url) = event.response_url.as_deref() else {
            return result;
        };
        let response = match &result {
            Ok(_) => self.response(event, AckStatus::Success, "OK".to_string(), physical_id(event)),
            Err(e) => {
                tracing::error!(error = %e, "cleaner failed");
                self.response(event, AckStatus::Failed, e.to_string(), log_stream.to_string())
            }
        };
        if let Err(e) = self.ack.respond(url, &response).await {
            tracing::error!(url = %redact_url(url), error = %e, "acknowledgement not delivered");
            return match result {
                Ok(_) => Err(CleanerError::Ack(e)),
                Err(original) => Err(original),
            };
        }
        tracing::info!(status = %response.status, physical_id = %response.physical_resource_id, "acknowledged");
        result
    }

    async fn dispatch(&self, event: &CleanerEvent) -> Result<CleanerOutcome, CleanerError> {
        if !event.sweeps() {
            return Ok(CleanerOutcome::Acknowledged);
        }
        let owner = event.owner().ok_or(CleanerError::MissingOwner)?;
        let report = tokio::time::timeout(self.timeout, self.sweep(&owner))
            .await
            .map_err(|_| CleanerError::Timeout(self.timeout))??;
        // Teardown must not report success while artifacts are left behind.
        if event.request_type == RequestType::Delete && !report.errors.is_empty() {
            return Err(CleanerError::Incomplete(report.errors));
        }
        Ok(CleanerOutcome::Swept(report))
    }

    fn response(
        &self,
        event: &CleanerEvent,
        status: AckStatus,
        reason: String,
        physical_resource_id: String,
    ) -> AckResponse {
        AckResponse {
            status,
            reason,
            physical_resource_id,
            stack_id: event.stack_id.clone().unwrap_or_default(),
            request_id: event.request_id.clone().unwrap_or_default(),
            logical_resource_id: event.logical_resource_id.clone().unwrap_or_default(),
            no_echo: false,
            data: serde_json::Map::new(),
        }
    }
}

fn physical_id(event: &CleanerEvent) -> String {
    match event.request_type {
        RequestType::Delete => event
            .physical_resource_id
            .clone()
            .unwrap_or_else(|| CLEANER_PHYSICAL_ID.to_string()),
        _ => CLEANER_PHYSICAL_ID.to_string(),
    }
}

#[cfg(test)]
#[path = "cleaner_tests.rs"]
mod tests;
