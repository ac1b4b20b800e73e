// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch orchestrator: drives one [`LaunchMachine`] against the compute
//! provider and the task-token registry.

use crate::active::{ActiveImage, ActiveTemplate};
use crate::boot_script::{BootScriptParams, BootScriptTemplate};
use crate::signal::{TaskSignal, TaskTokenRegistry, TaskWaiter, TokenError};
use fleet_adapters::{ComputeAdapter, ComputeError, LaunchSpec, ShutdownBehavior};
use fleet_core::{
    FailureReason, LaunchEffect, LaunchInput, LaunchMachine, LaunchOutcome, LaunchState,
    MarketOptions, Os, Placement, RunnerProvisioningRequest, StorageOverride, TaskToken,
    TransitionError,
};
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use thiserror::Error;

/// Default heartbeat window.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Upper bound on a single `run_instance` call.
pub const DEFAULT_LAUNCH_TIMEOUT: Duration = Duration::from_secs(2 * 60);

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("placement {0} is outside the attempt chain")]
    MissingPlacement(usize),
    #[error("launch stopped before finishing (state {0})")]
    Unfinished(LaunchState),
}

/// Per-provider settings applied to every launch attempt.
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub heartbeat_timeout: Duration,
    /// A launch call still pending after this counts as a launch timeout.
    pub launch_timeout: Duration,
    pub instance_profile: Option<String>,
    pub storage_gib: u32,
    pub os: Os,
    pub market: MarketOptions,
    pub tags: BTreeMap<String, String>,
}

impl LaunchSettings {
    /// Root device used when the active image did not report one.
    pub fn default_root_device(&self) -> &'static str {
        match self.os {
            Os::Windows => "/dev/sda1",
            Os::Linux => "/dev/xvda",
        }
    }

    pub fn spec_for(
        &self,
        image: &ActiveImage,
        placement: &Placement,
        user_data: &str,
        client_token: String,
    ) -> LaunchSpec {
        let device_name = image
            .root_device_name
            .clone()
            .unwrap_or_else(|| self.default_root_device().to_string());
        LaunchSpec {
            launch_template_id: image.template.id.clone(),
            placement: placement.clone(),
            user_data: user_data.to_string(),
            client_token,
            instance_profile: self.instance_profile.clone(),
            shutdown_behavior: ShutdownBehavior::Terminate,
            require_imds_tokens: true,
            root_volume: Some(StorageOverride {
                device_name,
                volume_gib: self.storage_gib,
                delete_on_termination: true,
            }),
            market: self.market.clone(),
            tags: self.tags.clone(),
        }
    }
}

#[derive(Clone)]
pub struct LaunchOrchestrator<C: ComputeAdapter> {
    compute: C,
    signals: TaskTokenRegistry,
    active: ActiveTemplate,
    script: BootScriptTemplate,
    settings: LaunchSettings,
}

impl<C: ComputeAdapter> LaunchOrchestrator<C> {
    pub fn new(
        compute: C,
        signals: TaskTokenRegistry,
        active: ActiveTemplate,
        script: BootScriptTemplate,
        settings: LaunchSettings,
    ) -> Self {
        Self { compute, signals, active, script, settings }
    }

    pub fn signals(&self) -> &TaskTokenRegistry {
        &self.signals
    }

    pub fn settings(&self) -> &LaunchSettings {
        &self.settings
    }

    /// Run one request to a terminal outcome.
    ///
    /// The active template is read once; a swap during the launch does not
    /// affect it. The request's token is claimed for the whole call.
    pub async fn launch(
        &self,
        request: &RunnerProvisioningRequest,
    ) -> Result<LaunchOutcome, OrchestratorError> {
        let image = self.active.current();
        let user_data = self.script.render(&BootScriptParams::from_request(request));
        let mut waiter = self.signals.register(&request.token)?;
        let mut machine = LaunchMachine::new(image.template.placements.clone())?;

        tracing::info!(
            request = %request.token,
            template = %image.template.id,
            image_id = %image.template.image_id,
            placements = image.template.placements.len(),
            "launch started"
        );

        let mut pending: VecDeque<LaunchEffect> = machine.step(LaunchInput::Start)?.into();
        while let Some(effect) = pending.pop_front() {
            let input = match effect {
                LaunchEffect::RunInstance { index } => {
                    self.attempt(&request.token, &image, &machine, index, &user_data).await?
                }
                LaunchEffect::ArmHeartbeat => self.await_signal(&mut waiter).await,
                LaunchEffect::Finish => break,
            };
            pending.extend(machine.step(input)?);
        }

        let outcome = machine.outcome().ok_or(OrchestratorError::Unfinished(machine.state()))?;
        log_outcome(&request.token, &outcome);
        Ok(outcome)
    }

    async fn attempt(
        &self,
        token: &TaskToken,
        image: &ActiveImage,
        machine: &LaunchMachine,
        index: usize,
        user_data: &str,
    ) -> Result<LaunchInput, OrchestratorError> {
        let placement =
            machine.placement(index).ok_or(OrchestratorError::MissingPlacement(index))?;
        // One idempotency key per attempt: a retried call for the same
        // attempt can never start a second instance.
        let spec = self.settings.spec_for(image, placement, user_data, format!("{token}-{index}"));

        let call = self.compute.run_instance(&spec);
        let result = tokio::time::timeout(self.settings.launch_timeout, call).await.unwrap_or_else(
            |_| {
                Err(ComputeError::from_code(
                    "RequestTimeout",
                    format!("launch call exceeded {}s", self.settings.launch_timeout.as_secs()),
                ))
            },
        );

        match result {
            Ok(instance_id) => {
                tracing::info!(request = %token, placement = %placement, instance = %instance_id, "instance launched");
                Ok(LaunchInput::Launched { instance_id })
            }
            Err(e) => {
                let retryable = e.is_retryable();
                tracing::warn!(
                    request = %token,
                    placement = %placement,
                    kind = %e.kind,
                    retryable,
                    error = %e,
                    "launch attempt rejected"
                );
                Ok(LaunchInput::LaunchRejected { error: e.to_string(), retryable })
            }
        }
    }

    async fn await_signal(&self, waiter: &mut TaskWaiter) -> LaunchInput {
        match tokio::time::timeout(self.settings.heartbeat_timeout, waiter.recv()).await {
            Ok(Some(TaskSignal::Heartbeat)) => {
                tracing::debug!(request = %waiter.token(), "heartbeat");
                LaunchInput::Heartbeat
            }
            Ok(Some(TaskSignal::Success { output })) => LaunchInput::JobSucceeded { output },
            Ok(Some(TaskSignal::Failure { reason })) => LaunchInput::JobFailed { reason },
            Ok(None) | Err(_) => LaunchInput::HeartbeatTimeout,
        }
    }
}

fn log_outcome(token: &TaskToken, outcome: &LaunchOutcome) {
    match outcome {
        LaunchOutcome::Succeeded { placement, instance_id, attempts, .. } => {
            tracing::info!(
                request = %token,
                placement = %placement,
                instance = %instance_id,
                attempts = attempts.len(),
                "job succeeded"
            );
        }
        LaunchOutcome::Failed { reason, .. } => match reason {
            FailureReason::JobFailed { reason } => {
                tracing::warn!(request = %token, reason = ?reason, "job reported failure");
            }
            FailureReason::HeartbeatTimeout => {
                tracing::warn!(
                    request = %token,
                    "no heartbeat within window, instance left to power itself off"
                );
            }
            FailureReason::NonRetryable { placement, error } => {
                tracing::error!(request = %token, placement = %placement, error = %error, "launch failed");
            }
            FailureReason::Exhausted => {
                let summary = outcome.failure_summary();
                tracing::error!(request = %token, attempts = %summary, "all placements exhausted");
            }
        },
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
