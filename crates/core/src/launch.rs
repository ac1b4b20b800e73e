// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch state machine for one provisioning request.
//!
//! States are `Pending → AttemptPlacement(i) → AwaitCompletion(i) →
//! Succeeded(i) | Failed`. Every edge lives in [`transition`]; the machine
//! only stores the current state and an attempt log. It performs no I/O: the
//! caller feeds it inputs and carries out the [`LaunchEffect`]s it returns.
//!
//! Placements are tried strictly in order. A retryable launch error moves to
//! the next placement, any other launch error ends the request, and once an
//! instance is running the request ends on its own success or failure signal
//! or when the heartbeat window lapses.

use crate::request::Placement;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "placement", rename_all = "snake_case")]
pub enum LaunchState {
    Pending,
    AttemptPlacement(usize),
    AwaitCompletion(usize),
    Succeeded(usize),
    Failed,
}

impl LaunchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LaunchState::Succeeded(_) | LaunchState::Failed)
    }
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchState::Pending => f.write_str("pending"),
            LaunchState::AttemptPlacement(i) => write!(f, "attempt_placement({i})"),
            LaunchState::AwaitCompletion(i) => write!(f, "await_completion({i})"),
            LaunchState::Succeeded(i) => write!(f, "succeeded({i})"),
            LaunchState::Failed => f.write_str("failed"),
        }
    }
}

/// Something that happened to the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchInput {
    Start,
    Launched { instance_id: String },
    LaunchRejected { error: String, retryable: bool },
    Heartbeat,
    JobSucceeded { output: String },
    JobFailed { reason: Option<String> },
    HeartbeatTimeout,
}

impl fmt::Display for LaunchInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LaunchInput::Start => "start",
            LaunchInput::Launched { .. } => "launched",
            LaunchInput::LaunchRejected { .. } => "launch_rejected",
            LaunchInput::Heartbeat => "heartbeat",
            LaunchInput::JobSucceeded { .. } => "job_succeeded",
            LaunchInput::JobFailed { .. } => "job_failed",
            LaunchInput::HeartbeatTimeout => "heartbeat_timeout",
        })
    }
}

/// Work the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEffect {
    /// Issue one launch call into placement `index`.
    RunInstance { index: usize },
    /// (Re)start the heartbeat window.
    ArmHeartbeat,
    /// Stop waiting; the request is finished.
    Finish,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("request already finished in state {0}")]
    Terminal(LaunchState),
    #[error("input {input} is not valid in state {state}")]
    Invalid { state: LaunchState, input: String },
    #[error("no placements configured")]
    NoPlacements,
}

/// Result of a single launch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub placement: Placement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The instance ran the job and reported failure.
    JobFailed { reason: Option<String> },
    /// No heartbeat or completion within the window.
    HeartbeatTimeout,
    /// A launch error outside the retryable set.
    NonRetryable { placement: Placement, error: String },
    /// Every placement failed with a retryable error.
    Exhausted,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::JobFailed { reason: Some(r) } => write!(f, "job failed: {r}"),
            FailureReason::JobFailed { reason: None } => f.write_str("job failed"),
            FailureReason::HeartbeatTimeout => f.write_str("heartbeat timeout"),
            FailureReason::NonRetryable { placement, error } => {
                write!(f, "non-retryable launch error in {placement}: {error}")
            }
            FailureReason::Exhausted => f.write_str("all placements exhausted"),
        }
    }
}

/// Final outcome reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LaunchOutcome {
    Succeeded {
        placement: Placement,
        instance_id: String,
        output: String,
        attempts: Vec<AttemptRecord>,
    },
    Failed {
        reason: FailureReason,
        attempts: Vec<AttemptRecord>,
    },
}

impl LaunchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LaunchOutcome::Succeeded { .. })
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            LaunchOutcome::Succeeded { attempts, .. } | LaunchOutcome::Failed { attempts, .. } => {
                attempts
            }
        }
    }

    /// One line per failed attempt, e.g. `subnet-1: InsufficientInstanceCapacity`.
    pub fn failure_summary(&self) -> String {
        let mut lines = Vec::new();
        if let LaunchOutcome::Failed { reason, .. } = self {
            lines.push(reason.to_string());
        }
        for a in self.attempts() {
            if let Some(err) = &a.error {
                lines.push(format!("{}: {}", a.placement, err));
            }
        }
        lines.join("\n")
    }
}

/// Pure transition table.
///
/// `placements` is the length of the attempt chain.
pub fn transition(
    state: LaunchState,
    input: &LaunchInput,
    placements: usize,
) -> Result<(LaunchState, Vec<LaunchEffect>), TransitionError> {
    use LaunchEffect::*;
    use LaunchInput as I;
    use LaunchState as S;

    if state.is_terminal() {
        return Err(TransitionError::Terminal(state));
    }
    if placements == 0 {
        return Err(TransitionError::NoPlacements);
    }

    let next = match (state, input) {
        (S::Pending, I::Start) => (S::AttemptPlacement(0), vec![RunInstance { index: 0 }]),

        (S::AttemptPlacement(i), I::Launched { .. }) => (S::AwaitCompletion(i), vec![ArmHeartbeat]),
        (S::AttemptPlacement(i), I::LaunchRejected { retryable: true, .. })
            if i + 1 < placements =>
        {
            (S::AttemptPlacement(i + 1), vec![RunInstance { index: i + 1 }])
        }
        (S::AttemptPlacement(_), I::LaunchRejected { .. }) => (S::Failed, vec![Finish]),

        (S::AwaitCompletion(i), I::Heartbeat) => (S::AwaitCompletion(i), vec![ArmHeartbeat]),
        (S::AwaitCompletion(i), I::JobSucceeded { .. }) => (S::Succeeded(i), vec![Finish]),
        (S::AwaitCompletion(_), I::JobFailed { .. } | I::HeartbeatTimeout) => {
            (S::Failed, vec![Finish])
        }

        (state, input) => {
            return Err(TransitionError::Invalid { state, input: input.to_string() });
        }
    };
    Ok(next)
}

/// Drives [`transition`] and keeps the attempt log for one request.
#[derive(Debug, Clone)]
pub struct LaunchMachine {
    placements: Vec<Placement>,
    state: LaunchState,
    attempts: Vec<AttemptRecord>,
    failure: Option<FailureReason>,
    output: Option<String>,
}

impl LaunchMachine {
    pub fn new(placements: Vec<Placement>) -> Result<Self, TransitionError> {
        if placements.is_empty() {
            return Err(TransitionError::NoPlacements);
        }
        Ok(Self {
            placements,
            state: LaunchState::Pending,
            attempts: Vec::new(),
            failure: None,
            output: None,
        })
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    pub fn placement(&self, index: usize) -> Option<&Placement> {
        self.placements.get(index)
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    /// Apply an input, returning the effects to carry out.
    pub fn step(&mut self, input: LaunchInput) -> Result<Vec<LaunchEffect>, TransitionError> {
        let (next, effects) = transition(self.state, &input, self.placements.len())?;
        self.record(&input);
        self.state = next;
        Ok(effects)
    }

    fn record(&mut self, input: &LaunchInput) {
        let current = match self.state {
            LaunchState::AttemptPlacement(i) | LaunchState::AwaitCompletion(i) => i,
            _ => return,
        };
        let placement = self.placements[current].clone();
        match input {
            LaunchInput::Launched { instance_id } => self.attempts.push(AttemptRecord {
                placement,
                instance_id: Some(instance_id.clone()),
                error: None,
            }),
            LaunchInput::LaunchRejected { error, retryable } => {
                self.attempts.push(AttemptRecord {
                    placement: placement.clone(),
                    instance_id: None,
                    error: Some(error.clone()),
                });
                if !retryable {
                    self.failure =
                        Some(FailureReason::NonRetryable { placement, error: error.clone() });
                } else if current + 1 == self.placements.len() {
                    self.failure = Some(FailureReason::Exhausted);
                }
            }
            LaunchInput::JobSucceeded { output } => self.output = Some(output.clone()),
            LaunchInput::JobFailed { reason } => {
                self.failure = Some(FailureReason::JobFailed { reason: reason.clone() })
            }
            LaunchInput::HeartbeatTimeout => self.failure = Some(FailureReason::HeartbeatTimeout),
            LaunchInput::Start | LaunchInput::Heartbeat => {}
        }
    }

    /// The outcome, once the machine has reached a terminal state.
    pub fn outcome(&self) -> Option<LaunchOutcome> {
        match self.state {
            LaunchState::Succeeded(i) => {
                let instance_id = self
                    .attempts
                    .iter()
                    .rev()
                    .find_map(|a| a.instance_id.clone())
                    .unwrap_or_default();
                Some(LaunchOutcome::Succeeded {
                    placement: self.placements[i].clone(),
                    instance_id,
                    output: self.output.clone().unwrap_or_default(),
                    attempts: self.attempts.clone(),
                })
            }
            LaunchState::Failed => Some(LaunchOutcome::Failed {
                reason: self.failure.clone().unwrap_or(FailureReason::Exhausted),
                attempts: self.attempts.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
