// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job provisioning requests and network placements.

use crate::id::TaskToken;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A subnet an instance may be launched into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placement {
    pub subnet_id: String,
}

impl Placement {
    pub fn new(subnet_id: impl Into<String>) -> Self {
        Self { subnet_id: subnet_id.into() }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subnet_id)
    }
}

/// Everything needed to bring up one runner for one job.
///
/// Lives only as long as the job. The token is the correlation key for
/// heartbeat and completion signals and is never shared across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerProvisioningRequest {
    pub token: TaskToken,
    pub runner_name: String,
    pub registration_domain: String,
    pub owner: String,
    pub repo: String,
    pub registration_token: String,
    pub registration_url: String,
    pub labels: Vec<String>,
    pub log_destination: String,
}

impl RunnerProvisioningRequest {
    /// Labels as the runner agent expects them: comma separated.
    pub fn label_list(&self) -> String {
        self.labels.join(",")
    }
}

crate::builder! {
    pub struct RunnerProvisioningRequestBuilder => RunnerProvisioningRequest {
        into {
            token: TaskToken = TaskToken::from_string("tkn-test"),
            runner_name: String = "runner-1",
            registration_domain: String = "github.com",
            owner: String = "acme",
            repo: String = "widgets",
            registration_token: String = "reg-secret",
            registration_url: String = "https://github.com/acme/widgets",
            log_destination: String = "/runners/logs",
        }
        set {
            labels: Vec<String> = vec!["windows-fast".to_string()],
        }
    }
}
