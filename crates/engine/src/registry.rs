// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collector registry.
//!
//! One collector function per logical name is shared by every builder in a
//! deployment. Builders register schedules and teardown hooks against those
//! names; the registry is created by the top-level context and handed to
//! each builder.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const DELETE_AMI: &str = "delete-ami";
pub const REAPER: &str = "reaper";

/// Collector schedules fire once a day.
pub const DAILY: &str = "rate(1 day)";

/// A shared collector function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorFunction {
    pub name: String,
    pub description: String,
    #[serde(rename = "timeout_secs", serialize_with = "as_secs")]
    pub timeout: Duration,
    pub log_retention_days: u32,
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

/// A timer that invokes a collector with a fixed payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectorSchedule {
    pub id: String,
    /// Builder path the schedule belongs to.
    pub owner: String,
    pub collector: String,
    pub expression: String,
    pub description: String,
    pub payload: serde_json::Value,
}

/// Invokes a collector when the owning builder is torn down.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeardownHook {
    pub resource_type: String,
    pub owner: String,
    pub collector: String,
    pub properties: serde_json::Value,
}

#[derive(Default)]
struct RegistryState {
    functions: BTreeMap<String, CollectorFunction>,
    schedules: Vec<CollectorSchedule>,
    teardown: Vec<TeardownHook>,
}

#[derive(Clone, Default)]
pub struct CollectorRegistry {
    inner: Arc<Mutex<RegistryState>>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the function registered under `name`, creating it on first use.
    pub fn function(
        &self,
        name: &str,
        make: impl FnOnce() -> CollectorFunction,
    ) -> CollectorFunction {
        let mut state = self.inner.lock();
        state.functions.entry(name.to_string()).or_insert_with(make).clone()
    }

    pub fn get(&self, name: &str) -> Option<CollectorFunction> {
        self.inner.lock().functions.get(name).cloned()
    }

    /// Add a schedule. A schedule with the same id and owner is replaced.
    pub fn add_schedule(&self, schedule: CollectorSchedule) {
        let mut state = self.inner.lock();
        state.schedules.retain(|s| !(s.id == schedule.id && s.owner == schedule.owner));
        state.schedules.push(schedule);
    }

    pub fn add_teardown(&self, hook: TeardownHook) {
        let mut state = self.inner.lock();
        state.teardown.retain(|h| !(h.resource_type == hook.resource_type && h.owner == hook.owner));
        state.teardown.push(hook);
    }

    pub fn functions(&self) -> Vec<CollectorFunction> {
        self.inner.lock().functions.values().cloned().collect()
    }

    pub fn schedules(&self) -> Vec<CollectorSchedule> {
        self.inner.lock().schedules.clone()
    }

    pub fn teardown_hooks(&self) -> Vec<TeardownHook> {
        self.inner.lock().teardown.clone()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
