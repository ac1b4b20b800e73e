// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The launch template currently used for new runners.
//!
//! Readers take an `Arc` snapshot and keep it for the whole launch. A new
//! image is activated by swapping in a whole new binding, so a launch that
//! started before the swap never sees a mix of old and new.

use fleet_core::LaunchTemplate;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveImage {
    pub template: LaunchTemplate,
    /// Root device of the bound image, when the provider reported one.
    pub root_device_name: Option<String>,
}

#[derive(Clone)]
pub struct ActiveTemplate {
    inner: Arc<RwLock<Arc<ActiveImage>>>,
}

impl ActiveTemplate {
    pub fn new(image: ActiveImage) -> Self {
        Self { inner: Arc::new(RwLock::new(Arc::new(image))) }
    }

    pub fn current(&self) -> Arc<ActiveImage> {
        Arc::clone(&*self.inner.read())
    }

    /// Replace the binding, returning the one it replaced.
    pub fn swap(&self, image: ActiveImage) -> Arc<ActiveImage> {
        std::mem::replace(&mut *self.inner.write(), Arc::new(image))
    }
}

#[cfg(test)]
#[path = "active_tests.rs"]
mod tests;
