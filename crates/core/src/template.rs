// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch templates.
//!
//! A template is bound to exactly one image. Activating a new image produces
//! a new template with a new identity; an existing template is never edited,
//! so a launch that already read it keeps a consistent view.

use crate::request::Placement;
use crate::shape::InstanceType;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identity of one immutable launch template.
    pub struct LaunchTemplateId("lt-");
}

/// Root volume override applied at launch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOverride {
    pub device_name: String,
    pub volume_gib: u32,
    pub delete_on_termination: bool,
}

/// Spot and on-demand are mutually exclusive per provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "market", rename_all = "snake_case")]
pub enum MarketOptions {
    #[default]
    OnDemand,
    Spot {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_price: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchTemplate {
    pub id: LaunchTemplateId,
    pub image_id: String,
    pub instance_type: InstanceType,
    pub placements: Vec<Placement>,
    pub security_groups: Vec<String>,
}

impl LaunchTemplate {
    pub fn bind(
        image_id: impl Into<String>,
        instance_type: InstanceType,
        placements: Vec<Placement>,
        security_groups: Vec<String>,
    ) -> Self {
        Self {
            id: LaunchTemplateId::new(),
            image_id: image_id.into(),
            instance_type,
            placements,
            security_groups,
        }
    }

    /// A replacement template for a newly activated image.
    ///
    /// Shape, network and security groups carry over; identity does not.
    pub fn rebind(&self, image_id: impl Into<String>) -> Self {
        Self::bind(
            image_id,
            self.instance_type.clone(),
            self.placements.clone(),
            self.security_groups.clone(),
        )
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
