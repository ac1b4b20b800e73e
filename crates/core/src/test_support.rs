// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures shared by this crate's tests and, through the `test-support`
//! feature, by the adapter and engine crates.

use crate::image::{BlockDeviceMapping, ImageArtifact, OwnerTags};

/// An artifact owned by `owner` with one block device per snapshot id.
pub fn owned_artifact(image_id: &str, owner: &OwnerTags, snapshots: &[&str]) -> ImageArtifact {
    ImageArtifact {
        image_id: Some(image_id.to_string()),
        name: Some(format!("{}-image", owner.builder)),
        tags: owner.artifact_tags(&owner.builder),
        block_devices: snapshots
            .iter()
            .enumerate()
            .map(|(i, s)| BlockDeviceMapping {
                device_name: format!("/dev/sd{}", (b'a' + i as u8) as char),
                snapshot_id: Some(s.to_string()),
            })
            .collect(),
        root_device_name: Some("/dev/sda".to_string()),
    }
}

pub mod strategies {
    use crate::request::Placement;
    use proptest::prelude::*;

    pub fn arb_placement() -> impl Strategy<Value = Placement> {
        "subnet-[0-9a-f]{8}".prop_map(Placement::new)
    }

    pub fn arb_chain(max: usize) -> impl Strategy<Value = Vec<Placement>> {
        proptest::collection::vec(arb_placement(), 1..=max)
    }
}
