// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use fleet_core::{InstanceType, Placement};

fn image(id: &str) -> ActiveImage {
    ActiveImage {
        template: LaunchTemplate::bind(
            id,
            "m5.large".parse::<InstanceType>().unwrap(),
            vec![Placement::new("subnet-1")],
            vec!["sg-1".to_string()],
        ),
        root_device_name: None,
    }
}

#[test]
fn snapshot_survives_swap() {
    let active = ActiveTemplate::new(image("ami-old"));
    let held = active.current();

    let previous = active.swap(image("ami-new"));

    assert_eq!(held.template.image_id, "ami-old");
    assert_eq!(previous.template.id, held.template.id);
    assert_eq!(active.current().template.image_id, "ami-new");
    assert_ne!(active.current().template.id, held.template.id);
}

#[test]
fn clones_share_the_binding() {
    let active = ActiveTemplate::new(image("ami-old"));
    let other = active.clone();
    active.swap(image("ami-new"));
    assert_eq!(other.current().template.image_id, "ami-new");
}
