// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Image recipes: what base image and customization steps make an image.
//!
//! A recipe is never edited in place. Its name embeds a digest of its content,
//! so changing any component or the base image yields a different recipe and
//! therefore a fresh build rather than a mutation of the old one.

use crate::shape::{Architecture, Os};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One ordered customization step applied on top of the base image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub platform: Os,
    /// Commands run in order by the build instance.
    #[serde(default)]
    pub commands: Vec<String>,
}

impl Component {
    pub fn new(name: impl Into<String>, platform: Os, commands: Vec<String>) -> Self {
        Self { name: name.into(), platform, commands }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecipe {
    /// Stable prefix, usually the owning builder's unique name.
    pub name_prefix: String,
    pub base_image: String,
    pub architecture: Architecture,
    pub platform: Os,
    pub components: Vec<Component>,
}

impl ImageRecipe {
    /// Content digest over everything except the name prefix.
    pub fn content_hash(&self) -> String {
        let canonical = serde_json::json!({
            "base_image": self.base_image,
            "architecture": self.architecture,
            "platform": self.platform,
            "components": self.components,
        })
        .to_string();
        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }

    /// Recipe identity: `<prefix>-<first 12 hex chars of the content hash>`.
    pub fn name(&self) -> String {
        let hash = self.content_hash();
        format!("{}-{}", self.name_prefix, crate::id::short(&hash, 12))
    }

    /// Components that target a different platform than the recipe.
    pub fn foreign_components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(move |c| c.platform != self.platform)
    }
}

#[cfg(test)]
#[path = "recipe_tests.rs"]
mod tests;
