// SPDX-License-Identifier: MIT

//! Allowed style-key set
//!
//! Seed with the tag's grouped keys and every allow list, subtract every
//! deny list, then let narrower layers intersect. Deny at any layer is
//! final.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::stagecraft::policy::{Narrowing, PolicyRegistry};

/// Synthetic key standing for width + height in the editor
pub const SIZE_ALIAS: &str = "size";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowedStyles {
    keys: BTreeSet<String>,
}

impl AllowedStyles {
    /// Compute the set for `tag`. An unknown tag allows nothing.
    pub fn resolve(registry: &PolicyRegistry, tag: &str, narrowing: &[&Narrowing]) -> Self {
        let Some(tag_policy) = registry.tag(tag) else {
            log::debug!("No policy for tag '{}', allowing no styles", tag);
            return Self::default();
        };
        let global = &registry.styles;
        let per_tag = global.per_tag.get(tag);
        let tag_lists = tag_policy.styles.as_ref();

        let mut keys: BTreeSet<String> = tag_policy.group_keys().cloned().collect();
        keys.extend(global.allow.iter().cloned());
        if let Some(lists) = per_tag {
            keys.extend(lists.allow.iter().cloned());
        }
        if let Some(lists) = tag_lists {
            keys.extend(lists.allow.iter().cloned());
        }

        let denied: BTreeSet<&str> = global
            .deny
            .iter()
            .chain(per_tag.into_iter().flat_map(|l| l.deny.iter()))
            .chain(tag_lists.into_iter().flat_map(|l| l.deny.iter()))
            .chain(narrowing.iter().flat_map(|n| n.deny.iter()))
            .map(String::as_str)
            .collect();

        keys.retain(|k| !denied.contains(k.as_str()));
        if has_dimension(&keys) && !denied.contains(SIZE_ALIAS) {
            keys.insert(SIZE_ALIAS.to_string());
        }

        // `size` goes through the narrowing layers like any other key
        for layer in narrowing {
            keys.retain(|k| layer.permits(k));
        }
        if !has_dimension(&keys) {
            keys.remove(SIZE_ALIAS);
        }

        Self { keys }
    }

    pub fn is_allowed(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn has_dimension(keys: &BTreeSet<String>) -> bool {
    keys.contains("width") || keys.contains("height")
}
