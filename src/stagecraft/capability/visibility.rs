// SPDX-License-Identifier: MIT

//! Per-control inspector visibility
//!
//! The tree is seeded with the always-on core controls and the tag's style
//! groups, every entry visible. A component overlay can then hide groups or
//! controls. Merging is an AND on `visible`, so an explicit `false` is
//! never turned back into `true`.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::stagecraft::policy::{OverlayEntry, TagPolicy};

/// Group holding the always-on core controls
pub const CORE_GROUP: &str = "layout";

/// Controls that exist for every tag
pub const CORE_CONTROLS: [&str; 3] = ["display", "size", "overflow"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupState {
    pub visible: bool,
    pub controls: BTreeMap<String, ControlState>,
}

impl Default for GroupState {
    fn default() -> Self {
        Self {
            visible: true,
            controls: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VisibilityTree {
    groups: BTreeMap<String, GroupState>,
}

impl VisibilityTree {
    /// Core controls plus every key the tag declares, all visible
    pub fn seed(tag: Option<&TagPolicy>) -> Self {
        let mut tree = Self::default();
        for control in CORE_CONTROLS {
            tree.control_mut(CORE_GROUP, control);
        }
        if let Some(tag) = tag {
            for (group, keys) in &tag.style_groups {
                tree.groups.entry(group.clone()).or_default();
                for key in keys {
                    tree.control_mut(group, key);
                }
            }
        }
        tree
    }

    fn control_mut(&mut self, group: &str, control: &str) -> &mut ControlState {
        self.groups
            .entry(group.to_string())
            .or_default()
            .controls
            .entry(control.to_string())
            .or_insert(ControlState { visible: true })
    }

    /// Merge a sparse `group.control` overlay. A bare `group` key targets
    /// the whole group; entries without `visible` only register the control.
    pub fn apply_overlay(&mut self, overlay: &BTreeMap<String, OverlayEntry>) {
        for (path, entry) in overlay {
            match path.split_once('.') {
                Some((group, control)) => {
                    let state = self.control_mut(group, control);
                    if let Some(visible) = entry.visible {
                        state.visible &= visible;
                    }
                }
                None => {
                    let state = self.groups.entry(path.clone()).or_default();
                    if let Some(visible) = entry.visible {
                        state.visible &= visible;
                    }
                }
            }
        }
    }

    /// Visible unless the group or the control is explicitly hidden
    pub fn is_visible(&self, group: &str, control: &str) -> bool {
        match self.groups.get(group) {
            None => true,
            Some(state) => {
                state.visible
                    && state
                        .controls
                        .get(control)
                        .map_or(true, |c| c.visible)
            }
        }
    }

    pub fn is_group_visible(&self, group: &str) -> bool {
        self.groups.get(group).map_or(true, |g| g.visible)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&String, &GroupState)> {
        self.groups.iter()
    }
}
