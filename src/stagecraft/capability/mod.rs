// SPDX-License-Identifier: MIT

//! Capability resolution: which style keys, controls, props, actions and
//! flows a node may edit

mod resolver;
mod styles;
mod tag;
mod visibility;

pub use resolver::{Capabilities, CapabilityReport, InspectorMode, StyleViolation};
pub use styles::{AllowedStyles, SIZE_ALIAS};
pub use tag::{resolve_tag, FALLBACK_TAG};
pub use visibility::{ControlState, GroupState, VisibilityTree, CORE_CONTROLS, CORE_GROUP};
