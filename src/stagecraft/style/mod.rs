// SPDX-License-Identifier: MIT

//! Style cascade resolution
//!
//! Two independent cascades: the per-viewport overrides stored on a node,
//! and a shareable rule sheet keyed by node, class or component.

mod sheet;
mod viewport;

pub use sheet::{RuleConditions, Selector, SheetQuery, StyleRule, StyleSheet, ANY_SCREEN};
pub use viewport::{
    as_declaration, effective_declaration, merge_into, CascadeMode, Declaration, Viewport,
    Viewports, BASE_VIEWPORT,
};
