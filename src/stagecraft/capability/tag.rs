// SPDX-License-Identifier: MIT

//! Tag resolution for a node

use crate::stagecraft::model::Node;
use crate::stagecraft::policy::PolicyRegistry;

/// Generic container used when nothing else names a tag
pub const FALLBACK_TAG: &str = "div";

/// The node's own tag override, else its component's default tag, else
/// the generic container tag
pub fn resolve_tag(registry: &PolicyRegistry, node: &Node) -> String {
    if let Some(tag) = node.tag_override() {
        return tag.to_string();
    }
    registry
        .capabilities(&node.component)
        .and_then(|caps| caps.default_tag.clone())
        .unwrap_or_else(|| FALLBACK_TAG.to_string())
}
