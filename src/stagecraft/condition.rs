// SPDX-License-Identifier: MIT

//! Condition-gated property visibility
//!
//! A property is shown only if every gate passes, checked in order:
//! the node's own visibility expression, the schema's `when` equality map,
//! then the schema's `whenExpr`. A missing gate passes.

use serde_json::Value;

use super::expr::{self, strict_equals, BindingScope};
use super::model::{Node, Project};
use super::policy::{PolicyRegistry, PropSchema};

/// Scope for expressions evaluated against `node`
pub fn node_scope(data: Value, node: &Node, project: Option<&Project>) -> BindingScope {
    BindingScope::new(data, Some(node), project)
}

/// Evaluate an optional gate. `None` passes.
pub fn when_passes(expr: Option<&str>, scope: &BindingScope) -> bool {
    expr.map_or(true, |text| expr::evaluate(text, scope))
}

pub fn is_property_visible(schema: &PropSchema, node: &Node, scope: &BindingScope) -> bool {
    if !when_passes(
        node.prop_visibility.get(&schema.key).map(String::as_str),
        scope,
    ) {
        log::debug!("Prop '{}' hidden by node '{}' override", schema.key, node.id);
        return false;
    }

    if let Some(when) = &schema.when {
        let matches = when
            .iter()
            .all(|(key, expected)| strict_equals(node.props.get(key), Some(expected)));
        if !matches {
            return false;
        }
    }

    when_passes(schema.when_expr.as_deref(), scope)
}

/// Property schemas of the node's component that pass every gate, in
/// declaration order. Unknown components have none.
pub fn visible_props<'r>(
    registry: &'r PolicyRegistry,
    node: &Node,
    scope: &BindingScope,
) -> Vec<&'r PropSchema> {
    registry
        .capabilities(&node.component)
        .map(|caps| {
            caps.props
                .iter()
                .filter(|schema| is_property_visible(schema, node, scope))
                .collect()
        })
        .unwrap_or_default()
}
