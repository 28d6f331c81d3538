// SPDX-License-Identifier: MIT

//! The values a when-expression may dereference

use serde::Serialize;
use serde_json::{Map, Value};

use super::ast::Root;

/// `{data, node, project}` as JSON values. Absent node/project are `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingScope {
    pub data: Value,
    pub node: Value,
    pub project: Value,
}

impl Default for BindingScope {
    fn default() -> Self {
        Self {
            data: Value::Object(Map::new()),
            node: Value::Null,
            project: Value::Null,
        }
    }
}

impl BindingScope {
    /// Build a scope from typed node/project values. A value that fails to
    /// serialize is bound as `null`.
    pub fn new<N, P>(data: Value, node: Option<&N>, project: Option<&P>) -> Self
    where
        N: Serialize,
        P: Serialize,
    {
        Self {
            data,
            node: to_scope_value(node),
            project: to_scope_value(project),
        }
    }

    /// Scope with runtime data only
    pub fn with_data(data: Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Build a scope from a JSON object of the form
    /// `{"data": .., "node": .., "project": ..}`; missing keys default.
    pub fn from_json(value: &Value) -> Self {
        let defaults = Self::default();
        Self {
            data: value.get("data").cloned().unwrap_or(defaults.data),
            node: value.get("node").cloned().unwrap_or(defaults.node),
            project: value.get("project").cloned().unwrap_or(defaults.project),
        }
    }

    /// Walk `root.segments...`, returning `None` (undefined) as soon as a
    /// segment is missing or the current value is not an object.
    pub fn lookup(&self, root: &Root, segments: &[String]) -> Option<&Value> {
        let mut current = match root {
            Root::Data => &self.data,
            Root::Node => &self.node,
            Root::Project => &self.project,
            Root::Unknown(_) => return None,
        };
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

fn to_scope_value<T: Serialize>(value: Option<&T>) -> Value {
    value
        .and_then(|v| serde_json::to_value(v).ok())
        .unwrap_or(Value::Null)
}
