// SPDX-License-Identifier: MIT

//! Commands: the only way a snapshot changes
//!
//! `Command::apply` is pure. It reads the current snapshot and returns the
//! next one, or an error that leaves the store untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::snapshot::Snapshot;
use crate::kit::error::StoreError;
use crate::stagecraft::style::{as_declaration, Declaration};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Command {
    /// Write `value` at a dotted path under `data`
    SetData { path: String, value: Value },
    /// Shallow-merge `patch` into a node's props
    SetProps {
        node_id: String,
        patch: Map<String, Value>,
    },
    Navigate { page_id: String },
    OpenFragment { fragment_id: String },
    /// Close one fragment, or the most recently opened one
    CloseFragment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fragment_id: Option<String>,
    },
    SetViewport { name: String },
    /// Patch a node's per-viewport declaration; `null` values remove keys
    SetNodeStyle {
        node_id: String,
        viewport: String,
        patch: Declaration,
    },
    /// Upsert the sheet rule for `(node_id, viewport)`
    UpsertStyleRule {
        node_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        viewport: Option<String>,
        patch: Declaration,
    },
}

impl Command {
    pub fn apply(&self, current: &Snapshot) -> Result<Snapshot, StoreError> {
        let mut next = current.clone();
        match self {
            Command::SetData { path, value } => {
                set_path(&mut next.data, path, value.clone())?;
            }
            Command::SetProps { node_id, patch } => {
                let node = next
                    .project
                    .nodes
                    .get_mut(node_id)
                    .ok_or_else(|| StoreError::NodeNotFound(node_id.clone()))?;
                for (key, value) in patch {
                    node.props.insert(key.clone(), value.clone());
                }
            }
            Command::Navigate { page_id } => {
                if next.project.page(page_id).is_none() {
                    return Err(StoreError::PageNotFound(page_id.clone()));
                }
                next.ui.active_page = Some(page_id.clone());
            }
            Command::OpenFragment { fragment_id } => {
                if next.project.fragment(fragment_id).is_none() {
                    return Err(StoreError::FragmentNotFound(fragment_id.clone()));
                }
                next.ui.open_fragments.retain(|f| f != fragment_id);
                next.ui.open_fragments.push(fragment_id.clone());
            }
            Command::CloseFragment { fragment_id } => match fragment_id {
                Some(id) => next.ui.open_fragments.retain(|f| f != id),
                None => {
                    next.ui.open_fragments.pop();
                }
            },
            Command::SetViewport { name } => {
                if !next.project.viewports.contains(name) {
                    return Err(StoreError::UnknownViewport(name.clone()));
                }
                next.ui.viewport = name.clone();
            }
            Command::SetNodeStyle {
                node_id,
                viewport,
                patch,
            } => {
                if !next.project.viewports.contains(viewport) {
                    return Err(StoreError::UnknownViewport(viewport.clone()));
                }
                let node = next
                    .project
                    .nodes
                    .get_mut(node_id)
                    .ok_or_else(|| StoreError::NodeNotFound(node_id.clone()))?;
                let mut declaration = as_declaration(node.styles.get(viewport));
                for (key, value) in patch {
                    if value.is_null() {
                        declaration.remove(key);
                    } else {
                        declaration.insert(key.clone(), value.clone());
                    }
                }
                node.styles
                    .insert(viewport.clone(), Value::Object(declaration));
            }
            Command::UpsertStyleRule {
                node_id,
                viewport,
                patch,
            } => {
                if next.project.node(node_id).is_none() {
                    return Err(StoreError::NodeNotFound(node_id.clone()));
                }
                next.project
                    .style_sheet
                    .upsert(node_id, viewport.as_deref(), patch);
            }
        }
        Ok(next)
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Command::SetData { .. } => "setData",
            Command::SetProps { .. } => "setProps",
            Command::Navigate { .. } => "navigate",
            Command::OpenFragment { .. } => "openFragment",
            Command::CloseFragment { .. } => "closeFragment",
            Command::SetViewport { .. } => "setViewport",
            Command::SetNodeStyle { .. } => "setNodeStyle",
            Command::UpsertStyleRule { .. } => "upsertStyleRule",
        }
    }
}

/// Write `value` at dotted `path`, creating objects along the way and
/// replacing non-object intermediates
pub fn set_path(root: &mut Value, path: &str, value: Value) -> Result<(), StoreError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;

    let mut current = root;
    for segment in parents {
        current = object_mut(current, path)?
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    object_mut(current, path)?.insert(last.to_string(), value);
    Ok(())
}

fn object_mut<'v>(value: &'v mut Value, path: &str) -> Result<&'v mut Map<String, Value>, StoreError> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    value
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidPath(path.to_string()))
}
