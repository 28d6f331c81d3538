// SPDX-License-Identifier: MIT

//! Project and node data model
//!
//! These are pure values. Nothing in the engine mutates them in place;
//! changes go through `store::Command::apply`, which returns a new
//! snapshot.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use super::flow::{ActionBag, FlowEdge};
use super::style::{as_declaration, effective_declaration, Declaration, StyleSheet, Viewports};

/// Property holding a per-instance tag override
pub const TAG_PROP: &str = "tag";

/// One element instance in the design tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    /// Component-type id
    pub component: String,
    #[serde(default)]
    pub props: Map<String, Value>,
    /// Viewport name -> declaration
    #[serde(default)]
    pub styles: Map<String, Value>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub locked: bool,
    /// Template this node instantiates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Property key -> visibility expression set on this instance
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prop_visibility: BTreeMap<String, String>,
    /// Event name -> action bag
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<String, ActionBag>,
}

impl Node {
    pub fn new(id: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component: component.into(),
            ..Self::default()
        }
    }

    /// Tag set on this instance, if any
    pub fn tag_override(&self) -> Option<&str> {
        self.props
            .get(TAG_PROP)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Raw declaration stored for `viewport`; empty when absent or malformed
    pub fn style_for(&self, viewport: &str) -> Declaration {
        as_declaration(self.styles.get(viewport))
    }

    /// Effective declaration at `active` under the per-viewport cascade
    pub fn effective_style(&self, viewports: &Viewports, active: &str) -> Declaration {
        effective_declaration(&self.styles, viewports, active)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

/// A reusable overlay (modal, drawer, popover)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub fragments: Vec<Fragment>,
    #[serde(default)]
    pub nodes: HashMap<String, Node>,
    #[serde(default)]
    pub flows: Vec<FlowEdge>,
    #[serde(default)]
    pub viewports: Viewports,
    #[serde(default)]
    pub style_sheet: StyleSheet,
}

impl Project {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn fragment(&self, id: &str) -> Option<&Fragment> {
        self.fragments.iter().find(|f| f.id == id)
    }

    /// Flow edges leaving `(node_id, event)`, in declaration order
    pub fn edges_from<'a>(
        &'a self,
        node_id: &'a str,
        event: &'a str,
    ) -> impl Iterator<Item = &'a FlowEdge> + 'a {
        self.flows.iter().filter(move |e| e.matches(node_id, event))
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }
}
