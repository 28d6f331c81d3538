// SPDX-License-Identifier: MIT

//! Action-step and flow-edge type definitions
//!
//! Both are stored by the host as JSON records tagged by `kind`. Kinds
//! this version does not know deserialize to `Unknown` and run as no-ops.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::kit::effects::HttpRequest;

/// One unit of side effect in an event's action list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ActionStep {
    Alert {
        message: String,
    },
    SetData {
        path: String,
        #[serde(default)]
        value: Value,
    },
    SetProps {
        node_id: String,
        #[serde(default)]
        patch: Map<String, Value>,
    },
    Http {
        #[serde(default = "default_method")]
        method: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<BTreeMap<String, String>>,
        /// Data path receiving the parsed response
        #[serde(default, skip_serializing_if = "Option::is_none")]
        save_to: Option<String>,
    },
    Emit {
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    Navigate {
        to_page_id: String,
    },
    OpenFragment {
        fragment_id: String,
    },
    CloseFragment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fragment_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

fn default_method() -> String {
    "GET".to_string()
}

impl ActionStep {
    /// The `kind` tag as stored
    pub fn kind(&self) -> &'static str {
        match self {
            ActionStep::Alert { .. } => "alert",
            ActionStep::SetData { .. } => "setData",
            ActionStep::SetProps { .. } => "setProps",
            ActionStep::Http { .. } => "http",
            ActionStep::Emit { .. } => "emit",
            ActionStep::Navigate { .. } => "navigate",
            ActionStep::OpenFragment { .. } => "openFragment",
            ActionStep::CloseFragment { .. } => "closeFragment",
            ActionStep::Unknown => "unknown",
        }
    }

    /// Build the request for an `Http` step
    pub fn http_request(&self) -> Option<HttpRequest> {
        match self {
            ActionStep::Http {
                method,
                url,
                body,
                headers,
                ..
            } => Some(HttpRequest {
                method: method.to_uppercase(),
                url: url.clone(),
                body: body.clone(),
                headers: headers.clone().unwrap_or_default(),
            }),
            _ => None,
        }
    }
}

/// The action list bound to one event on a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionBag {
    /// Gate for the whole bag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default)]
    pub steps: Vec<ActionStep>,
}

/// Where a flow edge starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSource {
    pub node_id: String,
    pub event: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCondition {
    pub expr: String,
}

/// Navigation effect of a flow edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum FlowTarget {
    Navigate {
        to_page_id: String,
    },
    OpenFragment {
        fragment_id: String,
    },
    CloseFragment {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fragment_id: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl FlowTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            FlowTarget::Navigate { .. } => "navigate",
            FlowTarget::OpenFragment { .. } => "openFragment",
            FlowTarget::CloseFragment { .. } => "closeFragment",
            FlowTarget::Unknown => "unknown",
        }
    }
}

/// `(source event) -> (navigation effect)`, optionally gated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub from: FlowSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<FlowCondition>,
    pub to: FlowTarget,
}

impl FlowEdge {
    pub fn matches(&self, node_id: &str, event: &str) -> bool {
        self.from.node_id == node_id && self.from.event == event
    }
}
