// SPDX-License-Identifier: MIT

//! Point-in-time view of the project, UI and runtime data

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::stagecraft::expr::BindingScope;
use crate::stagecraft::model::{Node, Project};
use crate::stagecraft::style::BASE_VIEWPORT;

/// Editor/runtime UI state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_page: Option<String>,
    /// Open fragments, most recently opened last
    #[serde(default)]
    pub open_fragments: Vec<String>,
    #[serde(default = "default_viewport")]
    pub viewport: String,
}

fn default_viewport() -> String {
    BASE_VIEWPORT.to_string()
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_page: None,
            open_fragments: Vec::new(),
            viewport: default_viewport(),
        }
    }
}

/// Immutable state value. Commands produce a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub project: Project,
    #[serde(default)]
    pub ui: UiState,
    #[serde(default = "empty_object")]
    pub data: Value,
    #[serde(default)]
    pub revision: u64,
    #[serde(default = "Utc::now")]
    pub committed_at: DateTime<Utc>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Project::default())
    }
}

impl Snapshot {
    /// Revision 0 of `project`, opened on its first page
    pub fn new(project: Project) -> Self {
        let ui = UiState {
            active_page: project.pages.first().map(|p| p.id.clone()),
            viewport: project.viewports.base.clone(),
            ..UiState::default()
        };
        Self {
            project,
            ui,
            data: empty_object(),
            revision: 0,
            committed_at: Utc::now(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.project.node(id)
    }

    /// Expression scope for `node` (or no node) against this snapshot
    pub fn scope_for(&self, node: Option<&Node>) -> BindingScope {
        BindingScope::new(self.data.clone(), node, Some(&self.project))
    }
}

/// Read side of the store: the `getState()` the resolvers and dispatcher
/// consume
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn snapshot(&self) -> Arc<Snapshot>;
}

/// A fixed snapshot, for one-shot dispatches and tests
#[async_trait]
impl SnapshotProvider for Snapshot {
    async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::new(self.clone())
    }
}
