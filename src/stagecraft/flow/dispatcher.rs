// SPDX-License-Identifier: MIT

//! Event dispatcher
//!
//! On `(node, event)`: run the node's action bag step by step, then fire
//! the matching flow edges. A failing step is logged and skipped; it never
//! stops the steps after it or the edges.

use serde::Serialize;
use std::sync::Arc;

use super::types::{ActionBag, ActionStep, FlowTarget};
use crate::kit::effects::SideEffects;
use crate::kit::error::StageError;
use crate::stagecraft::condition::when_passes;
use crate::stagecraft::model::Node;
use crate::stagecraft::store::{Snapshot, SnapshotProvider};

/// What one dispatch did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub steps_run: usize,
    pub steps_failed: usize,
    /// The bag's `when` gate was false
    pub bag_skipped: bool,
    pub edges_fired: usize,
    pub edges_skipped: usize,
}

pub struct Dispatcher {
    state: Arc<dyn SnapshotProvider>,
    effects: Arc<dyn SideEffects>,
}

impl Dispatcher {
    pub fn new(state: Arc<dyn SnapshotProvider>, effects: Arc<dyn SideEffects>) -> Self {
        Self { state, effects }
    }

    /// Handle one event firing. Never fails; see the report for outcomes.
    pub async fn dispatch(&self, node_id: &str, event: &str) -> DispatchReport {
        let mut report = DispatchReport::default();

        let snapshot = self.state.snapshot().await;
        match snapshot.node(node_id) {
            Some(node) => {
                if let Some(bag) = node.actions.get(event) {
                    self.run_bag(&snapshot, node, bag, &mut report).await;
                }
            }
            None => log::warn!("Dispatch for unknown node '{}'", node_id),
        }

        // Edge gates see whatever the steps just wrote
        let snapshot = self.state.snapshot().await;
        self.fire_edges(&snapshot, node_id, event, &mut report).await;

        log::debug!("Dispatched {}:{} -> {:?}", node_id, event, report);
        report
    }

    async fn run_bag(
        &self,
        snapshot: &Snapshot,
        node: &Node,
        bag: &ActionBag,
        report: &mut DispatchReport,
    ) {
        let scope = snapshot.scope_for(Some(node));
        if !when_passes(bag.when.as_deref(), &scope) {
            log::info!("Skipping actions on '{}': gate is false", node.id);
            report.bag_skipped = true;
            return;
        }

        for (index, step) in bag.steps.iter().enumerate() {
            if let ActionStep::Unknown = step {
                log::debug!("Ignoring unknown step {} on '{}'", index, node.id);
                continue;
            }
            log::info!("Running step {} ({}) on '{}'", index, step.kind(), node.id);
            report.steps_run += 1;
            if let Err(e) = self.run_step(step).await {
                log::error!("Step {} ({}) failed: {}", index, step.kind(), e);
                report.steps_failed += 1;
                self.effects.failed(step.kind(), &e).await;
            }
        }
    }

    async fn run_step(&self, step: &ActionStep) -> Result<(), StageError> {
        match step {
            ActionStep::Alert { message } => self.effects.alert(message).await,
            ActionStep::SetData { path, value } => {
                self.effects.set_data(path, value.clone()).await
            }
            ActionStep::SetProps { node_id, patch } => {
                self.effects.set_props(node_id, patch.clone()).await
            }
            ActionStep::Http { save_to, .. } => {
                let request = step
                    .http_request()
                    .ok_or_else(|| StageError::effect("http", "not an http step"))?;
                let response = self.effects.http(&request).await?;
                match save_to {
                    Some(path) => self.effects.set_data(path, response).await,
                    None => Ok(()),
                }
            }
            ActionStep::Emit { topic, payload } => {
                self.effects.emit(topic, payload.clone()).await
            }
            ActionStep::Navigate { to_page_id } => self.effects.navigate(to_page_id).await,
            ActionStep::OpenFragment { fragment_id } => {
                self.effects.open_fragment(fragment_id).await
            }
            ActionStep::CloseFragment { fragment_id } => {
                self.effects.close_fragment(fragment_id.as_deref()).await
            }
            ActionStep::Unknown => Ok(()),
        }
    }

    async fn fire_edges(
        &self,
        snapshot: &Snapshot,
        node_id: &str,
        event: &str,
        report: &mut DispatchReport,
    ) {
        let scope = snapshot.scope_for(snapshot.node(node_id));
        for edge in snapshot.project.edges_from(node_id, event) {
            let label = edge.id.as_deref().unwrap_or("<unnamed>");
            let gate = edge.when.as_ref().map(|c| c.expr.as_str());
            if !when_passes(gate, &scope) {
                log::debug!("Edge {} gated off", label);
                report.edges_skipped += 1;
                continue;
            }

            let result = match &edge.to {
                FlowTarget::Navigate { to_page_id } => self.effects.navigate(to_page_id).await,
                FlowTarget::OpenFragment { fragment_id } => {
                    self.effects.open_fragment(fragment_id).await
                }
                FlowTarget::CloseFragment { fragment_id } => {
                    self.effects.close_fragment(fragment_id.as_deref()).await
                }
                FlowTarget::Unknown => {
                    log::debug!("Edge {} has an unknown target", label);
                    report.edges_skipped += 1;
                    continue;
                }
            };

            match result {
                Ok(()) => {
                    log::info!("Fired edge {} ({})", label, edge.to.kind());
                    report.edges_fired += 1;
                }
                Err(e) => {
                    log::error!("Edge {} ({}) failed: {}", label, edge.to.kind(), e);
                    self.effects.failed(edge.to.kind(), &e).await;
                }
            }
        }
    }
}
