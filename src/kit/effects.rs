// SPDX-License-Identifier: MIT

//! Side-effect seam between the dispatcher and the host
//!
//! The dispatcher never mutates anything itself. Every action step and
//! flow-edge target ends up as one call on a [`SideEffects`] implementation
//! injected by the host.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::error::StageError;

/// An outgoing HTTP request produced by an `Http` action step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// Observable record of an effect, streamed to hosts that want to follow
/// a dispatch as it happens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EffectEvent {
    Alert { message: String },
    Emit {
        topic: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    DataChanged { path: String },
    PropsChanged { node_id: String },
    Navigated { page_id: String },
    FragmentOpened { fragment_id: String },
    FragmentClosed { fragment_id: Option<String> },
    HttpCompleted { url: String, status: u16 },
    /// An action step or flow edge failed; the dispatch carried on
    Error { kind: String, message: String },
}

/// Effects the dispatcher may request from the host.
///
/// Implementations are expected to apply each call atomically; the
/// dispatcher awaits every call before issuing the next one.
#[async_trait]
pub trait SideEffects: Send + Sync {
    /// Show a message to the user
    async fn alert(&self, message: &str) -> Result<(), StageError>;

    /// Write `value` at a dot-separated path in the runtime data
    async fn set_data(&self, path: &str, value: Value) -> Result<(), StageError>;

    /// Shallow-merge `patch` into a node's properties
    async fn set_props(&self, node_id: &str, patch: Map<String, Value>)
        -> Result<(), StageError>;

    /// Perform a request and return its parsed body
    async fn http(&self, request: &HttpRequest) -> Result<Value, StageError>;

    /// Publish a message on a topic
    async fn emit(&self, topic: &str, payload: Option<Value>) -> Result<(), StageError>;

    /// Switch the active page
    async fn navigate(&self, page_id: &str) -> Result<(), StageError>;

    /// Open a fragment (modal, drawer, ...)
    async fn open_fragment(&self, fragment_id: &str) -> Result<(), StageError>;

    /// Close one fragment, or the topmost one when `None`
    async fn close_fragment(&self, fragment_id: Option<&str>) -> Result<(), StageError>;

    /// Told about a step or edge of `kind` that failed with `error`
    async fn failed(&self, _kind: &str, _error: &StageError) {}
}
