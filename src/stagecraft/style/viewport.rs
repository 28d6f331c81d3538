// SPDX-License-Identifier: MIT

//! Per-viewport override cascade
//!
//! A node stores one declaration per viewport. The base declaration always
//! applies; an override viewport contributes only when its cascade mode is
//! `independent` and it is not the base viewport itself.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the base viewport unless a project configures another
pub const BASE_VIEWPORT: &str = "base";

/// A flat style key -> value map
pub type Declaration = Map<String, Value>;

/// How a viewport relates to the base declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CascadeMode {
    /// Shares the base declaration; its own overrides are ignored
    #[default]
    Unified,
    /// Base declaration shallow-merged with the viewport's overrides
    Independent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default)]
    pub mode: CascadeMode,
}

/// The viewports a project designs for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewports {
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(default)]
    pub entries: Vec<Viewport>,
}

fn default_base() -> String {
    BASE_VIEWPORT.to_string()
}

impl Default for Viewports {
    fn default() -> Self {
        Self {
            base: default_base(),
            entries: Vec::new(),
        }
    }
}

impl Viewports {
    /// Cascade mode of `name`; unknown viewports are unified
    pub fn mode(&self, name: &str) -> CascadeMode {
        self.entries
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.mode)
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        name == self.base || self.entries.iter().any(|v| v.name == name)
    }

    /// Whether `active` contributes its own overrides on top of the base
    pub fn overrides_apply(&self, active: &str) -> bool {
        active != self.base && self.mode(active) == CascadeMode::Independent
    }
}

/// Read a declaration, treating anything but a JSON object as empty
pub fn as_declaration(value: Option<&Value>) -> Declaration {
    match value {
        Some(Value::Object(map)) => map.clone(),
        _ => Declaration::new(),
    }
}

/// Shallow merge: overlay keys replace, other keys pass through
pub fn merge_into(target: &mut Declaration, overlay: &Declaration) {
    for (key, value) in overlay {
        target.insert(key.clone(), value.clone());
    }
}

/// Effective declaration of a per-viewport style map at `active`
pub fn effective_declaration(
    styles: &Map<String, Value>,
    viewports: &Viewports,
    active: &str,
) -> Declaration {
    let mut effective = as_declaration(styles.get(&viewports.base));
    if viewports.overrides_apply(active) {
        merge_into(&mut effective, &as_declaration(styles.get(active)));
    }
    effective
}
