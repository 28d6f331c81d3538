// SPDX-License-Identifier: MIT

//! Policy registry
//!
//! Declarative allow/deny/visibility data at four layers (global, tag,
//! component, template). The data here has no behaviour beyond lookups;
//! the capability resolver combines the layers.

mod builtin;
mod loader;
mod types;
mod validate;

pub use builtin::builtin;
pub use loader::PolicyLoader;
pub use types::{
    ComponentCapabilities, ComponentPolicy, GlobalStylePolicy, InspectorFilter, Narrowing,
    OverlayEntry, PolicyRegistry, PropSchema, StyleKeyMeta, StyleLists, StyleValueType,
    TagPolicy, TemplateDefinition,
};
