// SPDX-License-Identifier: MIT

//! Action steps, flow edges and the dispatcher that runs them

mod dispatcher;
mod types;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use types::{ActionBag, ActionStep, FlowCondition, FlowEdge, FlowSource, FlowTarget};
