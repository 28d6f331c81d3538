// SPDX-License-Identifier: MIT

//! Policy cascade and when-expression engine for a visual page builder

pub mod capability;
pub mod condition;
pub mod expr;
pub mod flow;
pub mod model;
pub mod policy;
pub mod server;
pub mod store;
pub mod style;
