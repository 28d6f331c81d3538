// SPDX-License-Identifier: MIT

//! Snapshot + command store
//!
//! State is an immutable [`Snapshot`]. [`Command::apply`] computes the next
//! one; [`Store::commit`] swaps it in and notifies subscribers.

mod command;
mod effects;
mod snapshot;
#[allow(clippy::module_inception)]
mod store;

pub use command::{set_path, Command};
pub use effects::StoreEffects;
pub use snapshot::{Snapshot, SnapshotProvider, UiState};
pub use store::{Store, Subscriber};
