// SPDX-License-Identifier: MIT

//! Foundation types shared by the engine: errors, settings and the
//! side-effect seam.

pub mod config;
pub mod effects;
pub mod error;
