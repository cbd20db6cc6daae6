// SPDX-License-Identifier: Apache-2.0

//! K-feasible cut enumeration.

pub mod cut_truth;
pub mod manager;
pub mod types;

pub use manager::{CutManStats, CutManager, CutParams};
pub use types::{Cut, leaf_signature};
