// SPDX-License-Identifier: Apache-2.0

//! Superchoicing for K-LUT mapping: resynthesis of cuts larger than K into
//! chains of K-input LUTs, kept as structural choices when they are faster.

pub mod bound_set;
pub mod context;
pub mod decompose;
pub mod driver;

pub use context::{DecomposeContext, Outcome, SuperChoiceOptions};
pub use decompose::{cofactor_class_count, encoding_width};
pub use driver::{SuperChoiceStats, select_cut, superchoice_lut};
