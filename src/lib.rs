// SPDX-License-Identifier: Apache-2.0

//! Cut enumeration and K-LUT superchoicing over AND/LUT networks.

pub mod cut;
pub mod error;
pub mod network;
pub mod superchoice;
pub mod test_utils;
pub mod truth_table;
