// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::Serialize;

use crate::network::{Network, NodeKind};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SummaryStats {
    pub live_nodes: usize,
    pub and_nodes: usize,
    pub lut_nodes: usize,
    /// Largest stored level over all output drivers.
    pub deepest_output_level: u32,
    /// Maps fanout count to the number of non-terminal nodes with it.
    pub fanout_histogram: BTreeMap<u32, usize>,
}

pub fn get_summary_stats(net: &Network) -> SummaryStats {
    let mut and_nodes = 0;
    let mut lut_nodes = 0;
    let mut fanout_histogram = BTreeMap::new();
    for (_, node) in net.live_nodes() {
        match node.kind {
            NodeKind::And2 { .. } => and_nodes += 1,
            NodeKind::Lut { .. } => lut_nodes += 1,
            NodeKind::Const0 | NodeKind::Input { .. } => continue,
        }
        *fanout_histogram.entry(node.fanout_count()).or_insert(0) += 1;
    }
    let deepest_output_level = net
        .outputs()
        .iter()
        .map(|o| net.level(o.operand.node))
        .max()
        .unwrap_or(0);
    SummaryStats {
        live_nodes: net.live_node_count(),
        and_nodes,
        lut_nodes,
        deepest_output_level,
        fanout_histogram,
    }
}
