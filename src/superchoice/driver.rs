// SPDX-License-Identifier: Apache-2.0

//! Whole-network superchoice pass for K-LUT mapping.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::cut::{Cut, CutManager, CutParams};
use crate::error::ConfigError;
use crate::network::stats::get_summary_stats;
use crate::network::{Network, NodeRef};
use crate::superchoice::context::{DecomposeContext, Outcome, SuperChoiceOptions};

impl SuperChoiceOptions {
    /// Cut enumeration settings used by the pass.
    pub fn cut_params(&self) -> CutParams {
        CutParams {
            k_max: self.cut_size_max,
            keep_max: self.keep_max,
            compute_truth: false,
            filter_dominated: true,
            ..CutParams::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperChoiceStats {
    /// Roots with a cut worth decomposing.
    pub nodes_attempted: usize,
    /// Roots whose decomposition ran to completion.
    pub nodes_decomposed: usize,
    /// Roots that gained a faster choice.
    pub nodes_improved: usize,
    pub constants: usize,
    pub buffers: usize,
    pub infeasible: usize,
    pub no_improvement: usize,
    pub skipped_small: usize,
    pub skipped_volume: usize,
    /// Selected cuts that bound no member of the root's class.
    pub skipped_not_cut: usize,
    /// LUTs kept in the network, tops included.
    pub luts_created: usize,
}

impl SuperChoiceStats {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Constant { .. } => self.constants += 1,
            Outcome::Buffer { .. } => self.buffers += 1,
            Outcome::Accepted { luts, .. } => {
                self.nodes_decomposed += 1;
                self.nodes_improved += 1;
                self.luts_created += luts + 1;
            }
            Outcome::Infeasible => self.infeasible += 1,
            Outcome::NoImprovement => {
                self.nodes_decomposed += 1;
                self.no_improvement += 1;
            }
            Outcome::CutTooSmall => self.skipped_small += 1,
            Outcome::VolumeTooLarge => self.skipped_volume += 1,
            Outcome::NotACut => self.skipped_not_cut += 1,
        }
    }
}

/// Picks the cut to resynthesize among those with more than `lut_size` and at
/// most `cut_size_max` leaves: the one whose latest leaf arrives earliest,
/// then the one with more leaves, then the first in list order.
pub fn select_cut<'a>(net: &Network, cuts: &'a [Cut], options: &SuperChoiceOptions) -> Option<&'a Cut> {
    let mut best: Option<(&Cut, u32)> = None;
    for cut in cuts {
        if cut.size() <= options.lut_size || cut.size() > options.cut_size_max {
            continue;
        }
        let arrival = cut
            .leaves()
            .iter()
            .map(|leaf| net.level(*leaf))
            .max()
            .unwrap_or(0);
        let better = match best {
            None => true,
            Some((b, b_arrival)) => arrival < b_arrival || (arrival == b_arrival && cut.size() > b.size()),
        };
        if better {
            best = Some((cut, arrival));
        }
    }
    best.map(|(cut, _)| cut)
}

/// Visits every AND node of `net` in topological order and, where a cut with
/// more than `lut_size` leaves exists, tries to build a faster K-LUT
/// implementation of it. Accepted implementations are linked as choices of
/// their root, whose level is lowered to match.
pub fn superchoice_lut(net: &mut Network, options: &SuperChoiceOptions) -> Result<SuperChoiceStats, ConfigError> {
    let t0 = Instant::now();
    let mut ctx = DecomposeContext::new(*options)?;
    let mut man = CutManager::start(options.cut_params())?;
    for input in net.inputs().to_vec() {
        if net.fanout_count(input) > 0 {
            man.set_trivial_cut(input);
        }
    }
    let roots: Vec<NodeRef> = net
        .topo_order()
        .into_iter()
        .filter(|r| net.node(*r).kind.is_and())
        .collect();

    let mut stats = SuperChoiceStats::default();
    for root in roots {
        net.recompute_level(root);
        let leaves = {
            let cuts = man.cuts_for_node(net, root);
            select_cut(net, cuts, options).map(|cut| cut.leaves().to_vec())
        };
        let Some(leaves) = leaves else {
            stats.skipped_small += 1;
            continue;
        };
        stats.nodes_attempted += 1;
        let outcome = ctx.decompose_node(net, root, &leaves);
        stats.record(&outcome);
    }
    let cut_stats = man.stop();

    log::info!(
        "superchoice_lut: K={} attempted={} improved={} infeasible={} no_improvement={} luts={} cuts[{}] elapsed_ms={}",
        options.lut_size,
        stats.nodes_attempted,
        stats.nodes_improved,
        stats.infeasible,
        stats.no_improvement,
        stats.luts_created,
        cut_stats,
        t0.elapsed().as_millis()
    );
    log::debug!("superchoice_lut: {:?}", get_summary_stats(net));
    Ok(stats)
}
