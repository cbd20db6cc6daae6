// SPDX-License-Identifier: Apache-2.0

//! Cut enumeration manager.
//!
//! Holds one cut list per node, computed bottom-up by merging every pair of
//! fan-in cuts whose leaf union stays within `k_max`. Lists are ordered with
//! the trivial cut first (when present), then by ascending leaf count, and are
//! capped at `keep_max` entries by dropping the tail.

use std::time::Instant;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::cut::cut_truth::merged_truth;
use crate::cut::types::{Cut, leaves_dominate, merge_leaves};
use crate::error::ConfigError;
use crate::network::{Network, NodeKind, NodeRef, Operand};
use crate::truth_table::count_ones;

pub const MIN_CUT_SIZE: usize = 3;
pub const MAX_CUT_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutParams {
    /// Largest number of leaves in a cut.
    pub k_max: usize,
    /// Largest number of cuts kept per node.
    pub keep_max: usize,
    /// Compute a truth table for every cut.
    pub compute_truth: bool,
    /// Discard cuts whose leaves are a superset of another cut's leaves.
    pub filter_dominated: bool,
    /// Release a node's cuts once all of its fan-outs have been computed.
    pub drop_on_fly: bool,
    /// Only multi-fanout nodes get a trivial cut from `cuts_for_node`.
    pub restrict_to_dag_nodes: bool,
    /// A multi-fanout fan-in contributes only its trivial cut.
    pub only_tree_cuts: bool,
}

impl Default for CutParams {
    fn default() -> Self {
        Self {
            k_max: 5,
            keep_max: 250,
            compute_truth: false,
            filter_dominated: true,
            drop_on_fly: false,
            restrict_to_dag_nodes: false,
            only_tree_cuts: false,
        }
    }
}

impl CutParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CUT_SIZE..=MAX_CUT_SIZE).contains(&self.k_max) {
            return Err(ConfigError::CutSizeOutOfRange {
                k_max: self.k_max,
                min: MIN_CUT_SIZE,
                max: MAX_CUT_SIZE,
            });
        }
        if self.keep_max == 0 {
            return Err(ConfigError::ZeroKeepMax);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutManStats {
    /// Cuts currently held across all lists.
    pub cuts_current: usize,
    pub cuts_peak: usize,
    /// Cuts ever installed into a list.
    pub cuts_total: usize,
    /// Candidate cuts removed by dominance filtering.
    pub cuts_filtered: usize,
    /// Cuts evicted by the per-node cap.
    pub cuts_limited: usize,
    pub nodes_computed: usize,
    pub nodes_dropped: usize,
}

impl std::fmt::Display for CutManStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "nodes={} dropped={} cuts_total={} cuts_peak={} cuts_current={} filtered={} limited={}",
            self.nodes_computed,
            self.nodes_dropped,
            self.cuts_total,
            self.cuts_peak,
            self.cuts_current,
            self.cuts_filtered,
            self.cuts_limited
        )
    }
}

/// Accumulates one node's cut list with filtering, then orders and caps it.
struct CutListBuilder {
    params: CutParams,
    cuts: Vec<Cut>,
    /// Number of leading entries (the trivial cut) excluded from reordering.
    fixed: usize,
    filtered: usize,
}

impl CutListBuilder {
    fn new(params: CutParams, trivial: Option<Cut>) -> Self {
        let fixed = usize::from(trivial.is_some());
        Self {
            params,
            cuts: trivial.into_iter().collect(),
            fixed,
            filtered: 0,
        }
    }

    /// Decides whether a candidate with `leaves` may enter the list, evicting
    /// existing cuts it dominates.
    fn admit(&mut self, leaves: &[NodeRef], signature: u32) -> bool {
        if !self.params.filter_dominated {
            return !self
                .cuts
                .iter()
                .any(|e| e.signature() == signature && e.leaves() == leaves);
        }
        if self
            .cuts
            .iter()
            .any(|e| leaves_dominate(e.leaves(), e.signature(), leaves, signature))
        {
            self.filtered += 1;
            return false;
        }
        let before = self.cuts.len();
        self.cuts
            .retain(|e| !leaves_dominate(leaves, signature, e.leaves(), e.signature()));
        self.filtered += before - self.cuts.len();
        true
    }

    fn push(&mut self, cut: Cut) {
        self.cuts.push(cut);
    }

    /// Returns the ordered, capped list and the number of evicted cuts.
    fn finish(mut self) -> (Vec<Cut>, usize, usize) {
        self.cuts[self.fixed..].sort_by_key(Cut::size);
        let limited = self.cuts.len().saturating_sub(self.params.keep_max);
        self.cuts.truncate(self.params.keep_max);
        (self.cuts, self.filtered, limited)
    }
}

/// Number of cuts of `list` a fan-in may contribute.
fn usable_prefix(list: &[Cut], fanin: NodeRef, tree_only: bool) -> usize {
    if !tree_only {
        return list.len();
    }
    usize::from(list.first().is_some_and(|c| c.is_trivial_for(fanin)))
}

pub struct CutManager {
    params: CutParams,
    lists: Vec<Option<Vec<Cut>>>,
    fanout_remaining: Vec<u32>,
    stats: CutManStats,
    started: Instant,
}

impl CutManager {
    pub fn start(params: CutParams) -> Result<Self, ConfigError> {
        params.validate()?;
        log::debug!("CutManager::start: {:?}", params);
        Ok(Self {
            params,
            lists: Vec::new(),
            fanout_remaining: Vec::new(),
            stats: CutManStats::default(),
            started: Instant::now(),
        })
    }

    pub fn params(&self) -> &CutParams {
        &self.params
    }

    pub fn stats(&self) -> &CutManStats {
        &self.stats
    }

    /// Seeds the remaining-fanout counters used to release cut lists, indexed
    /// by node id.
    pub fn set_fanout_counts(&mut self, counts: &[u32]) {
        self.fanout_remaining = counts.to_vec();
    }

    /// Seeds the counters from the current fanout counts of `net`.
    pub fn set_fanout_counts_from(&mut self, net: &Network) {
        let mut counts = vec![0u32; net.node_capacity()];
        for (node_ref, node) in net.live_nodes() {
            counts[node_ref.id] = node.fanout_count();
        }
        self.fanout_remaining = counts;
    }

    pub fn cuts(&self, node: NodeRef) -> Option<&[Cut]> {
        self.lists.get(node.id).and_then(|l| l.as_deref())
    }

    pub fn has_cuts(&self, node: NodeRef) -> bool {
        self.cuts(node).is_some()
    }

    fn install(&mut self, node: NodeRef, list: Vec<Cut>) -> &[Cut] {
        if self.lists.len() <= node.id {
            self.lists.resize_with(node.id + 1, || None);
        }
        if let Some(old) = self.lists[node.id].take() {
            self.stats.cuts_current -= old.len();
        }
        self.stats.cuts_current += list.len();
        self.stats.cuts_total += list.len();
        self.stats.cuts_peak = self.stats.cuts_peak.max(self.stats.cuts_current);
        self.lists[node.id].insert(list).as_slice()
    }

    fn fanin_list(&self, node: NodeRef, fanin: NodeRef) -> &[Cut] {
        self.cuts(fanin).unwrap_or_else(|| {
            panic!(
                "compute_cuts({}): fan-in {} has no cuts; fan-ins must be computed first",
                node, fanin
            )
        })
    }

    /// Gives `node` the single-entry list holding its trivial cut, replacing
    /// any list it had.
    pub fn set_trivial_cut(&mut self, node: NodeRef) {
        let trivial = Cut::trivial(node, self.params.compute_truth);
        self.install(node, vec![trivial]);
    }

    /// Computes the cut list of `node = AND(fanin0, fanin1)` from the fan-ins'
    /// lists, which must already exist.
    ///
    /// `triv` places the trivial cut of `node` first in its list. With
    /// `only_tree_cuts`, bit 0 of `tree_code` restricts fan-in 0 to its
    /// trivial cut and bit 1 does the same for fan-in 1.
    pub fn compute_cuts(
        &mut self,
        node: NodeRef,
        fanin0: Operand,
        fanin1: Operand,
        triv: bool,
        tree_code: u8,
    ) -> &[Cut] {
        let params = self.params;
        let (list, filtered, limited) = {
            let l0 = self.fanin_list(node, fanin0.node);
            let l1 = self.fanin_list(node, fanin1.node);
            let n0 = usable_prefix(l0, fanin0.node, params.only_tree_cuts && tree_code & 1 != 0);
            let n1 = usable_prefix(l1, fanin1.node, params.only_tree_cuts && tree_code & 2 != 0);
            let mut builder =
                CutListBuilder::new(params, triv.then(|| Cut::trivial(node, params.compute_truth)));
            for c0 in &l0[..n0] {
                for c1 in &l1[..n1] {
                    let signature = c0.signature() | c1.signature();
                    if count_ones(signature) > params.k_max {
                        continue;
                    }
                    let Some(leaves) = merge_leaves(c0.leaves(), c1.leaves(), params.k_max) else {
                        continue;
                    };
                    if !builder.admit(&leaves, signature) {
                        continue;
                    }
                    let (truth, complemented) = if params.compute_truth {
                        let (t, compl) = merged_truth(c0, fanin0, c1, fanin1, &leaves);
                        (Some(t), compl)
                    } else {
                        (None, false)
                    };
                    builder.push(Cut::from_parts(leaves, signature, truth, complemented));
                }
            }
            builder.finish()
        };
        log::trace!(
            "compute_cuts({}): {} cuts, {} filtered, {} limited",
            node,
            list.len(),
            filtered,
            limited
        );
        self.stats.cuts_filtered += filtered;
        self.stats.cuts_limited += limited;
        self.stats.nodes_computed += 1;
        if params.drop_on_fly {
            self.drop_cuts(fanin0.node);
            self.drop_cuts(fanin1.node);
        }
        self.install(node, list)
    }

    /// Records that one fan-out of `node` has consumed its cuts, releasing the
    /// list once no fan-outs remain. No-op unless `drop_on_fly` is set.
    pub fn drop_cuts(&mut self, node: NodeRef) {
        if !self.params.drop_on_fly {
            return;
        }
        assert!(
            node.id < self.fanout_remaining.len(),
            "drop_cuts({}): fanout counters were not set",
            node
        );
        let remaining = &mut self.fanout_remaining[node.id];
        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            return;
        }
        if let Some(old) = self.lists.get_mut(node.id).and_then(Option::take) {
            self.stats.cuts_current -= old.len();
            self.stats.nodes_dropped += 1;
        }
    }

    /// Merges the cut lists of a choice class into the list of its head,
    /// `nodes[0]`. Trivial cuts of the alternatives are not carried over.
    pub fn union_cuts(&mut self, nodes: &[NodeRef]) -> &[Cut] {
        assert!(!nodes.is_empty(), "union_cuts: empty choice class");
        let repr = nodes[0];
        let (list, filtered, limited) = {
            let repr_list = self.fanin_list(repr, repr);
            let trivial = repr_list
                .first()
                .filter(|c| c.is_trivial_for(repr))
                .cloned();
            let mut builder = CutListBuilder::new(self.params, trivial);
            for &member in nodes {
                for cut in self.fanin_list(repr, member) {
                    if cut.is_trivial_for(member) {
                        continue;
                    }
                    if builder.admit(cut.leaves(), cut.signature()) {
                        builder.push(cut.clone());
                    }
                }
            }
            builder.finish()
        };
        self.stats.cuts_filtered += filtered;
        self.stats.cuts_limited += limited;
        self.install(repr, list)
    }

    /// Returns the cuts of `root`, computing any missing lists in its fan-in
    /// cone first. Inputs, the constant and LUT nodes act as boundaries with
    /// only their trivial cut. Choice heads get the union of their class.
    ///
    /// A head's own list is installed before its alternatives are visited,
    /// so an alternative whose cone reaches back to the head uses that list
    /// instead of waiting on the union.
    pub fn cuts_for_node(&mut self, net: &Network, root: NodeRef) -> &[Cut] {
        let mut awaiting_union: AHashSet<NodeRef> = AHashSet::new();
        let mut stack = vec![root];
        while let Some(&current) = stack.last() {
            if awaiting_union.contains(&current) {
                let alternates = net.choices(current);
                let pending: Vec<NodeRef> = alternates
                    .iter()
                    .copied()
                    .filter(|n| !self.has_cuts(*n))
                    .collect();
                if !pending.is_empty() {
                    stack.extend(pending);
                    continue;
                }
                stack.pop();
                awaiting_union.remove(&current);
                let mut class = Vec::with_capacity(alternates.len() + 1);
                class.push(current);
                class.extend(alternates);
                self.union_cuts(&class);
                continue;
            }
            if self.has_cuts(current) {
                stack.pop();
                continue;
            }
            let node = net.node(current);
            let (a, b) = match &node.kind {
                NodeKind::And2 { a, b } => (*a, *b),
                NodeKind::Const0 | NodeKind::Input { .. } | NodeKind::Lut { .. } => {
                    self.set_trivial_cut(current);
                    stack.pop();
                    continue;
                }
            };
            let pending: Vec<NodeRef> = [a.node, b.node]
                .into_iter()
                .filter(|n| !self.has_cuts(*n))
                .collect();
            if !pending.is_empty() {
                stack.extend(pending);
                continue;
            }
            let triv = !self.params.restrict_to_dag_nodes || node.fanout_count() > 1;
            let tree_code = if self.params.only_tree_cuts {
                u8::from(net.fanout_count(a.node) > 1) | (u8::from(net.fanout_count(b.node) > 1) << 1)
            } else {
                0
            };
            self.compute_cuts(current, a, b, triv, tree_code);
            if net.choice_repr(current).is_none() && !net.choices(current).is_empty() {
                awaiting_union.insert(current);
            } else {
                stack.pop();
            }
        }
        self.cuts(root).unwrap_or(&[])
    }

    /// Computes cut lists for every live node in topological order.
    pub fn compute_all(&mut self, net: &Network) {
        let t0 = Instant::now();
        if self.params.drop_on_fly {
            self.set_fanout_counts_from(net);
        }
        for node in net.topo_order() {
            self.cuts_for_node(net, node);
        }
        log::debug!(
            "compute_all: nodes={} {} elapsed_ms={}",
            net.live_node_count(),
            self.stats,
            t0.elapsed().as_millis()
        );
    }

    /// Releases every list and returns the final statistics.
    pub fn stop(self) -> CutManStats {
        log::debug!(
            "CutManager::stop: {} elapsed_ms={}",
            self.stats,
            self.started.elapsed().as_millis()
        );
        self.stats
    }
}
