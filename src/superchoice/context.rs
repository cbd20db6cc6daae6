// SPDX-License-Identifier: Apache-2.0

//! Per-node resynthesis of an oversized cut into a chain of K-input LUTs.
//!
//! For one root and one of its cuts we collect the cone between the cut and
//! the root, simulate it to get the root's function over the leaves, drop
//! leaves outside the support and then repeatedly replace K leaves by fewer
//! LUT outputs until K leaves remain. The result is offered as a choice of the
//! root only when it arrives strictly earlier than the root.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::network::{Network, NodeKind, NodeRef};
use crate::truth_table::{MAX_VARS, TruthTable, count_ones, full_mask};

pub const MIN_LUT_SIZE: usize = 3;
pub const MAX_LUT_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperChoiceOptions {
    /// Number of inputs of the LUTs being built (K).
    pub lut_size: usize,
    /// Largest cut, in leaves, that is resynthesized.
    pub cut_size_max: usize,
    /// Largest number of cuts kept per node during enumeration.
    pub keep_max: usize,
    /// Largest cone, in nodes, that is simulated.
    pub volume_max: usize,
}

impl Default for SuperChoiceOptions {
    fn default() -> Self {
        Self {
            lut_size: 4,
            cut_size_max: 8,
            keep_max: 250,
            volume_max: 1000,
        }
    }
}

impl SuperChoiceOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_LUT_SIZE..=MAX_LUT_SIZE).contains(&self.lut_size) {
            return Err(ConfigError::LutSizeOutOfRange {
                lut_size: self.lut_size,
                min: MIN_LUT_SIZE,
                max: MAX_LUT_SIZE,
            });
        }
        if self.cut_size_max <= self.lut_size {
            return Err(ConfigError::CutSizeNotAboveLutSize {
                cut_size_max: self.cut_size_max,
                lut_size: self.lut_size,
            });
        }
        if self.cut_size_max > MAX_VARS {
            return Err(ConfigError::CutSizeOutOfRange {
                k_max: self.cut_size_max,
                min: self.lut_size + 1,
                max: MAX_VARS,
            });
        }
        if self.keep_max == 0 {
            return Err(ConfigError::ZeroKeepMax);
        }
        if self.volume_max == 0 {
            return Err(ConfigError::ZeroVolumeMax);
        }
        Ok(())
    }
}

/// What happened to one root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The root is constant over its cut; its level was set to 0.
    Constant { value: bool },
    /// The root equals one leaf, possibly complemented; its level was set to
    /// that leaf's level.
    Buffer { leaf: NodeRef, negated: bool },
    /// A LUT implementation arriving at `level` was linked as a choice of the
    /// root, using `luts` intermediate LUTs below `top`.
    Accepted { top: NodeRef, level: u32, luts: usize },
    /// Some step found too many cofactor classes; nothing was kept.
    Infeasible,
    /// The implementation was complete but not faster; nothing was kept.
    NoImprovement,
    /// The cut has no more leaves than the LUT size.
    CutTooSmall,
    /// The cone between the cut and the root exceeds the volume cap.
    VolumeTooLarge,
    /// The leaves do not bound the root, through any choice of the nodes in
    /// its cone.
    NotACut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConeWalk {
    Collected,
    TooLarge,
    /// Every way down from the root reaches an input without crossing the
    /// leaves.
    Escaped,
}

#[derive(Debug, Clone, Copy)]
enum SimSlot {
    Leaf(usize),
    Volume(usize),
}

fn sim_table<'a>(
    slots: &AHashMap<NodeRef, SimSlot>,
    vars: &'a [TruthTable],
    done: &'a [TruthTable],
    node: NodeRef,
) -> &'a TruthTable {
    match slots.get(&node) {
        Some(SimSlot::Leaf(i)) => &vars[*i],
        Some(SimSlot::Volume(k)) => &done[*k],
        None => panic!("simulate: fan-in {} has no table yet", node),
    }
}

/// Reusable buffers for resynthesizing one root at a time.
pub struct DecomposeContext {
    pub(super) options: SuperChoiceOptions,
    /// Current leaves; variable `i` of `truth` is `leaves[i]`.
    pub(super) leaves: Vec<NodeRef>,
    volume: Vec<NodeRef>,
    /// Walked nodes whose status is settled: true if the leaves bound them.
    bounded: AHashMap<NodeRef, bool>,
    /// Class heads in the cone that are simulated through an alternative.
    aliases: Vec<(NodeRef, NodeRef)>,
    slots: AHashMap<NodeRef, SimSlot>,
    sims: Vec<TruthTable>,
    /// Elementary tables over the current leaf count.
    pub(super) vars: Vec<TruthTable>,
    pub(super) truth: TruthTable,
    pub(super) scratch: TruthTable,
    /// Cofactor tree; the final cofactors live at `[2^K, 2^(K+1))`.
    pub(super) cofs: Vec<TruthTable>,
    pub(super) bound_set: Vec<usize>,
    pub(super) leaf_levels: Vec<u32>,
    pub(super) class_of: Vec<usize>,
    pub(super) class_reps: Vec<usize>,
    /// LUT nodes created during the current attempt.
    pub(super) created: Vec<NodeRef>,
}

impl DecomposeContext {
    pub fn new(options: SuperChoiceOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        let max_vars = options.cut_size_max;
        let ncofs = 1usize << options.lut_size;
        Ok(Self {
            options,
            leaves: Vec::with_capacity(max_vars),
            volume: Vec::new(),
            bounded: AHashMap::new(),
            aliases: Vec::new(),
            slots: AHashMap::new(),
            sims: Vec::new(),
            vars: (0..max_vars).map(|_| TruthTable::with_capacity(max_vars)).collect(),
            truth: TruthTable::with_capacity(max_vars),
            scratch: TruthTable::with_capacity(max_vars),
            cofs: (0..2 * ncofs).map(|_| TruthTable::with_capacity(max_vars)).collect(),
            bound_set: Vec::with_capacity(options.lut_size),
            leaf_levels: Vec::with_capacity(max_vars),
            class_of: Vec::with_capacity(ncofs),
            class_reps: Vec::with_capacity(ncofs),
            created: Vec::new(),
        })
    }

    pub fn options(&self) -> &SuperChoiceOptions {
        &self.options
    }

    /// Function of the root over the current leaves, as left by the last
    /// attempt.
    pub fn truth(&self) -> &TruthTable {
        &self.truth
    }

    /// Resynthesizes `root` over `leaves`, a cut of at most `cut_size_max`
    /// leaves. The cut may pass through choices of the nodes in the cone; a
    /// leaf set that bounds no such cone gives `Outcome::NotACut`.
    pub fn decompose_node(&mut self, net: &mut Network, root: NodeRef, leaves: &[NodeRef]) -> Outcome {
        let k = self.options.lut_size;
        if leaves.len() <= k {
            return Outcome::CutTooSmall;
        }
        assert!(
            leaves.len() <= self.options.cut_size_max,
            "decompose_node({}): {} leaves exceeds the cut size bound {}",
            root,
            leaves.len(),
            self.options.cut_size_max
        );
        self.leaves.clear();
        self.leaves.extend_from_slice(leaves);

        match self.build_cone(net, root) {
            ConeWalk::Collected => {}
            ConeWalk::TooLarge => {
                log::trace!(
                    "decompose_node({}): volume exceeds {}",
                    root,
                    self.options.volume_max
                );
                return Outcome::VolumeTooLarge;
            }
            ConeWalk::Escaped => {
                log::trace!("decompose_node({}): {:?} is not a cut", root, self.leaves);
                return Outcome::NotACut;
            }
        }
        self.simulate(net, root);

        let support = self.truth.support();
        match count_ones(support) {
            0 => {
                net.set_level(root, 0);
                return Outcome::Constant {
                    value: self.truth.get_bit(0),
                };
            }
            1 => {
                let leaf = self.leaves[support.trailing_zeros() as usize];
                let level = net.level(leaf);
                net.set_level(root, level);
                return Outcome::Buffer {
                    leaf,
                    negated: self.truth.get_bit(0),
                };
            }
            _ => {}
        }
        if support != full_mask(self.leaves.len()) {
            self.scratch.shrink_from(&self.truth, support);
            std::mem::swap(&mut self.truth, &mut self.scratch);
            let mut pos = 0;
            self.leaves.retain(|_| {
                let keep = support & (1 << pos) != 0;
                pos += 1;
                keep
            });
        }

        self.created.clear();
        while self.leaves.len() > k {
            let before = self.leaves.len();
            if !self.decompose_step(net) {
                let removed = self.discard_created(net);
                log::trace!(
                    "decompose_node({}): infeasible with {} leaves, removed {} nodes",
                    root,
                    before,
                    removed
                );
                return Outcome::Infeasible;
            }
            debug_assert!(self.leaves.len() < before);
        }

        let top = net.add_lut(&self.leaves, self.truth.to_u64());
        let level = net.level(top);
        let root_level = net.level(root);
        if level >= root_level {
            net.delete_rec(top);
            self.discard_created(net);
            log::trace!(
                "decompose_node({}): level {} does not beat {}",
                root,
                level,
                root_level
            );
            return Outcome::NoImprovement;
        }
        let luts = self.created.len();
        net.add_choice(net.choice_repr(root).unwrap_or(root), top);
        net.set_level(root, level);
        log::trace!(
            "decompose_node({}): accepted {} at level {} (was {}) with {} LUTs",
            root,
            top,
            level,
            root_level,
            luts + 1
        );
        Outcome::Accepted { top, level, luts }
    }

    /// Deletes LUTs created in this attempt that nothing uses, newest first.
    fn discard_created(&mut self, net: &mut Network) -> usize {
        let mut removed = 0;
        for node in self.created.drain(..).rev() {
            if net.is_live(node) && net.fanout_count(node) == 0 {
                removed += net.delete_rec(node);
            }
        }
        removed
    }

    /// Collects the nodes strictly between the leaves and `root` (inclusive
    /// of `root`) in post-order.
    ///
    /// Cuts of a class head are the union of its members' cuts, so a node
    /// whose own fan-ins escape the leaves may still be bounded through one of
    /// its alternatives. Members are tried in class order; a head implemented
    /// by an alternative is recorded in `aliases` and the alternative's cone
    /// joins the volume. Bounded nodes from abandoned attempts stay in the
    /// volume; their fan-ins precede them, so the post-order still holds.
    fn build_cone(&mut self, net: &mut Network, root: NodeRef) -> ConeWalk {
        self.volume.clear();
        self.bounded.clear();
        self.aliases.clear();
        if self.leaves.contains(&root) {
            return ConeWalk::Escaped;
        }
        net.increment_trav_id();
        for leaf in &self.leaves {
            net.set_trav_id_current(*leaf);
            self.bounded.insert(*leaf, true);
        }
        net.set_trav_id_current(root);
        // (node, index of the class member being tried)
        let mut stack = vec![(root, 0usize)];
        'frames: while let Some(&(node, member_index)) = stack.last() {
            let member = if member_index == 0 {
                Some(node)
            } else if net.choice_repr(node).is_none() {
                net.choices(node).get(member_index - 1).copied()
            } else {
                None
            };
            let Some(member) = member else {
                stack.pop();
                self.bounded.insert(node, false);
                continue;
            };
            if member != node {
                match self.bounded.get(&member).copied() {
                    Some(true) => {
                        self.aliases.push((node, member));
                        self.bounded.insert(node, true);
                        stack.pop();
                    }
                    Some(false) => bump_member(&mut stack),
                    // Still on the stack; only a cyclic class can get here.
                    None if net.is_trav_id_current(member) => bump_member(&mut stack),
                    None => {
                        net.set_trav_id_current(member);
                        stack.push((member, 0));
                    }
                }
                continue;
            }
            if matches!(net.node(node).kind, NodeKind::Input { .. }) {
                bump_member(&mut stack);
                continue;
            }
            for fanin in net.fanins(node) {
                match self.bounded.get(&fanin).copied() {
                    Some(true) => {}
                    Some(false) => {
                        bump_member(&mut stack);
                        continue 'frames;
                    }
                    None if net.is_trav_id_current(fanin) => {
                        bump_member(&mut stack);
                        continue 'frames;
                    }
                    None => {
                        net.set_trav_id_current(fanin);
                        stack.push((fanin, 0));
                        continue 'frames;
                    }
                }
            }
            stack.pop();
            self.bounded.insert(node, true);
            self.volume.push(node);
            if self.volume.len() > self.options.volume_max {
                return ConeWalk::TooLarge;
            }
        }
        if self.bounded.get(&root) == Some(&true) {
            ConeWalk::Collected
        } else {
            ConeWalk::Escaped
        }
    }

    /// Computes the table of every volume node over the leaves and leaves the
    /// table of `root` in `truth`.
    fn simulate(&mut self, net: &Network, root: NodeRef) {
        let num_vars = self.leaves.len();
        self.slots.clear();
        for (i, leaf) in self.leaves.iter().enumerate() {
            self.vars[i].set_var(num_vars, i);
            self.slots.insert(*leaf, SimSlot::Leaf(i));
        }
        while self.sims.len() < self.volume.len() {
            self.sims.push(TruthTable::with_capacity(self.options.cut_size_max));
        }
        for (j, node) in self.volume.iter().enumerate() {
            self.slots.insert(*node, SimSlot::Volume(j));
        }
        for (head, member) in &self.aliases {
            if let Some(slot) = self.slots.get(member).copied() {
                self.slots.insert(*head, slot);
            }
        }

        let Self {
            volume,
            sims,
            vars,
            slots,
            scratch,
            ..
        } = self;
        for (j, node) in volume.iter().enumerate() {
            let (done, rest) = sims.split_at_mut(j);
            let done: &[TruthTable] = done;
            let out = &mut rest[0];
            match &net.node(*node).kind {
                NodeKind::Const0 => out.reset(num_vars),
                NodeKind::And2 { a, b } => {
                    out.copy_from(sim_table(slots, vars, done, a.node));
                    if a.negated {
                        out.not_assign();
                    }
                    let tb = sim_table(slots, vars, done, b.node);
                    if b.negated {
                        out.sharp_assign(tb);
                    } else {
                        out.and_assign(tb);
                    }
                }
                NodeKind::Lut { fanins, truth, .. } => {
                    out.reset(num_vars);
                    for minterm in 0..(1usize << fanins.len()) {
                        if (truth >> minterm) & 1 == 0 {
                            continue;
                        }
                        scratch.reset(num_vars);
                        scratch.fill();
                        for (pos, fanin) in fanins.iter().enumerate() {
                            let t = sim_table(slots, vars, done, *fanin);
                            if (minterm >> pos) & 1 != 0 {
                                scratch.and_assign(t);
                            } else {
                                scratch.sharp_assign(t);
                            }
                        }
                        out.or_assign(scratch);
                    }
                }
                NodeKind::Input { .. } => unreachable!("inputs never enter the volume"),
            }
        }
        let root_table = sim_table(&self.slots, &self.vars, &self.sims, root);
        self.truth.copy_from(root_table);
    }
}

fn bump_member(stack: &mut [(NodeRef, usize)]) {
    if let Some(top) = stack.last_mut() {
        top.1 += 1;
    }
}
