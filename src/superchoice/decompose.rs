// SPDX-License-Identifier: Apache-2.0

//! One cofactor-class decomposition step.
//!
//! The K earliest-arriving leaves form the bound set. The function is split
//! into its `2^K` cofactors on the bound set; equal cofactors form a class.
//! With `c` classes, `ceil(log2(c))` new LUTs over the bound set encode which
//! class is selected, and the remainder function chooses among the class
//! representatives using those LUT outputs. The step fails when there are more
//! than `2^(K-1)` classes, since the encoding would then save nothing.

use crate::network::{Network, NodeRef};
use crate::superchoice::bound_set::select_bound_set;
use crate::superchoice::context::DecomposeContext;
use crate::truth_table::{TruthTable, full_mask};

/// Fills `cofs[2^K..2^(K+1))` with the cofactors of `truth` on `bound_set`.
///
/// Cofactor `i` is taken at the assignment where bound variable `u` has the
/// value of bit `K - 1 - u` of `i`. The lower half of `cofs` holds the
/// intermediate cofactors of the splitting tree.
pub(super) fn build_cofactors(truth: &TruthTable, bound_set: &[usize], cofs: &mut Vec<TruthTable>) {
    let ncofs = 1usize << bound_set.len();
    while cofs.len() < 2 * ncofs {
        cofs.push(TruthTable::with_capacity(truth.num_vars()));
    }
    cofs[1].copy_from(truth);
    for (v, var) in bound_set.iter().enumerate() {
        for i in 0..(1usize << v) {
            let idx = (1 << v) + i;
            let (lo, hi) = cofs.split_at_mut(2 * idx);
            let parent = &lo[idx];
            hi[0].copy_from(parent);
            hi[0].cofactor0(*var);
            hi[1].copy_from(parent);
            hi[1].cofactor1(*var);
        }
    }
}

/// Groups equal cofactors into classes in index order. `class_of[i]` is the
/// class of cofactor `i` and `reps[c]` the first member of class `c`. Returns
/// false as soon as more than `max_classes` classes appear.
pub(super) fn classify_cofactors(
    cofs: &[TruthTable],
    class_of: &mut Vec<usize>,
    reps: &mut Vec<usize>,
    max_classes: usize,
) -> bool {
    class_of.clear();
    reps.clear();
    for (i, cof) in cofs.iter().enumerate() {
        if let Some(class) = reps.iter().position(|r| cofs[*r].is_equal(cof)) {
            class_of.push(class);
            continue;
        }
        if reps.len() == max_classes {
            return false;
        }
        reps.push(i);
        class_of.push(reps.len() - 1);
    }
    true
}

/// Number of encoding variables needed to tell `num_classes` classes apart.
pub fn encoding_width(num_classes: usize) -> usize {
    if num_classes <= 1 {
        0
    } else {
        (usize::BITS - (num_classes - 1).leading_zeros()) as usize
    }
}

/// Returns the number of distinct cofactors of `truth` on the variables in
/// `bound_set`.
pub fn cofactor_class_count(truth: &TruthTable, bound_set: &[usize]) -> usize {
    let ncofs = 1usize << bound_set.len();
    let mut cofs = Vec::new();
    build_cofactors(truth, bound_set, &mut cofs);
    let mut class_of = Vec::new();
    let mut reps = Vec::new();
    classify_cofactors(&cofs[ncofs..2 * ncofs], &mut class_of, &mut reps, usize::MAX);
    reps.len()
}

impl DecomposeContext {
    /// Replaces the K bound-set leaves by fewer new LUT outputs. Returns
    /// false, creating nothing, when the cofactor classes are too many.
    pub(super) fn decompose_step(&mut self, net: &mut Network) -> bool {
        let k = self.options.lut_size;
        let ncofs = 1usize << k;
        let num_vars = self.leaves.len();
        debug_assert!(num_vars > k);

        self.leaf_levels.clear();
        self.leaf_levels
            .extend(self.leaves.iter().map(|leaf| net.level(*leaf)));
        select_bound_set(&self.leaf_levels, k, &mut self.bound_set);

        build_cofactors(&self.truth, &self.bound_set, &mut self.cofs);
        if !classify_cofactors(
            &self.cofs[ncofs..2 * ncofs],
            &mut self.class_of,
            &mut self.class_reps,
            ncofs / 2,
        ) {
            log::trace!(
                "decompose_step: more than {} classes on bound set {:?}",
                ncofs / 2,
                self.bound_set
            );
            return false;
        }
        let num_classes = self.class_reps.len();
        let num_vars_new = encoding_width(num_classes);
        debug_assert!(num_vars_new < k);

        for (i, var) in self.vars[..num_vars].iter_mut().enumerate() {
            var.set_var(num_vars, i);
        }

        let Self {
            leaves,
            vars,
            truth,
            scratch,
            cofs,
            bound_set,
            class_of,
            class_reps,
            created,
            ..
        } = self;

        // Encoding variable v takes over the variable slot of bound_set[v];
        // the cofactors do not depend on any bound-set variable.
        truth.reset(num_vars);
        for (code, rep) in class_reps.iter().enumerate() {
            scratch.copy_from(&cofs[ncofs + rep]);
            for (v, pos) in bound_set[..num_vars_new].iter().enumerate() {
                if code & (1 << v) != 0 {
                    scratch.and_assign(&vars[*pos]);
                } else {
                    scratch.sharp_assign(&vars[*pos]);
                }
            }
            truth.or_assign(scratch);
        }

        // LUT input u is bound_set[u], which is bit K-1-u of a cofactor index.
        let fanins: Vec<NodeRef> = bound_set.iter().map(|pos| leaves[*pos]).collect();
        let mut new_nodes = Vec::with_capacity(num_vars_new);
        for v in 0..num_vars_new {
            let mut lut_truth = 0u64;
            for (index, class) in class_of.iter().enumerate() {
                if class & (1 << v) == 0 {
                    continue;
                }
                let minterm = (0..k).fold(0usize, |m, u| m | (((index >> (k - 1 - u)) & 1) << u));
                lut_truth |= 1u64 << minterm;
            }
            let node = net.add_lut(&fanins, lut_truth);
            created.push(node);
            new_nodes.push(node);
        }

        for (v, node) in new_nodes.iter().enumerate() {
            leaves[bound_set[v]] = *node;
        }
        let remove = bound_set[num_vars_new..]
            .iter()
            .fold(0u32, |mask, pos| mask | (1 << pos));
        scratch.shrink_from(truth, full_mask(num_vars) & !remove);
        std::mem::swap(truth, scratch);
        let mut pos = 0;
        leaves.retain(|_| {
            let keep = remove & (1 << pos) == 0;
            pos += 1;
            keep
        });
        debug_assert_eq!(leaves.len(), num_vars - (k - num_vars_new));
        true
    }
}
