// SPDX-License-Identifier: Apache-2.0

use crate::network::NodeRef;
use crate::truth_table::TruthTable;

/// Signature bit contributed by a single leaf.
#[inline]
pub fn leaf_signature(node: NodeRef) -> u32 {
    1u32 << (node.id % 32)
}

/// A K-feasible cut: a set of leaves such that every path from an input to the
/// cut's node passes through a leaf.
///
/// Leaves are sorted by node id and unique. `signature` is the OR of the
/// leaves' signature bits; it is only a necessary condition for subset tests,
/// which are always confirmed on the leaves themselves.
///
/// When truth tables are computed, the stored table has bit 0 clear and
/// `complemented` records whether it is the complement of the node function
/// over the leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cut {
    leaves: Vec<NodeRef>,
    signature: u32,
    truth: Option<TruthTable>,
    complemented: bool,
}

impl Cut {
    /// The cut consisting only of `node` itself.
    pub fn trivial(node: NodeRef, with_truth: bool) -> Self {
        Self {
            leaves: vec![node],
            signature: leaf_signature(node),
            truth: with_truth.then(|| TruthTable::var(1, 0)),
            complemented: false,
        }
    }

    pub(crate) fn from_parts(
        leaves: Vec<NodeRef>,
        signature: u32,
        truth: Option<TruthTable>,
        complemented: bool,
    ) -> Self {
        debug_assert!(leaves.windows(2).all(|w| w[0] < w[1]), "cut leaves must be sorted and unique");
        debug_assert_eq!(
            signature,
            leaves.iter().fold(0, |acc, l| acc | leaf_signature(*l))
        );
        Self {
            leaves,
            signature,
            truth,
            complemented,
        }
    }

    pub fn leaves(&self) -> &[NodeRef] {
        &self.leaves
    }

    pub fn size(&self) -> usize {
        self.leaves.len()
    }

    pub fn signature(&self) -> u32 {
        self.signature
    }

    /// Stored (phase-normalized) truth table, if computed.
    pub fn truth(&self) -> Option<&TruthTable> {
        self.truth.as_ref()
    }

    pub fn is_complemented(&self) -> bool {
        self.complemented
    }

    pub fn is_trivial_for(&self, node: NodeRef) -> bool {
        self.leaves.len() == 1 && self.leaves[0] == node
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        self.leaves.binary_search(&node).is_ok()
    }

    /// Returns the node function over the leaves with the stored phase
    /// undone.
    pub fn function(&self) -> Option<TruthTable> {
        self.truth
            .as_ref()
            .map(|t| if self.complemented { t.not() } else { t.clone() })
    }

    /// True if every leaf of `self` is also a leaf of `other`.
    pub fn dominates(&self, other: &Cut) -> bool {
        leaves_dominate(&self.leaves, self.signature, &other.leaves, other.signature)
    }
}

/// True if `small` is a subset of `large`, using the signatures as a quick
/// rejection test.
pub(crate) fn leaves_dominate(small: &[NodeRef], small_sig: u32, large: &[NodeRef], large_sig: u32) -> bool {
    if small.len() > large.len() {
        return false;
    }
    if small_sig & !large_sig != 0 {
        return false;
    }
    is_sorted_subset(small, large)
}

fn is_sorted_subset(small: &[NodeRef], large: &[NodeRef]) -> bool {
    let mut j = 0;
    for s in small {
        while j < large.len() && large[j] < *s {
            j += 1;
        }
        if j == large.len() || large[j] != *s {
            return false;
        }
        j += 1;
    }
    true
}

/// Merges two sorted leaf sets, giving up as soon as the union exceeds
/// `k_max` leaves.
pub(crate) fn merge_leaves(a: &[NodeRef], b: &[NodeRef], k_max: usize) -> Option<Vec<NodeRef>> {
    let mut out = Vec::with_capacity(k_max);
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let next = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) if x == y => {
                i += 1;
                j += 1;
                *x
            }
            (Some(x), Some(y)) if x < y => {
                i += 1;
                *x
            }
            (Some(_), Some(y)) => {
                j += 1;
                *y
            }
            (Some(x), None) => {
                i += 1;
                *x
            }
            (None, Some(y)) => {
                j += 1;
                *y
            }
            (None, None) => unreachable!(),
        };
        if out.len() == k_max {
            return None;
        }
        out.push(next);
    }
    Some(out)
}
