// SPDX-License-Identifier: Apache-2.0

//! Truth tables of merged cuts.

use crate::cut::types::Cut;
use crate::network::{NodeRef, Operand};
use crate::truth_table::TruthTable;

/// Re-expresses the function of `cut` (for the fan-in referenced by
/// `operand`, including its edge polarity) over the larger `union_leaves`.
fn fanin_function_over(cut: &Cut, operand: Operand, union_leaves: &[NodeRef]) -> TruthTable {
    let positions: Vec<usize> = cut
        .leaves()
        .iter()
        .map(|leaf| {
            union_leaves.binary_search(leaf).unwrap_or_else(|_| {
                panic!("cut leaf {} does not appear in the merged leaf set", leaf)
            })
        })
        .collect();
    let mut out = match cut.function() {
        Some(f) => {
            let mut t = TruthTable::with_capacity(union_leaves.len());
            t.stretch_from(&f, union_leaves.len(), &positions);
            t
        }
        // A trivial cut computed without a table is just its own leaf.
        None if cut.is_trivial_for(operand.node) => {
            TruthTable::var(union_leaves.len(), positions[0])
        }
        None => panic!(
            "cut of fan-in {} has no truth table; truth computation must be enabled throughout",
            operand.node
        ),
    };
    if operand.negated {
        out.not_assign();
    }
    out
}

/// Computes the phase-normalized table of `AND(fanin0, fanin1)` over
/// `union_leaves`, returning the table and whether it was complemented.
pub(crate) fn merged_truth(
    c0: &Cut,
    fanin0: Operand,
    c1: &Cut,
    fanin1: Operand,
    union_leaves: &[NodeRef],
) -> (TruthTable, bool) {
    let mut t = fanin_function_over(c0, fanin0, union_leaves);
    let t1 = fanin_function_over(c1, fanin1, union_leaves);
    t.and_assign(&t1);
    let complemented = t.get_bit(0);
    if complemented {
        t.not_assign();
    }
    (t, complemented)
}
