// SPDX-License-Identifier: Apache-2.0

//! End-to-end behavior of per-node LUT resynthesis on small hand-built cones.

use lutsynth::network::{Network, NetworkOptions, NodeKind, NodeRef, Operand};
use lutsynth::superchoice::{DecomposeContext, Outcome, SuperChoiceOptions, superchoice_lut};
use lutsynth::test_utils::{assert_choices_equivalent, assert_cones_equivalent};
use pretty_assertions::assert_eq;

fn context(lut_size: usize) -> DecomposeContext {
    DecomposeContext::new(SuperChoiceOptions {
        lut_size,
        ..SuperChoiceOptions::default()
    })
    .unwrap()
}

fn inputs(net: &mut Network, n: usize) -> Vec<NodeRef> {
    (0..n).map(|i| net.add_input(format!("x{}", i))).collect()
}

fn op(node: NodeRef) -> Operand {
    node.into()
}

#[test]
fn test_eight_leaf_and_network_becomes_lut_chain() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut net = Network::new("eight_leaf", NetworkOptions::no_opt());
    let x = inputs(&mut net, 8);
    // f = (x0 x1 | x2 x3) & (x4 ^ x5) & (x6 ^ x7), eleven AND nodes.
    let p = net.add_and(op(x[0]), op(x[1]));
    let q = net.add_and(op(x[2]), op(x[3]));
    let g = net.add_or(p, q);
    let h = net.add_xor(op(x[4]), op(x[5]));
    let k = net.add_xor(op(x[6]), op(x[7]));
    let gh = net.add_and(g, h);
    let f = net.add_and(gh, k);
    net.add_output("f", f);
    let ands = net.live_nodes().filter(|(_, n)| n.kind.is_and()).count();
    assert_eq!(ands, 11);
    assert_eq!(net.live_node_count(), 20);
    let root_level = net.level(f.node);
    assert_eq!(root_level, 4);

    let mut ctx = context(4);
    let before = net.node_capacity();
    let outcome = ctx.decompose_node(&mut net, f.node, &x);
    let Outcome::Accepted { top, level, luts } = outcome else {
        panic!("expected an accepted decomposition, got {:?}", outcome);
    };
    assert!(luts >= 2, "only {} intermediate LUTs", luts);
    assert_eq!(net.node_capacity(), before + luts + 1);
    match &net.node(top).kind {
        NodeKind::Lut { fanins, .. } => assert!(fanins.len() <= 4),
        other => panic!("top {} is not a LUT: {:?}", top, other),
    }
    assert!(level < root_level);
    assert_eq!(net.level(f.node), level);
    assert_eq!(net.choices(f.node), vec![top]);
    assert_cones_equivalent(&net, f.node, top, &x);
}

#[test]
fn test_single_leaf_support_becomes_buffer() {
    let mut net = Network::new("buffer", NetworkOptions::no_opt());
    let x = inputs(&mut net, 7);
    let z = net.add_and(op(x[0]), op(x[6]));
    let mut y = net.add_and(op(x[1]), op(x[2]));
    for xi in &x[3..6] {
        y = net.add_and(y, op(*xi));
    }
    // y | !y is always true, but only structurally.
    let tautology = net.add_or(y, y.negate());
    let pos = net.add_and(z, tautology);
    let neg = net.add_and(z.negate(), tautology);
    net.add_output("pos", pos);
    net.add_output("neg", neg);

    let leaves = vec![z.node, x[1], x[2], x[3], x[4], x[5]];
    let mut ctx = context(4);
    let count = net.live_node_count();
    let capacity = net.node_capacity();
    assert_eq!(
        ctx.decompose_node(&mut net, pos.node, &leaves),
        Outcome::Buffer {
            leaf: z.node,
            negated: false
        }
    );
    assert_eq!(
        ctx.decompose_node(&mut net, neg.node, &leaves),
        Outcome::Buffer {
            leaf: z.node,
            negated: true
        }
    );
    assert_eq!(net.live_node_count(), count);
    assert_eq!(net.node_capacity(), capacity);
    assert_eq!(net.level(pos.node), 1);
    assert_eq!(net.level(neg.node), net.level(z.node));
    assert!(net.choices(pos.node).is_empty());
}

/// Six-input function whose cofactor at `i = 8 x0 + 4 x1 + 2 x2 + x3` is the
/// function of `(x4, x5)` with truth table `i` for `i < 9` and constant zero
/// otherwise, so nine distinct cofactors.
fn nine_class_truth() -> u64 {
    let mut truth = 0u64;
    for m in 0..64usize {
        let bit = |v: usize| (m >> v) & 1;
        let i = (bit(0) << 3) | (bit(1) << 2) | (bit(2) << 1) | bit(3);
        let g = if i < 9 { i } else { 0 };
        let j = bit(4) | (bit(5) << 1);
        if (g >> j) & 1 != 0 {
            truth |= 1 << m;
        }
    }
    truth
}

#[test]
fn test_too_many_cofactor_classes_is_infeasible() {
    let mut net = Network::new("nine_classes", NetworkOptions::no_opt());
    let x = inputs(&mut net, 6);
    let root = net.add_lut(&x, nine_class_truth());
    net.add_output("f", op(root));
    let level = net.level(root);
    let count = net.live_node_count();
    let capacity = net.node_capacity();

    let mut ctx = context(4);
    assert_eq!(ctx.decompose_node(&mut net, root, &x), Outcome::Infeasible);
    assert_eq!(net.live_node_count(), count);
    assert_eq!(net.node_capacity(), capacity);
    assert_eq!(net.level(root), level);
    assert!(net.choices(root).is_empty());
}

#[test]
fn test_nine_class_truth_counts() {
    let t = lutsynth::truth_table::TruthTable::from_u64(6, nine_class_truth());
    assert_eq!(lutsynth::superchoice::cofactor_class_count(&t, &[0, 1, 2, 3]), 9);
    assert_eq!(lutsynth::superchoice::encoding_width(9), 4);
}

#[test]
fn test_support_shrink_alone_fits_one_lut() {
    let mut net = Network::new("shrink", NetworkOptions::no_opt());
    let x = inputs(&mut net, 6);
    // x4 and x5 only feed structural tautologies.
    let t4 = net.add_or(op(x[4]), op(x[4]).negate());
    let t5 = net.add_or(op(x[5]), op(x[5]).negate());
    let mut f = net.add_and(op(x[0]), op(x[1]));
    f = net.add_and(f, op(x[2]));
    f = net.add_and(f, op(x[3]));
    f = net.add_and(f, t4);
    f = net.add_and(f, t5);
    net.add_output("f", f);
    assert_eq!(net.level(f.node), 5);

    let mut ctx = context(4);
    let capacity = net.node_capacity();
    let outcome = ctx.decompose_node(&mut net, f.node, &x);
    assert!(
        matches!(outcome, Outcome::Accepted { level: 1, luts: 0, .. }),
        "got {:?}",
        outcome
    );
    let Outcome::Accepted { top, .. } = outcome else {
        unreachable!();
    };
    assert_eq!(net.node_capacity(), capacity + 1);
    match &net.node(top).kind {
        NodeKind::Lut { fanins, .. } => assert_eq!(fanins.as_slice(), &x[0..4]),
        other => panic!("top {} is not a LUT: {:?}", top, other),
    }
    assert_eq!(net.level(f.node), 1);
    assert_cones_equivalent(&net, f.node, top, &x);
}

fn and_chain(net: &mut Network, x: &[NodeRef]) -> Operand {
    let mut acc = op(x[0]);
    for xi in &x[1..] {
        acc = net.add_and(acc, op(*xi));
    }
    acc
}

fn and_tree(net: &mut Network, x: &[NodeRef]) -> Operand {
    if x.len() == 1 {
        return op(x[0]);
    }
    let (lo, hi) = x.split_at(x.len() / 2);
    let lo = and_tree(net, lo);
    let hi = and_tree(net, hi);
    net.add_and(lo, hi)
}

#[test]
fn test_pass_uses_cuts_of_balanced_alternative() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut net = Network::new("chain_with_tree", NetworkOptions::no_opt());
    let x = inputs(&mut net, 8);
    let head = and_chain(&mut net, &x);
    let alt = and_tree(&mut net, &x);
    net.add_choice(head.node, alt.node);
    net.add_output("f", head);
    assert_eq!(net.level(head.node), 7);

    let options = SuperChoiceOptions {
        lut_size: 4,
        cut_size_max: 5,
        ..SuperChoiceOptions::default()
    };
    let stats = superchoice_lut(&mut net, &options).unwrap();
    assert_eq!(stats.skipped_not_cut, 0);
    assert!(stats.nodes_improved > 0);
    let luts: Vec<NodeRef> = net
        .choices(head.node)
        .into_iter()
        .filter(|c| net.node(*c).kind.is_lut())
        .collect();
    assert_eq!(luts.len(), 1, "choices of {}: {:?}", head.node, net.choices(head.node));
    assert!(net.level(head.node) < 7);
    assert_choices_equivalent(&net, 11, 8);
}

#[test]
fn test_pass_links_alternative_improvements_to_head() {
    let mut net = Network::new("lut_with_chain", NetworkOptions::no_opt());
    let x = inputs(&mut net, 6);
    let head = net.add_lut(&x, 1 << 63);
    let alt = and_chain(&mut net, &x);
    net.add_choice(head, alt.node);
    net.add_output("f", op(head));

    let options = SuperChoiceOptions {
        lut_size: 4,
        cut_size_max: 6,
        ..SuperChoiceOptions::default()
    };
    let stats = superchoice_lut(&mut net, &options).unwrap();
    assert!(stats.nodes_improved > 0);
    let choices = net.choices(head);
    assert_eq!(choices.len(), 2);
    assert_eq!(choices[0], alt.node);
    assert!(net.node(choices[1]).kind.is_lut());
    assert_eq!(net.choice_repr(choices[1]), Some(head));
    assert_eq!(net.level(alt.node), 2);
    assert_choices_equivalent(&net, 12, 8);
}
