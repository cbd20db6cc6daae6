// SPDX-License-Identifier: Apache-2.0

//! Cut list merging and invariants that must hold on every list.

use lutsynth::cut::{CutManager, CutParams};
use lutsynth::network::{Network, NetworkOptions, NodeRef, Operand};
use lutsynth::test_utils::random_network;
use pretty_assertions::assert_eq;

fn sorted(mut leaves: Vec<NodeRef>) -> Vec<NodeRef> {
    leaves.sort();
    leaves
}

#[test]
fn test_merge_discards_unions_over_k_max() {
    let mut net = Network::new("merge", NetworkOptions::no_opt());
    let x: Vec<NodeRef> = (0..7).map(|i| net.add_input(format!("x{}", i))).collect();
    let x01 = net.add_and(x[0].into(), x[1].into());
    let left = net.add_and(x01, x[2].into());
    let x34 = net.add_and(x[3].into(), x[4].into());
    let x345 = net.add_and(x34, x[5].into());
    let right = net.add_and(x345, x[6].into());
    let root = net.add_and(left, right);
    net.add_output("o", root);

    let mut man = CutManager::start(CutParams {
        k_max: 5,
        filter_dominated: false,
        ..CutParams::default()
    })
    .unwrap();
    assert_eq!(man.cuts_for_node(&net, left.node).len(), 3);
    assert_eq!(man.cuts_for_node(&net, right.node).len(), 4);

    let cuts = man.cuts_for_node(&net, root.node).to_vec();
    // Trivial cut plus the 9 of 12 pairs whose union fits in 5 leaves.
    assert_eq!(cuts.len(), 10);
    assert!(cuts[0].is_trivial_for(root.node));
    assert!(cuts.iter().all(|c| c.size() <= 5));
    let too_wide = [
        sorted(vec![x01.node, x[2], x[3], x[4], x[5], x[6]]),
        sorted(vec![x[0], x[1], x[2], x34.node, x[5], x[6]]),
        sorted(vec![x[0], x[1], x[2], x[3], x[4], x[5], x[6]]),
    ];
    for leaves in &too_wide {
        assert!(!cuts.iter().any(|c| c.leaves() == leaves.as_slice()));
    }
    let widest = sorted(vec![x[0], x[1], x[2], x345.node, x[6]]);
    assert!(cuts.iter().any(|c| c.leaves() == widest.as_slice()));
}

#[test]
fn test_cut_lists_respect_dominance_and_caps() {
    for seed in 0..8 {
        let net = random_network(seed, 12, 150, 6);
        let params = CutParams {
            k_max: 6,
            keep_max: 12,
            ..CutParams::default()
        };
        let mut man = CutManager::start(params).unwrap();
        man.compute_all(&net);
        for (node, _) in net.live_nodes() {
            let Some(cuts) = man.cuts(node) else {
                continue;
            };
            assert!(!cuts.is_empty());
            assert!(cuts.len() <= params.keep_max, "node {} has {} cuts", node, cuts.len());
            assert!(cuts[0].is_trivial_for(node));
            for (i, a) in cuts.iter().enumerate() {
                assert!(a.size() <= params.k_max);
                assert!(a.leaves().windows(2).all(|w| w[0] < w[1]));
                for (j, b) in cuts.iter().enumerate() {
                    if i != j {
                        assert!(
                            !a.dominates(b),
                            "seed {}: cut {:?} dominates {:?} at {}",
                            seed,
                            a.leaves(),
                            b.leaves(),
                            node
                        );
                    }
                }
            }
            assert!(cuts[1..].windows(2).all(|w| w[0].size() <= w[1].size()));
        }
    }
}

#[test]
fn test_cut_truth_tables_match_cone_simulation() {
    let net = random_network(42, 8, 60, 3);
    let mut man = CutManager::start(CutParams {
        k_max: 6,
        compute_truth: true,
        ..CutParams::default()
    })
    .unwrap();
    man.compute_all(&net);
    for (node, n) in net.live_nodes() {
        if !n.kind.is_and() {
            continue;
        }
        for cut in man.cuts(node).unwrap_or(&[]) {
            let f = cut.function().unwrap();
            let leaves = cut.leaves();
            for m in 0..(1usize << leaves.len()) {
                let patterns: Vec<(NodeRef, u64)> = leaves
                    .iter()
                    .enumerate()
                    .map(|(j, leaf)| (*leaf, if (m >> j) & 1 != 0 { u64::MAX } else { 0 }))
                    .collect();
                let want = net.eval_cone_words(node, &patterns) & 1 != 0;
                assert_eq!(f.get_bit(m), want, "node {} cut {:?} minterm {}", node, leaves, m);
            }
        }
    }
}

#[test]
fn test_operand_polarity_reaches_cut_function() {
    let mut net = Network::new("polarity", NetworkOptions::no_opt());
    let a = net.add_input("a");
    let b = net.add_input("b");
    let c = net.add_input("c");
    let ab = net.add_and(Operand::new(a, true), b.into());
    let root = net.add_and(ab.negate(), Operand::new(c, true));
    net.add_output("o", root);
    let mut man = CutManager::start(CutParams {
        k_max: 3,
        compute_truth: true,
        ..CutParams::default()
    })
    .unwrap();
    let cuts = man.cuts_for_node(&net, root.node);
    let full = cuts.iter().find(|c| c.size() == 3).unwrap();
    let f = full.function().unwrap();
    for m in 0..8usize {
        let (va, vb, vc) = (m & 1 != 0, m & 2 != 0, m & 4 != 0);
        assert_eq!(f.get_bit(m), !(!va && vb) && !vc, "minterm {}", m);
    }
}
