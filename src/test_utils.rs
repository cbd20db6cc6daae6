// SPDX-License-Identifier: Apache-2.0

//! Canned networks and random network generation shared by unit tests,
//! integration tests and benchmarks.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::network::{Network, NetworkOptions, NodeRef, Operand};

pub struct TestGraph {
    pub net: Network,
    pub i0: Operand,
    pub i1: Operand,
    pub i2: Operand,
    pub i3: Operand,
    pub a: Operand,
    pub b: Operand,
    pub c: Operand,
    pub o: Operand,
}

/// Graph:
/// i0 --\
///       AND(a) --\
/// i1 --|          \
///       AND(b) -- AND(o) [output]
/// i2 --|
///       AND(c) [output]
/// i3 --/
pub fn setup_simple_graph() -> TestGraph {
    let mut net = Network::new("g", NetworkOptions::no_opt());
    let i0: Operand = net.add_input("i0").into();
    let i1: Operand = net.add_input("i1").into();
    let i2: Operand = net.add_input("i2").into();
    let i3: Operand = net.add_input("i3").into();

    let a = net.add_and(i0, i1);
    let b = net.add_and(i1, i2);
    let c = net.add_and(i2, i3);

    let o = net.add_and(a, b);
    net.add_output("o", o);
    net.add_output("c", c);

    TestGraph {
        net,
        i0,
        i1,
        i2,
        i3,
        a,
        b,
        c,
        o,
    }
}

pub struct TestChain {
    pub net: Network,
    pub inputs: Vec<NodeRef>,
    /// Intermediate AND nodes, `ands[k]` covering inputs `0..=k+1`.
    pub ands: Vec<Operand>,
    pub root: Operand,
}

/// Builds `x0 & x1 & ... & x{n-1}` as a linear chain of AND nodes, so the
/// root sits at level `n - 1` with every input at level 0.
pub fn setup_and_chain(num_inputs: usize) -> TestChain {
    assert!(num_inputs >= 2);
    let mut net = Network::new(format!("and_chain_{}", num_inputs), NetworkOptions::no_opt());
    let inputs: Vec<NodeRef> = (0..num_inputs)
        .map(|i| net.add_input(format!("x{}", i)))
        .collect();
    let mut ands = Vec::with_capacity(num_inputs - 1);
    let mut acc: Operand = inputs[0].into();
    for input in &inputs[1..] {
        acc = net.add_and(acc, (*input).into());
        ands.push(acc);
    }
    net.add_output("o", acc);
    TestChain {
        net,
        inputs,
        ands,
        root: acc,
    }
}

/// Builds a random AND network. Every AND picks two distinct earlier
/// non-constant nodes with random polarities, biased towards recent nodes so
/// the result is deep rather than flat. The last `num_outputs` nodes drive
/// outputs.
pub fn random_network(seed: u64, num_inputs: usize, num_ands: usize, num_outputs: usize) -> Network {
    assert!(num_inputs >= 2);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut net = Network::new(format!("random_{}", seed), NetworkOptions::no_opt());
    let mut pool: Vec<NodeRef> = (0..num_inputs)
        .map(|i| net.add_input(format!("x{}", i)))
        .collect();
    for _ in 0..num_ands {
        let window = pool.len().min(3 * num_inputs);
        let lo = pool.len() - window;
        let i = rng.gen_range(lo..pool.len());
        let mut j = rng.gen_range(0..pool.len());
        while j == i {
            j = rng.gen_range(0..pool.len());
        }
        let a = Operand::new(pool[i], rng.gen_bool(0.5));
        let b = Operand::new(pool[j], rng.gen_bool(0.5));
        let r = net.add_and(a, b);
        pool.push(r.node);
    }
    for (k, node) in pool.iter().rev().take(num_outputs).enumerate() {
        net.add_output(format!("o{}", k), (*node).into());
    }
    net
}

/// Returns `rounds` blocks of random input words, one word per input.
pub fn random_input_words(net: &Network, seed: u64, rounds: usize) -> Vec<Vec<u64>> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..rounds)
        .map(|_| net.inputs().iter().map(|_| rng.r#gen::<u64>()).collect())
        .collect()
}

/// Checks, by random simulation, that every choice alternative computes the
/// same function as the head of its class.
pub fn assert_choices_equivalent(net: &Network, seed: u64, rounds: usize) {
    let heads: Vec<NodeRef> = net
        .live_nodes()
        .filter(|(r, _)| net.choice_repr(*r).is_none() && !net.choices(*r).is_empty())
        .map(|(r, _)| r)
        .collect();
    for words in random_input_words(net, seed, rounds) {
        let values = net.simulate_nodes(&words);
        for head in &heads {
            for alt in net.choices(*head) {
                assert_eq!(
                    values[head.id], values[alt.id],
                    "choice {} of {} computes a different function",
                    alt, head
                );
            }
        }
    }
}

/// Exhaustively checks that `root` and `other` agree on every assignment of
/// `leaves`, both evaluated as cones cut at `leaves`. Supports up to 16
/// leaves.
pub fn assert_cones_equivalent(net: &Network, root: NodeRef, other: NodeRef, leaves: &[NodeRef]) {
    assert!(leaves.len() <= 16);
    let minterms = 1usize << leaves.len();
    let mut base = 0usize;
    while base < minterms {
        let patterns: Vec<(NodeRef, u64)> = leaves
            .iter()
            .enumerate()
            .map(|(j, leaf)| {
                let mut w = 0u64;
                for bit in 0..64 {
                    let m = (base + bit) % minterms;
                    w |= (((m >> j) & 1) as u64) << bit;
                }
                (*leaf, w)
            })
            .collect();
        let want = net.eval_cone_words(root, &patterns);
        let got = net.eval_cone_words(other, &patterns);
        assert_eq!(
            want, got,
            "{} and {} differ over leaves {:?} near minterm {}",
            root, other, leaves, base
        );
        base += 64;
    }
}
