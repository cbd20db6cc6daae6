// SPDX-License-Identifier: Apache-2.0

//! Host Boolean network: two-input AND nodes with complemented edges plus
//! K-input lookup tables.
//!
//! Nodes are append-only and their fan-ins are never rewired, so every node's
//! fan-ins have smaller ids than the node itself. Deleted nodes leave a hole in
//! the node vector; `NodeRef`s to deleted nodes must not be used.

pub mod isop;
pub mod node;
pub mod stats;
pub mod topo;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::network::isop::{MAX_COVER_VARS, isop, replicate_u64};
pub use crate::network::node::{Node, NodeKind, NodeRef, Operand, Output};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkOptions {
    /// Fold AND nodes with a constant or repeated operand.
    pub fold: bool,
    /// Structurally hash AND nodes so identical (a, b) pairs are shared.
    pub hash: bool,
}

impl NetworkOptions {
    /// Folding and hashing enabled.
    pub fn opt() -> Self {
        Self {
            fold: true,
            hash: true,
        }
    }

    /// Every `add_and` creates a fresh node; useful for building exact
    /// structures in tests.
    pub fn no_opt() -> Self {
        Self {
            fold: false,
            hash: false,
        }
    }
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self::opt()
    }
}

#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    nodes: Vec<Option<Node>>,
    inputs: Vec<NodeRef>,
    outputs: Vec<Output>,
    options: NetworkOptions,
    strash: AHashMap<(Operand, Operand), NodeRef>,
    trav_epoch: u64,
}

impl Network {
    pub fn new(name: impl Into<String>, options: NetworkOptions) -> Self {
        Self {
            name: name.into(),
            nodes: vec![Some(Node::new(NodeKind::Const0, 0))],
            inputs: Vec::new(),
            outputs: Vec::new(),
            options,
            strash: AHashMap::new(),
            trav_epoch: 0,
        }
    }

    pub fn options(&self) -> NetworkOptions {
        self.options
    }

    pub fn const0(&self) -> Operand {
        Operand::new(NodeRef { id: 0 }, false)
    }

    pub fn const1(&self) -> Operand {
        Operand::new(NodeRef { id: 0 }, true)
    }

    /// Number of node slots, including deleted ones. Node ids are always
    /// below this value.
    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn live_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_live(&self, node: NodeRef) -> bool {
        matches!(self.nodes.get(node.id), Some(Some(_)))
    }

    pub fn node(&self, node: NodeRef) -> &Node {
        match self.nodes.get(node.id) {
            Some(Some(n)) => n,
            _ => panic!("node {} is not live in network '{}'", node, self.name),
        }
    }

    fn node_mut(&mut self, node: NodeRef) -> &mut Node {
        match self.nodes.get_mut(node.id) {
            Some(Some(n)) => n,
            _ => panic!("node {} is not live in network '{}'", node, self.name),
        }
    }

    /// Iterates live nodes in id order, which is also a topological order.
    pub fn live_nodes(&self) -> impl Iterator<Item = (NodeRef, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, n)| n.as_ref().map(|n| (NodeRef { id }, n)))
    }

    pub fn inputs(&self) -> &[NodeRef] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn fanins(&self, node: NodeRef) -> Vec<NodeRef> {
        self.node(node).kind.fanins()
    }

    pub fn fanout_count(&self, node: NodeRef) -> u32 {
        self.node(node).fanout_count
    }

    pub fn level(&self, node: NodeRef) -> u32 {
        self.node(node).level
    }

    pub fn set_level(&mut self, node: NodeRef, level: u32) {
        self.node_mut(node).level = level;
    }

    /// Level implied by the current fan-in levels.
    pub fn fanin_level(&self, node: NodeRef) -> u32 {
        let n = self.node(node);
        if n.kind.is_terminal() {
            return 0;
        }
        1 + n
            .kind
            .fanins()
            .iter()
            .map(|f| self.level(*f))
            .max()
            .unwrap_or(0)
    }

    /// Resets the level of `node` from its fan-ins and returns it.
    pub fn recompute_level(&mut self, node: NodeRef) -> u32 {
        let level = self.fanin_level(node);
        self.set_level(node, level);
        level
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeRef {
        let node_ref = NodeRef {
            id: self.nodes.len(),
        };
        let fanins = kind.fanins();
        for f in &fanins {
            assert!(
                f.id < node_ref.id,
                "fan-in {} of new node {} is not an existing node",
                f,
                node_ref
            );
            self.node_mut(*f).fanout_count += 1;
        }
        let level = if kind.is_terminal() {
            0
        } else {
            1 + fanins.iter().map(|f| self.level(*f)).max().unwrap_or(0)
        };
        self.nodes.push(Some(Node::new(kind, level)));
        node_ref
    }

    pub fn add_input(&mut self, name: impl Into<String>) -> NodeRef {
        let node_ref = self.push_node(NodeKind::Input { name: name.into() });
        self.inputs.push(node_ref);
        node_ref
    }

    fn is_known_false(&self, op: Operand) -> bool {
        op.node.id == 0 && !op.negated
    }

    fn is_known_true(&self, op: Operand) -> bool {
        op.node.id == 0 && op.negated
    }

    pub fn add_and(&mut self, lhs: Operand, rhs: Operand) -> Operand {
        if self.options.fold {
            if self.is_known_false(lhs) || self.is_known_false(rhs) {
                return self.const0();
            }
            if self.is_known_true(lhs) {
                return rhs;
            }
            if self.is_known_true(rhs) {
                return lhs;
            }
            if lhs == rhs {
                return lhs;
            }
            if lhs == rhs.negate() {
                return self.const0();
            }
        }
        let key = if lhs <= rhs { (lhs, rhs) } else { (rhs, lhs) };
        if self.options.hash {
            if let Some(existing) = self.strash.get(&key) {
                return (*existing).into();
            }
        }
        let node_ref = self.push_node(NodeKind::And2 { a: lhs, b: rhs });
        if self.options.hash {
            self.strash.insert(key, node_ref);
        }
        node_ref.into()
    }

    pub fn add_or(&mut self, lhs: Operand, rhs: Operand) -> Operand {
        self.add_and(lhs.negate(), rhs.negate()).negate()
    }

    pub fn add_xor(&mut self, lhs: Operand, rhs: Operand) -> Operand {
        let a = self.add_and(lhs, rhs.negate());
        let b = self.add_and(lhs.negate(), rhs);
        self.add_or(a, b)
    }

    /// Adds a lookup table over `fanins`; bit `m` of `truth` is the output
    /// when fan-in `j` carries bit `j` of `m`.
    pub fn add_lut(&mut self, fanins: &[NodeRef], truth: u64) -> NodeRef {
        assert!(
            !fanins.is_empty() && fanins.len() <= MAX_COVER_VARS,
            "add_lut: {} fan-ins is outside [1, {}]",
            fanins.len(),
            MAX_COVER_VARS
        );
        let truth = replicate_u64(truth, fanins.len());
        let cover = isop(truth, fanins.len());
        self.push_node(NodeKind::Lut {
            fanins: fanins.to_vec(),
            truth,
            cover,
        })
    }

    pub fn add_output(&mut self, name: impl Into<String>, operand: Operand) {
        self.node_mut(operand.node).fanout_count += 1;
        self.outputs.push(Output {
            name: name.into(),
            operand,
        });
    }

    fn is_output_driver(&self, node: NodeRef) -> bool {
        self.outputs.iter().any(|o| o.operand.node == node)
    }

    fn is_choice_member(&self, node: NodeRef) -> bool {
        let n = self.node(node);
        n.choice_repr.is_some() || n.next_choice.is_some()
    }

    /// Deletes `root` and, transitively, every fan-in whose fanout count drops
    /// to zero. Inputs, the constant, output drivers and choice class members
    /// are never deleted. Returns the number of nodes removed.
    pub fn delete_rec(&mut self, root: NodeRef) -> usize {
        assert_eq!(
            self.fanout_count(root),
            0,
            "delete_rec: node {} still has fan-outs",
            root
        );
        let mut deleted = 0;
        let mut worklist = vec![root];
        while let Some(current) = worklist.pop() {
            if !self.is_live(current) {
                continue;
            }
            {
                let n = self.node(current);
                if n.kind.is_terminal() || n.fanout_count != 0 {
                    continue;
                }
            }
            if self.is_output_driver(current) || self.is_choice_member(current) {
                continue;
            }
            let Some(node) = self.nodes[current.id].take() else {
                continue;
            };
            if let NodeKind::And2 { a, b } = node.kind {
                let key = if a <= b { (a, b) } else { (b, a) };
                if self.strash.get(&key) == Some(&current) {
                    self.strash.remove(&key);
                }
            }
            for f in node.kind.fanins() {
                let fanin = self.node_mut(f);
                fanin.fanout_count -= 1;
                if fanin.fanout_count == 0 {
                    worklist.push(f);
                }
            }
            deleted += 1;
        }
        log::trace!("delete_rec({}) removed {} nodes", root, deleted);
        deleted
    }

    /// Links `alt` into the choice class headed by `repr`. Both nodes must
    /// compute the same function with the same polarity, and `repr` must not
    /// lie in the fan-in cone of `alt`.
    pub fn add_choice(&mut self, repr: NodeRef, alt: NodeRef) {
        assert_ne!(repr, alt, "add_choice: node {} cannot be its own choice", repr);
        assert!(
            !self.in_fanin_cone(alt, repr),
            "add_choice: {} depends on its class head {}",
            alt,
            repr
        );
        assert!(
            self.node(repr).choice_repr.is_none(),
            "add_choice: {} is itself an alternative, not a class head",
            repr
        );
        assert!(
            !self.is_choice_member(alt),
            "add_choice: {} already belongs to a choice class",
            alt
        );
        let mut tail = repr;
        while let Some(next) = self.node(tail).next_choice {
            tail = next;
        }
        self.node_mut(tail).next_choice = Some(alt);
        self.node_mut(alt).choice_repr = Some(repr);
    }

    /// True if `target` is in the transitive fan-in of `node`. Only nodes with
    /// ids above `target` can reach it, so the walk stops below that id.
    fn in_fanin_cone(&self, node: NodeRef, target: NodeRef) -> bool {
        if node.id <= target.id {
            return false;
        }
        let mut seen = vec![false; node.id - target.id];
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            for f in self.fanins(current) {
                if f == target {
                    return true;
                }
                if f.id > target.id && !seen[f.id - target.id - 1] {
                    seen[f.id - target.id - 1] = true;
                    stack.push(f);
                }
            }
        }
        false
    }

    /// Returns the alternatives of the class headed by `repr`, excluding
    /// `repr` itself.
    pub fn choices(&self, repr: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut cur = self.node(repr).next_choice;
        while let Some(n) = cur {
            out.push(n);
            cur = self.node(n).next_choice;
        }
        out
    }

    pub fn choice_repr(&self, node: NodeRef) -> Option<NodeRef> {
        self.node(node).choice_repr
    }

    /// Starts a new traversal epoch; every node becomes unmarked.
    pub fn increment_trav_id(&mut self) {
        self.trav_epoch += 1;
    }

    pub fn set_trav_id_current(&mut self, node: NodeRef) {
        let epoch = self.trav_epoch;
        self.node_mut(node).trav_id = epoch;
    }

    pub fn is_trav_id_current(&self, node: NodeRef) -> bool {
        self.node(node).trav_id == self.trav_epoch
    }

    /// Evaluates `root` on 64 input patterns at once. `leaf_patterns` must
    /// provide a pattern for every input or cut leaf reached from `root`.
    pub fn eval_cone_words(&self, root: NodeRef, leaf_patterns: &[(NodeRef, u64)]) -> u64 {
        let mut values: AHashMap<NodeRef, u64> = leaf_patterns.iter().copied().collect();
        let mut stack = vec![root];
        while let Some(&current) = stack.last() {
            if values.contains_key(&current) {
                stack.pop();
                continue;
            }
            let node = self.node(current);
            let pending: Vec<NodeRef> = node
                .kind
                .fanins()
                .into_iter()
                .filter(|f| !values.contains_key(f))
                .collect();
            if !pending.is_empty() {
                stack.extend(pending);
                continue;
            }
            let value = match &node.kind {
                NodeKind::Const0 => 0,
                NodeKind::Input { name } => {
                    panic!("eval_cone_words: no pattern given for input '{}'", name)
                }
                NodeKind::And2 { a, b } => operand_word(&values, *a) & operand_word(&values, *b),
                NodeKind::Lut { fanins, truth, .. } => {
                    let words: Vec<u64> = fanins.iter().map(|f| values[f]).collect();
                    eval_lut_word(*truth, &words)
                }
            };
            values.insert(current, value);
            stack.pop();
        }
        values[&root]
    }

    /// Simulates every live node on 64 patterns, one word per input. The
    /// result is indexed by node id; deleted slots hold zero.
    pub fn simulate_nodes(&self, input_words: &[u64]) -> Vec<u64> {
        assert_eq!(
            input_words.len(),
            self.inputs.len(),
            "simulate_nodes: expected {} input words",
            self.inputs.len()
        );
        let mut values = vec![0u64; self.nodes.len()];
        for (input, w) in self.inputs.iter().zip(input_words) {
            values[input.id] = *w;
        }
        for (node_ref, node) in self.live_nodes() {
            values[node_ref.id] = match &node.kind {
                NodeKind::Const0 => 0,
                NodeKind::Input { .. } => values[node_ref.id],
                NodeKind::And2 { a, b } => {
                    let av = values[a.node.id] ^ if a.negated { u64::MAX } else { 0 };
                    let bv = values[b.node.id] ^ if b.negated { u64::MAX } else { 0 };
                    av & bv
                }
                NodeKind::Lut { fanins, truth, .. } => {
                    let words: Vec<u64> = fanins.iter().map(|f| values[f.id]).collect();
                    eval_lut_word(*truth, &words)
                }
            };
        }
        values
    }

    /// Simulates the network on 64 patterns and returns one word per output.
    pub fn simulate_words(&self, input_words: &[u64]) -> Vec<u64> {
        let values = self.simulate_nodes(input_words);
        self.outputs
            .iter()
            .map(|o| values[o.operand.node.id] ^ if o.operand.negated { u64::MAX } else { 0 })
            .collect()
    }

    /// Evaluates every output on a single input assignment.
    pub fn eval(&self, inputs: &[bool]) -> Vec<bool> {
        let words: Vec<u64> = inputs
            .iter()
            .map(|b| if *b { u64::MAX } else { 0 })
            .collect();
        self.simulate_words(&words)
            .into_iter()
            .map(|w| w & 1 != 0)
            .collect()
    }
}

fn operand_word(values: &AHashMap<NodeRef, u64>, op: Operand) -> u64 {
    let v = values[&op.node];
    if op.negated { !v } else { v }
}

/// Applies a LUT function bitwise to 64 patterns of its fan-ins.
pub fn eval_lut_word(truth: u64, fanin_words: &[u64]) -> u64 {
    let mut out = 0u64;
    for bit in 0..64 {
        let mut minterm = 0usize;
        for (j, w) in fanin_words.iter().enumerate() {
            minterm |= (((w >> bit) & 1) as usize) << j;
        }
        out |= ((truth >> minterm) & 1) << bit;
    }
    out
}
