// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::network::isop::Cover;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: usize,
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.id)
    }
}

/// A reference to a node together with an optional inversion on the edge.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Operand {
    pub node: NodeRef,
    pub negated: bool,
}

impl Operand {
    pub fn new(node: NodeRef, negated: bool) -> Self {
        Self { node, negated }
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        Self {
            node: self.node,
            negated: !self.negated,
        }
    }
}

impl From<NodeRef> for Operand {
    fn from(node: NodeRef) -> Self {
        Self {
            node,
            negated: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The constant-zero node; always node 0.
    Const0,
    Input {
        name: String,
    },
    And2 {
        a: Operand,
        b: Operand,
    },
    /// A K-input lookup table. Bit `m` of `truth` is the output value when
    /// fan-in `j` carries bit `j` of `m`.
    Lut {
        fanins: Vec<NodeRef>,
        truth: u64,
        cover: Cover,
    },
}

impl NodeKind {
    pub fn fanins(&self) -> Vec<NodeRef> {
        match self {
            NodeKind::Const0 | NodeKind::Input { .. } => vec![],
            NodeKind::And2 { a, b } => vec![a.node, b.node],
            NodeKind::Lut { fanins, .. } => fanins.clone(),
        }
    }

    pub fn is_and(&self) -> bool {
        matches!(self, NodeKind::And2 { .. })
    }

    pub fn is_lut(&self) -> bool {
        matches!(self, NodeKind::Lut { .. })
    }

    /// Inputs and the constant terminate every traversal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeKind::Const0 | NodeKind::Input { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub level: u32,
    pub(crate) fanout_count: u32,
    pub(crate) trav_id: u64,
    /// Next alternative in the choice class this node heads or belongs to.
    pub(crate) next_choice: Option<NodeRef>,
    /// Head of the choice class when this node is an alternative.
    pub(crate) choice_repr: Option<NodeRef>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, level: u32) -> Self {
        Self {
            kind,
            level,
            fanout_count: 0,
            trav_id: 0,
            next_choice: None,
            choice_repr: None,
        }
    }

    pub fn fanout_count(&self) -> u32 {
        self.fanout_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    pub operand: Operand,
}
