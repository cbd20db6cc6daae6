// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;

use crate::network::{Network, NodeRef};

impl Network {
    /// Returns all live nodes with fan-ins before fan-outs, computed with
    /// Kahn's algorithm. Panics if the live graph is not acyclic or refers to
    /// a deleted node.
    pub fn topo_order(&self) -> Vec<NodeRef> {
        let capacity = self.node_capacity();
        let mut indegree = vec![0usize; capacity];
        let mut parents: Vec<Vec<usize>> = vec![Vec::new(); capacity];
        let mut live = 0;
        for (node_ref, node) in self.live_nodes() {
            live += 1;
            for f in node.kind.fanins() {
                assert!(
                    self.is_live(f),
                    "topo_order: node {} has deleted fan-in {}",
                    node_ref,
                    f
                );
                indegree[node_ref.id] += 1;
                parents[f.id].push(node_ref.id);
            }
        }
        let mut queue: VecDeque<usize> = self
            .live_nodes()
            .filter(|(r, _)| indegree[r.id] == 0)
            .map(|(r, _)| r.id)
            .collect();
        let mut order = Vec::with_capacity(live);
        while let Some(id) = queue.pop_front() {
            order.push(NodeRef { id });
            for &parent in &parents[id] {
                indegree[parent] -= 1;
                if indegree[parent] == 0 {
                    queue.push_back(parent);
                }
            }
        }
        assert_eq!(
            order.len(),
            live,
            "topo_order: visited {} of {} live nodes; the network has a cycle",
            order.len(),
            live
        );
        order
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::setup_simple_graph;

    #[test]
    fn test_topo_order_places_fanins_first() {
        let g = setup_simple_graph();
        let order = g.net.topo_order();
        assert_eq!(order.len(), g.net.live_node_count());
        let pos = |id: usize| order.iter().position(|r| r.id == id).unwrap();
        for (node_ref, node) in g.net.live_nodes() {
            for f in node.kind.fanins() {
                assert!(pos(f.id) < pos(node_ref.id));
            }
        }
    }
}
