//! Topological analysis of a pipeline's wiring.
//!
//! Provides algorithms for:
//! - Reachability from the entry steps
//! - Cycle detection over forward edges

use crate::core::types::Identifier;
use crate::pipeline::properties::WiringEdge;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::{HashMap, HashSet};

/// Forward-edge graph over the steps of one pipeline.
///
/// Feedback edges and edges touching steps outside the pipeline are left
/// out; the latter are reported by the membership rule instead.
#[derive(Debug, Clone, Default)]
pub struct WiringGraph {
    graph: DiGraph<Identifier, ()>,
    node_indices: HashMap<Identifier, NodeIndex>,
}

impl WiringGraph {
    /// Build the graph of `steps` connected by the forward `edges`.
    pub fn build<'a>(steps: impl IntoIterator<Item = &'a Identifier>, edges: &[WiringEdge]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for step in steps {
            if !node_indices.contains_key(step) {
                let idx = graph.add_node(step.clone());
                node_indices.insert(step.clone(), idx);
            }
        }

        for edge in edges.iter().filter(|e| !e.feedback) {
            if let (Some(&from), Some(&to)) = (node_indices.get(&edge.from), node_indices.get(&edge.to)) {
                graph.update_edge(from, to, ());
            }
        }

        Self { graph, node_indices }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Steps reachable from any of `roots` (roots included).
    pub fn reachable_from(&self, roots: &[Identifier]) -> HashSet<Identifier> {
        let mut reachable = HashSet::new();
        for root in roots {
            let Some(&start) = self.node_indices.get(root) else {
                continue;
            };
            let mut bfs = Bfs::new(&self.graph, start);
            while let Some(nx) = bfs.next(&self.graph) {
                reachable.insert(self.graph[nx].clone());
            }
        }
        reachable
    }

    /// Every cycle of forward edges, as its member steps in step-list order.
    ///
    /// A cycle is a strongly connected component with more than one step, or
    /// a single step wired to itself.
    pub fn cycles(&self) -> Vec<Vec<Identifier>> {
        let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| match component.as_slice() {
                [single] => self.graph.contains_edge(*single, *single),
                members => members.len() > 1,
            })
            .map(|mut component| {
                component.sort();
                component
            })
            .collect();
        cycles.sort();
        cycles
            .into_iter()
            .map(|component| component.into_iter().map(|idx| self.graph[idx].clone()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<Identifier> {
        names.iter().map(|n| Identifier::new(*n)).collect()
    }

    #[test]
    fn test_reachability() {
        let steps = ids(&["a", "b", "c"]);
        let graph = WiringGraph::build(&steps, &[WiringEdge::forward("a", "b")]);
        let reachable = graph.reachable_from(&ids(&["a"]));
        assert!(reachable.contains("a"));
        assert!(reachable.contains("b"));
        assert!(!reachable.contains("c"));
    }

    #[test]
    fn test_cycle_detection_terminates() {
        let steps = ids(&["a", "b", "c"]);
        let graph = WiringGraph::build(
            &steps,
            &[
                WiringEdge::forward("a", "b"),
                WiringEdge::forward("b", "a"),
                WiringEdge::forward("c", "c"),
            ],
        );
        assert_eq!(graph.cycles(), vec![ids(&["a", "b"]), ids(&["c"])]);
        // reachability over a cycle still terminates
        assert_eq!(graph.reachable_from(&ids(&["a"])).len(), 2);
    }

    #[test]
    fn test_feedback_and_foreign_edges_ignored() {
        let steps = ids(&["a", "b"]);
        let graph = WiringGraph::build(
            &steps,
            &[
                WiringEdge::forward("a", "b"),
                WiringEdge::feedback("b", "a"),
                WiringEdge::forward("b", "elsewhere"),
            ],
        );
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.cycles().is_empty());
        assert_eq!(graph.node_count(), 2);
        assert!(!graph.reachable_from(&ids(&["b"])).contains("a"));
    }
}
