//! Cycle detection over the module graph.
//!
//! Runs Tarjan's SCC algorithm once. Every component with more than one
//! module, and every module importing itself, is one [`Cycle`]. Output order
//! depends only on module ids, never on traversal start.

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use serde::Serialize;
use std::collections::HashSet;

use super::DependencyGraph;

/// A circular dependency between modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    /// Modules in the cycle, starting at the smallest id, each listed once.
    /// For a simple cycle each module imports the next and the last imports
    /// the first; a denser component is only listed in a stable order.
    pub modules: Vec<String>,
}

impl Cycle {
    /// The cycle with its first module repeated at the end.
    pub fn closed_path(&self) -> Vec<String> {
        let mut path = self.modules.clone();
        if let Some(first) = self.modules.first() {
            path.push(first.clone());
        }
        path
    }

    /// Returns a formatted string representation of the cycle path.
    ///
    /// For example: "a -> b -> c -> a"
    pub fn cycle_path(&self) -> String {
        self.closed_path().join(" -> ")
    }

    /// Returns the number of modules in the cycle.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if the cycle is empty (should not happen in practice).
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn is_self_loop(&self) -> bool {
        self.modules.len() == 1
    }
}

impl DependencyGraph {
    /// Detects every cycle in the graph, sorted by first module.
    ///
    /// # Example
    ///
    /// ```rust
    /// use archnav::graph::GraphBuilder;
    /// use archnav::parser::Language;
    ///
    /// let mut builder = GraphBuilder::new();
    /// for id in ["a.py", "b.py", "c.py"] {
    ///     builder.add_module(id, Language::Python);
    /// }
    /// builder.add_import("b.py", "c.py");
    /// builder.add_import("c.py", "a.py");
    /// builder.add_import("a.py", "b.py");
    ///
    /// let cycles = builder.build().detect_cycles();
    /// assert_eq!(cycles.len(), 1);
    /// assert_eq!(cycles[0].cycle_path(), "a.py -> b.py -> c.py -> a.py");
    /// ```
    pub fn detect_cycles(&self) -> Vec<Cycle> {
        let graph = self.inner();
        let mut cycles: Vec<Cycle> = tarjan_scc(graph)
            .into_iter()
            .filter(|scc| match scc.as_slice() {
                [single] => graph.contains_edge(*single, *single),
                _ => true,
            })
            .map(|scc| Cycle {
                modules: self.order_component(&scc),
            })
            .collect();

        cycles.sort_by(|a, b| a.modules.cmp(&b.modules));
        cycles
    }

    /// Returns true if any module participates in a cycle.
    pub fn has_cycles(&self) -> bool {
        !self.detect_cycles().is_empty()
    }

    /// List the component's members in depth-first preorder from its
    /// smallest module, visiting successors in id order. The result is a
    /// stable listing of the component, not an edge path: consecutive
    /// entries need not be connected when the component is not a simple cycle.
    fn order_component(&self, scc: &[NodeIndex]) -> Vec<String> {
        let graph = self.inner();
        let members: HashSet<NodeIndex> = scc.iter().copied().collect();
        let Some(&start) = scc.iter().min() else {
            return Vec::new();
        };

        let mut visited = HashSet::with_capacity(scc.len());
        let mut order = Vec::with_capacity(scc.len());
        let mut stack = vec![start];

        while let Some(idx) = stack.pop() {
            if !visited.insert(idx) {
                continue;
            }
            order.push(graph[idx].id.clone());

            let mut next: Vec<NodeIndex> = graph
                .neighbors(idx)
                .filter(|n| members.contains(n) && !visited.contains(n))
                .collect();
            next.sort();
            next.dedup();
            // Reverse so the smallest successor is popped first.
            stack.extend(next.into_iter().rev());
        }

        order
    }
}
