//! Module dependency graph implementation using petgraph.
//!
//! Nodes are source modules keyed by their canonical project-relative path;
//! edges are resolved internal imports pointing from the importer to the
//! imported module. The graph is assembled by a [`GraphBuilder`] and is
//! read-only afterwards.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap};

use crate::parser::Language;

/// A source file represented as a graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Canonical id: path relative to the project root, `/`-separated
    pub id: String,
    /// Source language of the file
    pub language: Language,
    /// Directory segments between the project root and the file
    pub depth: usize,
    /// Raw import statements written in this module, internal and external
    pub import_count: usize,
    /// Raw import statements that resolved outside the project
    pub external_count: usize,
}

impl Module {
    /// Creates a module node with its depth derived from the id.
    ///
    /// # Example
    ///
    /// ```rust
    /// use archnav::graph::Module;
    /// use archnav::parser::Language;
    ///
    /// assert_eq!(Module::new("main.go", Language::Go).depth, 0);
    /// assert_eq!(Module::new("a/b/c/file.py", Language::Python).depth, 3);
    /// ```
    pub fn new(id: impl Into<String>, language: Language) -> Self {
        let id = id.into();
        let depth = directory_depth(&id);
        Self {
            id,
            language,
            depth,
            import_count: 0,
            external_count: 0,
        }
    }
}

/// Number of directories between the root and the file at `path`.
pub fn directory_depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count().saturating_sub(1)
}

/// A coalesced edge: every import statement from one module to another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Number of raw import statements folded into this edge
    pub imports: usize,
}

/// A directed graph of internal module dependencies.
///
/// Node indices follow canonical path order, so iterating the graph visits
/// modules sorted by id.
///
/// # Example
///
/// ```rust
/// use archnav::graph::GraphBuilder;
/// use archnav::parser::Language;
///
/// let mut builder = GraphBuilder::new();
/// builder.add_module("main.ts", Language::TypeScript);
/// builder.add_module("util.ts", Language::TypeScript);
/// builder.add_import("main.ts", "util.ts");
/// builder.add_import("main.ts", "util.ts");
///
/// let graph = builder.build();
/// assert_eq!(graph.edge_count(), 1);
/// assert_eq!(graph.afferent("util.ts"), 2);
/// assert_eq!(graph.fanout("main.ts"), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Module, DependencyEdge>,
    /// Maps module ids to their node indices for O(1) lookup
    node_indices: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn inner(&self) -> &DiGraph<Module, DependencyEdge> {
        &self.graph
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.node_indices.get(id).copied()
    }

    /// Gets a module by id.
    pub fn get_module(&self, id: &str) -> Option<&Module> {
        self.index_of(id).and_then(|idx| self.graph.node_weight(idx))
    }

    /// All modules in canonical path order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> + '_ {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Modules imported by `id`, sorted by id.
    pub fn dependencies(&self, id: &str) -> Vec<&Module> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Modules importing `id`, sorted by id.
    pub fn dependents(&self, id: &str) -> Vec<&Module> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&Module> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut indices: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        indices.sort();
        indices.dedup();
        indices.into_iter().map(|n| &self.graph[n]).collect()
    }

    /// Distinct internal modules `id` depends on.
    pub fn fanout(&self, id: &str) -> usize {
        self.index_of(id).map_or(0, |idx| self.graph.edges(idx).count())
    }

    /// Raw internal import statements targeting `id`.
    pub fn afferent(&self, id: &str) -> usize {
        self.index_of(id).map_or(0, |idx| {
            self.graph
                .edges_directed(idx, Direction::Incoming)
                .map(|e| e.weight().imports)
                .sum()
        })
    }

    /// Raw import statements written in `id`, internal and external.
    pub fn efferent(&self, id: &str) -> usize {
        self.get_module(id).map_or(0, |m| m.import_count)
    }

    /// Returns true if `id` imports itself.
    pub fn has_self_loop(&self, id: &str) -> bool {
        self.index_of(id)
            .is_some_and(|idx| self.graph.contains_edge(idx, idx))
    }

    /// Returns true if the graph has an edge from `from` to `to`.
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Some(a), Some(b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Sum of raw import statements that left the project.
    pub fn external_import_count(&self) -> usize {
        self.modules().map(|m| m.external_count).sum()
    }

    /// Returns the number of modules in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of coalesced edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if the graph has no modules.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns true if a module with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }
}

/// Accumulates modules and imports, then freezes them into a [`DependencyGraph`].
///
/// Insertion order does not matter: [`GraphBuilder::build`] lays nodes out in
/// canonical path order.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    modules: BTreeMap<String, Module>,
    edges: BTreeMap<(String, String), usize>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module. An existing module with the same id is left untouched.
    pub fn add_module(&mut self, id: &str, language: Language) {
        self.modules
            .entry(id.to_string())
            .or_insert_with(|| Module::new(id, language));
    }

    /// Records one internal import statement from `from` to `to`.
    ///
    /// Returns `false` if either module is unknown.
    pub fn add_import(&mut self, from: &str, to: &str) -> bool {
        if !self.modules.contains_key(to) {
            return false;
        }
        let Some(module) = self.modules.get_mut(from) else {
            return false;
        };
        module.import_count += 1;
        *self
            .edges
            .entry((from.to_string(), to.to_string()))
            .or_default() += 1;
        true
    }

    /// Records one import statement from `from` that resolved externally.
    pub fn add_external(&mut self, from: &str) -> bool {
        let Some(module) = self.modules.get_mut(from) else {
            return false;
        };
        module.import_count += 1;
        module.external_count += 1;
        true
    }

    /// Freezes the accumulated modules and edges.
    pub fn build(self) -> DependencyGraph {
        let mut graph = DiGraph::with_capacity(self.modules.len(), self.edges.len());
        let mut node_indices = HashMap::with_capacity(self.modules.len());

        for (id, module) in self.modules {
            let idx = graph.add_node(module);
            node_indices.insert(id, idx);
        }
        for ((from, to), imports) in self.edges {
            if let (Some(&a), Some(&b)) = (node_indices.get(&from), node_indices.get(&to)) {
                graph.add_edge(a, b, DependencyEdge { imports });
            }
        }

        DependencyGraph {
            graph,
            node_indices,
        }
    }
}
