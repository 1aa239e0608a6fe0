//! Graph-derived metrics and the aggregated report record.
//!
//! Every calculator here is a pure reader of a finished [`DependencyGraph`]
//! and iterates modules in canonical order, so ties always resolve to the
//! module with the smallest id.

use serde::Serialize;

use super::ImportEdge;
use crate::graph::{Cycle, DependencyGraph};
use crate::parser::SymbolKind;

/// Average and maximum distinct internal dependencies per module.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FanoutSummary {
    pub average: f64,
    pub max: usize,
    /// Module with the highest fanout; `None` when no module imports anything
    pub max_module: Option<String>,
}

/// Directory nesting below the project root.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DepthSummary {
    pub average: f64,
    pub max: usize,
}

/// Parent-directory hops across resolved relative imports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplexitySummary {
    pub average: f64,
    pub max: usize,
    /// Raw import text achieving the maximum
    pub max_import: Option<String>,
    /// Module containing that import
    pub max_module: Option<String>,
    /// Number of resolved relative imports the average is taken over
    pub relative_imports: usize,
}

/// Raw import-statement coupling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CouplingSummary {
    /// Mean import statements per module, internal and external
    pub average_efferent: f64,
    /// Most internal import statements targeting one module
    pub max_afferent: usize,
    pub max_afferent_module: Option<String>,
}

/// An exported symbol nothing in the project references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadExport {
    pub module: String,
    pub name: String,
    pub kind: SymbolKind,
    pub line: usize,
}

/// A file that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub path: String,
    pub message: String,
}

impl Warning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The metrics record handed to scoring and rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArchitectureMetrics {
    pub module_count: usize,
    pub edge_count: usize,
    pub external_import_count: usize,
    pub depth: DepthSummary,
    pub fanout: FanoutSummary,
    pub cycles: Vec<Cycle>,
    pub import_complexity: ComplexitySummary,
    pub coupling: CouplingSummary,
    pub dead_exports: Vec<DeadExport>,
    pub unreachable_modules: Vec<String>,
    pub warnings: Vec<Warning>,
}

impl ArchitectureMetrics {
    /// Returns true if no module was graphed.
    pub fn is_empty(&self) -> bool {
        self.module_count == 0
    }

    /// Rewrites every module path as `root/<path>`.
    pub fn prefixed(mut self, root: &str) -> Self {
        if root.is_empty() {
            return self;
        }
        let join = |path: &mut String| *path = format!("{root}/{path}");

        self.fanout.max_module.iter_mut().for_each(join);
        self.import_complexity.max_module.iter_mut().for_each(join);
        self.coupling.max_afferent_module.iter_mut().for_each(join);
        for cycle in &mut self.cycles {
            cycle.modules.iter_mut().for_each(join);
        }
        for dead in &mut self.dead_exports {
            join(&mut dead.module);
        }
        self.unreachable_modules.iter_mut().for_each(join);
        for warning in &mut self.warnings {
            join(&mut warning.path);
        }
        self
    }

    /// Folds another project's metrics into this one.
    ///
    /// Averages are weighted by module count (relative-import count for
    /// complexity); maxima keep the larger value, `self` winning ties; lists
    /// are appended.
    pub fn merge(mut self, other: Self) -> Self {
        let modules = self.module_count + other.module_count;
        let relatives =
            self.import_complexity.relative_imports + other.import_complexity.relative_imports;

        self.depth.average = weighted(
            self.depth.average,
            self.module_count,
            other.depth.average,
            other.module_count,
        );
        self.fanout.average = weighted(
            self.fanout.average,
            self.module_count,
            other.fanout.average,
            other.module_count,
        );
        self.coupling.average_efferent = weighted(
            self.coupling.average_efferent,
            self.module_count,
            other.coupling.average_efferent,
            other.module_count,
        );
        self.import_complexity.average = weighted(
            self.import_complexity.average,
            self.import_complexity.relative_imports,
            other.import_complexity.average,
            other.import_complexity.relative_imports,
        );

        self.depth.max = self.depth.max.max(other.depth.max);
        if other.fanout.max > self.fanout.max {
            self.fanout.max = other.fanout.max;
            self.fanout.max_module = other.fanout.max_module;
        }
        if other.import_complexity.max > self.import_complexity.max {
            self.import_complexity.max = other.import_complexity.max;
            self.import_complexity.max_import = other.import_complexity.max_import;
            self.import_complexity.max_module = other.import_complexity.max_module;
        }
        if other.coupling.max_afferent > self.coupling.max_afferent {
            self.coupling.max_afferent = other.coupling.max_afferent;
            self.coupling.max_afferent_module = other.coupling.max_afferent_module;
        }

        self.module_count = modules;
        self.import_complexity.relative_imports = relatives;
        self.edge_count += other.edge_count;
        self.external_import_count += other.external_import_count;
        self.cycles.extend(other.cycles);
        self.dead_exports.extend(other.dead_exports);
        self.unreachable_modules.extend(other.unreachable_modules);
        self.warnings.extend(other.warnings);
        self
    }
}

fn weighted(a: f64, a_weight: usize, b: f64, b_weight: usize) -> f64 {
    let total = a_weight + b_weight;
    if total == 0 {
        return 0.0;
    }
    (a * a_weight as f64 + b * b_weight as f64) / total as f64
}

fn mean(sum: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Average and maximum directory depth over all modules.
pub fn depth_summary(graph: &DependencyGraph) -> DepthSummary {
    let (sum, max) = graph
        .modules()
        .fold((0, 0), |(sum, max), m| (sum + m.depth, max.max(m.depth)));
    DepthSummary {
        average: mean(sum, graph.node_count()),
        max,
    }
}

/// Distinct outgoing internal edges per module.
pub fn fanout_summary(graph: &DependencyGraph) -> FanoutSummary {
    let mut summary = FanoutSummary::default();
    let mut total = 0;
    for module in graph.modules() {
        let fanout = graph.fanout(&module.id);
        total += fanout;
        if fanout > summary.max {
            summary.max = fanout;
            summary.max_module = Some(module.id.clone());
        }
    }
    summary.average = mean(total, graph.node_count());
    summary
}

/// Efferent and afferent raw-statement coupling.
pub fn coupling_summary(graph: &DependencyGraph) -> CouplingSummary {
    let mut summary = CouplingSummary::default();
    let mut efferent = 0;
    for module in graph.modules() {
        efferent += module.import_count;
        let afferent = graph.afferent(&module.id);
        if afferent > summary.max_afferent {
            summary.max_afferent = afferent;
            summary.max_afferent_module = Some(module.id.clone());
        }
    }
    summary.average_efferent = mean(efferent, graph.node_count());
    summary
}

/// Traversal hops over resolved relative imports, given `(module, edges)`
/// pairs in canonical module order.
pub fn complexity_summary<'a, I>(edges: I) -> ComplexitySummary
where
    I: IntoIterator<Item = (&'a str, &'a [ImportEdge])>,
{
    let mut summary = ComplexitySummary::default();
    let mut total = 0;
    for (module, module_edges) in edges {
        for edge in module_edges.iter().filter(|e| e.is_relative() && e.is_resolved()) {
            let hops = edge.traversal();
            total += hops;
            summary.relative_imports += 1;
            if hops > summary.max {
                summary.max = hops;
                summary.max_import = Some(edge.import.source.clone());
                summary.max_module = Some(module.to_string());
            }
        }
    }
    summary.average = mean(total, summary.relative_imports);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::parser::{ImportKind, Language, RawImport};
    use crate::resolver::Resolution;

    fn graph_of(modules: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let mut builder = GraphBuilder::new();
        for m in modules {
            builder.add_module(m, Language::Go);
        }
        for (from, to) in edges {
            builder.add_import(from, to);
        }
        builder.build()
    }

    fn relative(source: &str, traversal: usize) -> ImportEdge {
        ImportEdge {
            import: RawImport::new(source, ImportKind::ES6, 1),
            resolution: Resolution::Internal {
                module: "x.ts".into(),
                traversal,
            },
        }
    }

    #[test]
    fn test_empty_graph_is_zero_valued() {
        let graph = DependencyGraph::new();
        assert_eq!(depth_summary(&graph), DepthSummary::default());
        assert_eq!(fanout_summary(&graph), FanoutSummary::default());
        assert_eq!(coupling_summary(&graph), CouplingSummary::default());
    }

    #[test]
    fn test_depth_summary() {
        let graph = graph_of(&["main.go", "a/b/c/file.go", "a/x.go"], &[]);
        let depth = depth_summary(&graph);
        assert_eq!(depth.max, 3);
        assert!((depth.average - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_fanout_is_mean_of_distinct_targets() {
        let graph = graph_of(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "b"), ("a", "c"), ("b", "c"), ("d", "a")],
        );
        let fanout = fanout_summary(&graph);

        assert_eq!(fanout.max, 2);
        assert_eq!(fanout.max_module.as_deref(), Some("a"));
        assert!((fanout.average - (2.0 + 1.0 + 0.0 + 1.0) / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_fanout_tie_goes_to_smallest_id() {
        let graph = graph_of(&["b", "a", "c"], &[("b", "c"), ("a", "c")]);
        assert_eq!(fanout_summary(&graph).max_module.as_deref(), Some("a"));
    }

    #[test]
    fn test_coupling_counts_raw_statements() {
        let mut builder = GraphBuilder::new();
        builder.add_module("a", Language::Python);
        builder.add_module("b", Language::Python);
        builder.add_import("a", "b");
        builder.add_import("a", "b");
        builder.add_external("a");
        builder.add_external("b");
        let coupling = coupling_summary(&builder.build());

        assert!((coupling.average_efferent - 2.0).abs() < 1e-9);
        assert_eq!(coupling.max_afferent, 2);
        assert_eq!(coupling.max_afferent_module.as_deref(), Some("b"));
    }

    #[test]
    fn test_complexity_grows_with_parent_hops() {
        let shallow = [relative("./x", 0)];
        let deep = [relative("../../x", 2)];

        let a = complexity_summary([("a.ts", &shallow[..])]);
        let b = complexity_summary([("a.ts", &deep[..])]);
        assert!(b.average > a.average);
        assert_eq!(b.max_import.as_deref(), Some("../../x"));
    }

    #[test]
    fn test_complexity_ignores_external_and_absolute() {
        let edges = [
            relative("../x", 1),
            ImportEdge {
                import: RawImport::new("../missing", ImportKind::ES6, 2),
                resolution: Resolution::External,
            },
            ImportEdge {
                import: RawImport::new("@app/x", ImportKind::ES6, 3),
                resolution: Resolution::Internal {
                    module: "x.ts".into(),
                    traversal: 0,
                },
            },
        ];
        let summary = complexity_summary([("src/a.ts", &edges[..])]);

        assert_eq!(summary.relative_imports, 1);
        assert!((summary.average - 1.0).abs() < 1e-9);
        assert_eq!(summary.max_module.as_deref(), Some("src/a.ts"));
    }

    #[test]
    fn test_merge_weights_averages_and_keeps_maxima() {
        let a = ArchitectureMetrics {
            module_count: 1,
            depth: DepthSummary { average: 0.0, max: 0 },
            fanout: FanoutSummary {
                average: 3.0,
                max: 3,
                max_module: Some("main.go".into()),
            },
            ..Default::default()
        }
        .prefixed("svc");
        let b = ArchitectureMetrics {
            module_count: 3,
            depth: DepthSummary { average: 2.0, max: 4 },
            fanout: FanoutSummary {
                average: 1.0,
                max: 3,
                max_module: Some("index.ts".into()),
            },
            warnings: vec![Warning::new("bad.ts", "syntax error")],
            ..Default::default()
        }
        .prefixed("web");

        let merged = a.merge(b);
        assert_eq!(merged.module_count, 4);
        assert!((merged.depth.average - 1.5).abs() < 1e-9);
        assert_eq!(merged.depth.max, 4);
        assert!((merged.fanout.average - 1.5).abs() < 1e-9);
        assert_eq!(merged.fanout.max_module.as_deref(), Some("svc/main.go"));
        assert_eq!(merged.warnings[0].path, "web/bad.ts");
    }
}
