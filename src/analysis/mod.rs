//! Architectural analysis of a project's module graph.
//!
//! The pipeline for one project root:
//!
//! 1. extract every source file in parallel (a failure only drops that file)
//! 2. resolve each import against the set of successfully extracted files
//! 3. merge the per-file results into one [`DependencyGraph`]
//! 4. run cycle detection, fanout/depth and dead-export analysis concurrently
//!    over the frozen graph
//! 5. fold everything into an [`ArchitectureMetrics`] record
//!
//! Workspaces with several project roots get one independent graph per root;
//! the per-root metrics are merged afterwards.
//!
//! # Example
//!
//! ```rust
//! use archnav::analysis::{analyze_project, AnalysisOptions};
//! use archnav::parser::{Language, SourceFile};
//! use archnav::resolver::ProjectManifest;
//!
//! let files = vec![
//!     SourceFile::source("main.py", Language::Python, "from db import connect\nconnect()\n"),
//!     SourceFile::source("db.py", Language::Python, "def connect():\n    pass\n"),
//! ];
//! let metrics = analyze_project(&files, &ProjectManifest::new(""), &AnalysisOptions::default());
//!
//! assert_eq!(metrics.module_count, 2);
//! assert!(metrics.cycles.is_empty());
//! assert!(metrics.dead_exports.is_empty());
//! ```

pub mod dead_exports;
pub mod metrics;

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::graph::{DependencyGraph, GraphBuilder};
use crate::parser::{self, Extraction, FileClass, Language, RawImport, SourceFile};
use crate::resolver::{ModuleResolver, ProjectManifest, Resolution};

pub use dead_exports::{entry_points, find_dead_exports, DeadExportReport};
pub use metrics::{
    ArchitectureMetrics, ComplexitySummary, CouplingSummary, DeadExport, DepthSummary,
    FanoutSummary, Warning,
};

/// Knobs for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Extra entry modules, relative to the scan root
    pub entry_points: Vec<String>,
    /// Worker threads for extraction; 0 lets rayon decide
    pub workers: usize,
    /// Do not report unreferenced exports of entry modules
    pub ignore_entry_exports: bool,
}

/// One import statement together with where it resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdge {
    pub import: RawImport,
    pub resolution: Resolution,
}

impl ImportEdge {
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_internal()
    }

    pub fn is_relative(&self) -> bool {
        self.import.is_relative()
    }

    /// Parent-directory hops; 0 for non-relative or unresolved imports.
    pub fn traversal(&self) -> usize {
        match self.resolution {
            Resolution::Internal { traversal, .. } => traversal,
            Resolution::External => 0,
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.resolution.module()
    }
}

/// Everything known about one successfully extracted module.
#[derive(Debug, Clone)]
pub struct ModuleFacts {
    pub id: String,
    pub language: Language,
    pub extraction: Extraction,
    /// Resolved imports, in source order
    pub edges: Vec<ImportEdge>,
}

/// Per-module facts keyed by canonical id.
pub type ProjectFacts = BTreeMap<String, ModuleFacts>;

/// Analyze a single project. File paths are relative to the project root.
///
/// Never fails: unparseable files become warnings and an empty file set
/// yields zero-valued metrics.
pub fn analyze_project(
    files: &[SourceFile],
    manifest: &ProjectManifest,
    options: &AnalysisOptions,
) -> ArchitectureMetrics {
    with_pool(options.workers, || {
        let metrics = analyze_root(files, manifest, options);
        log_summary(&metrics);
        metrics
    })
}

/// Analyze a scan that may hold several project roots.
///
/// Each file belongs to the deepest manifest root containing it; the scan
/// root itself is always a root. Output paths are relative to the scan root.
pub fn analyze_workspace(
    files: &[SourceFile],
    manifests: &[ProjectManifest],
    options: &AnalysisOptions,
) -> ArchitectureMetrics {
    let mut roots: Vec<ProjectManifest> = manifests.to_vec();
    if !roots.iter().any(|m| m.root.is_empty()) {
        roots.push(ProjectManifest::new(""));
    }
    roots.sort_by(|a, b| a.root.cmp(&b.root));
    roots.dedup_by(|a, b| a.root == b.root);

    let root_names: Vec<&str> = roots.iter().map(|m| m.root.as_str()).collect();
    let mut groups: BTreeMap<&str, Vec<SourceFile>> = BTreeMap::new();
    for file in files {
        let root = owning_root(&file.rel_path, &root_names);
        let mut local = file.clone();
        local.rel_path = strip_root(&file.rel_path, root).to_string();
        groups.entry(root).or_default().push(local);
    }

    debug!(roots = groups.len(), "Grouped files by project root");

    with_pool(options.workers, || {
        let metrics = roots
            .iter()
            .filter_map(|manifest| {
                let files = groups.get(manifest.root.as_str())?;
                let scoped = AnalysisOptions {
                    entry_points: options
                        .entry_points
                        .iter()
                        .filter(|e| owning_root(e, &root_names) == manifest.root)
                        .map(|e| strip_root(e, &manifest.root).to_string())
                        .collect(),
                    ..options.clone()
                };
                Some(analyze_root(files, manifest, &scoped).prefixed(&manifest.root))
            })
            .reduce(ArchitectureMetrics::merge)
            .unwrap_or_default();
        log_summary(&metrics);
        metrics
    })
}

fn analyze_root(
    files: &[SourceFile],
    manifest: &ProjectManifest,
    options: &AnalysisOptions,
) -> ArchitectureMetrics {
    let (facts, warnings) = build_facts(files);
    if facts.is_empty() {
        return ArchitectureMetrics {
            warnings,
            ..Default::default()
        };
    }

    let resolver = ModuleResolver::new(facts.keys().cloned(), manifest.clone());
    let (facts, graph) = link(facts, &resolver);

    let (cycles, ((depth, fanout, coupling), dead)) = rayon::join(
        || graph.detect_cycles(),
        || {
            rayon::join(
                || {
                    (
                        metrics::depth_summary(&graph),
                        metrics::fanout_summary(&graph),
                        metrics::coupling_summary(&graph),
                    )
                },
                || find_dead_exports(&graph, &facts, &resolver, options),
            )
        },
    );
    let import_complexity = metrics::complexity_summary(
        facts
            .iter()
            .map(|(id, module)| (id.as_str(), module.edges.as_slice())),
    );

    ArchitectureMetrics {
        module_count: graph.node_count(),
        edge_count: graph.edge_count(),
        external_import_count: graph.external_import_count(),
        depth,
        fanout,
        cycles,
        import_complexity,
        coupling,
        dead_exports: dead.dead_exports,
        unreachable_modules: dead.unreachable_modules,
        warnings,
    }
}

/// Extract every source-classified file in parallel.
///
/// Files that fail to parse are reported as warnings and left out.
pub(crate) fn build_facts(files: &[SourceFile]) -> (ProjectFacts, Vec<Warning>) {
    let outcomes: Vec<_> = files
        .par_iter()
        .filter(|file| file.class == FileClass::Source)
        .map(|file| (file, parser::extract(file)))
        .collect();

    let mut facts = ProjectFacts::new();
    let mut warnings = Vec::new();
    for (file, outcome) in outcomes {
        match outcome {
            Ok(extraction) => {
                facts.insert(
                    file.rel_path.clone(),
                    ModuleFacts {
                        id: file.rel_path.clone(),
                        language: file.language,
                        extraction,
                        edges: Vec::new(),
                    },
                );
            }
            Err(err) => {
                warn!(path = %file.rel_path, "Skipping file: {}", err);
                warnings.push(Warning::new(&file.rel_path, err.to_string()));
            }
        }
    }
    warnings.sort_by(|a, b| a.path.cmp(&b.path));

    (facts, warnings)
}

/// Resolve every module's imports in parallel, then merge them into the graph.
pub(crate) fn link(facts: ProjectFacts, resolver: &ModuleResolver) -> (ProjectFacts, DependencyGraph) {
    let facts: ProjectFacts = facts
        .into_par_iter()
        .map(|(id, mut module)| {
            module.edges = module
                .extraction
                .imports
                .iter()
                .map(|import| ImportEdge {
                    resolution: resolver.resolve(import, &id, module.language),
                    import: import.clone(),
                })
                .collect();
            (id, module)
        })
        .collect();

    let mut builder = GraphBuilder::new();
    for (id, module) in &facts {
        builder.add_module(id, module.language);
    }
    for (id, module) in &facts {
        for edge in &module.edges {
            match edge.target() {
                Some(target) => builder.add_import(id, target),
                None => builder.add_external(id),
            };
        }
    }

    let graph = builder.build();
    debug!(
        modules = graph.node_count(),
        edges = graph.edge_count(),
        external = graph.external_import_count(),
        "Built dependency graph"
    );
    (facts, graph)
}

/// Run `op` on a dedicated pool of `workers` threads (0 = rayon default).
fn with_pool<T, F>(workers: usize, op: F) -> T
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(op),
        Err(err) => {
            warn!("Failed to build worker pool, using the global pool: {}", err);
            op()
        }
    }
}

fn log_summary(metrics: &ArchitectureMetrics) {
    info!(
        modules = metrics.module_count,
        edges = metrics.edge_count,
        cycles = metrics.cycles.len(),
        dead_exports = metrics.dead_exports.len(),
        warnings = metrics.warnings.len(),
        "Architecture analysis complete"
    );
}

/// The deepest root in `roots` containing `path`.
fn owning_root<'r>(path: &str, roots: &[&'r str]) -> &'r str {
    roots
        .iter()
        .copied()
        .filter(|root| root.is_empty() || path.starts_with(&format!("{root}/")))
        .max_by_key(|root| root.len())
        .unwrap_or("")
}

fn strip_root<'p>(path: &'p str, root: &str) -> &'p str {
    if root.is_empty() {
        return path;
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn py(path: &str, content: &str) -> SourceFile {
        SourceFile::source(path, Language::Python, content)
    }

    /// main -> {utils, routes}, routes -> models, models -> utils, utils -> routes
    fn cyclic_project() -> Vec<SourceFile> {
        vec![
            py("main.py", "import utils\nimport routes\n\nroutes.register()\nutils.helper()\n"),
            py("routes.py", "from models import User\n\ndef register():\n    return User()\n"),
            py(
                "models.py",
                "from utils import helper\n\nclass User:\n    def __init__(self):\n        self.name = helper()\n",
            ),
            py(
                "utils.py",
                "import routes\n\ndef helper():\n    return 'x'\n\ndef format_unused():\n    return routes\n",
            ),
        ]
    }

    fn analyze(files: &[SourceFile]) -> ArchitectureMetrics {
        analyze_project(files, &ProjectManifest::new(""), &AnalysisOptions::default())
    }

    #[test]
    fn test_end_to_end_cyclic_project() {
        let metrics = analyze(&cyclic_project());

        assert_eq!(metrics.module_count, 4);
        assert_eq!(metrics.cycles.len(), 1);
        assert_eq!(
            metrics.cycles[0].cycle_path(),
            "models.py -> utils.py -> routes.py -> models.py"
        );

        assert_eq!(metrics.fanout.max, 2);
        assert_eq!(metrics.fanout.max_module.as_deref(), Some("main.py"));
        assert!((metrics.fanout.average - 5.0 / 4.0).abs() < 1e-9);

        assert_eq!(metrics.depth.max, 0);
        assert_eq!(metrics.depth.average, 0.0);

        assert_eq!(metrics.dead_exports.len(), 1);
        assert_eq!(metrics.dead_exports[0].module, "utils.py");
        assert_eq!(metrics.dead_exports[0].name, "format_unused");
        assert!(metrics.unreachable_modules.is_empty());
        assert!(metrics.warnings.is_empty());
    }

    #[test]
    fn test_output_is_deterministic() {
        let mut reversed = cyclic_project();
        reversed.reverse();

        let first = serde_json::to_string(&analyze(&cyclic_project())).unwrap();
        let second = serde_json::to_string(&analyze(&reversed)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input_yields_zero_metrics() {
        let metrics = analyze(&[]);
        assert_eq!(metrics, ArchitectureMetrics::default());
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_parse_failure_is_a_warning() {
        let files = vec![
            py("main.py", "import broken\nimport ok\nok.run()\n"),
            py("broken.py", "def oops(:\n"),
            py("ok.py", "def run():\n    pass\n"),
            SourceFile::new("latin1.py", Language::Python, vec![0xff, 0xfe, b'\n'], FileClass::Source),
        ];
        let metrics = analyze(&files);

        assert_eq!(metrics.module_count, 2);
        assert_eq!(metrics.external_import_count, 1);
        let warned: Vec<_> = metrics.warnings.iter().map(|w| w.path.as_str()).collect();
        assert_eq!(warned, vec!["broken.py", "latin1.py"]);
    }

    #[test]
    fn test_self_import_is_trivial_cycle() {
        let files = vec![SourceFile::source(
            "index.ts",
            Language::TypeScript,
            "export * from './index';\nexport const x = 1;\n",
        )];
        let metrics = analyze(&files);

        assert_eq!(metrics.cycles.len(), 1);
        assert_eq!(metrics.cycles[0].modules, vec!["index.ts"]);
    }

    #[test]
    fn test_test_files_do_not_reference_exports() {
        let mut files = cyclic_project();
        files.push(SourceFile::new(
            "test_utils.py",
            Language::Python,
            "from utils import format_unused\n\ndef test_it():\n    format_unused()\n",
            FileClass::Test,
        ));
        let metrics = analyze(&files);

        assert_eq!(metrics.module_count, 4);
        assert_eq!(metrics.dead_exports.len(), 1);
        assert_eq!(metrics.dead_exports[0].name, "format_unused");
    }

    #[test]
    fn test_import_complexity() {
        let files = vec![
            SourceFile::source(
                "src/features/cart/view.ts",
                Language::TypeScript,
                "import { price } from '../../lib/money';\nimport { Row } from './row';\nimport React from 'react';\nprice(); Row();\n",
            ),
            SourceFile::source("src/features/cart/row.ts", Language::TypeScript, "export function Row() {}\n"),
            SourceFile::source("src/lib/money.ts", Language::TypeScript, "export function price() {}\n"),
        ];
        let metrics = analyze(&files);

        assert_eq!(metrics.import_complexity.relative_imports, 2);
        assert_eq!(metrics.import_complexity.max, 2);
        assert_eq!(metrics.import_complexity.max_import.as_deref(), Some("../../lib/money"));
        assert!((metrics.import_complexity.average - 1.0).abs() < 1e-9);
        assert_eq!(metrics.external_import_count, 1);
        assert_eq!(metrics.depth.max, 3);
    }

    #[test]
    fn test_workspace_roots_are_independent() {
        let files = vec![
            SourceFile::source(
                "svc/main.go",
                Language::Go,
                "package main\n\nimport \"example.com/svc/store\"\n\nfunc main() { store.Open() }\n",
            ),
            SourceFile::source(
                "svc/store/store.go",
                Language::Go,
                "package store\n\nfunc Open() {}\n\nfunc Close() {}\n",
            ),
            SourceFile::source("web/index.ts", Language::TypeScript, "import { a } from './a';\na();\n"),
            SourceFile::source(
                "web/a.ts",
                Language::TypeScript,
                "import { b } from './b';\nexport function a() { b(); }\n",
            ),
            SourceFile::source(
                "web/b.ts",
                Language::TypeScript,
                "import { a } from './a';\nexport function b() { a(); }\n",
            ),
            SourceFile::source("tools/gen.py", Language::Python, "import os\n"),
        ];
        let manifests = vec![
            ProjectManifest::new("svc").with_go_module("example.com/svc"),
            ProjectManifest::new("web").with_package_name("web"),
        ];
        let metrics = analyze_workspace(&files, &manifests, &AnalysisOptions::default());

        assert_eq!(metrics.module_count, 6);
        assert_eq!(metrics.edge_count, 4);
        assert_eq!(metrics.cycles.len(), 1);
        assert_eq!(metrics.cycles[0].modules, vec!["web/a.ts", "web/b.ts"]);

        let dead: Vec<_> = metrics
            .dead_exports
            .iter()
            .map(|d| format!("{}:{}", d.module, d.name))
            .collect();
        assert_eq!(dead, vec!["svc/store/store.go:Close"]);
        assert_eq!(metrics.unreachable_modules, vec!["tools/gen.py"]);
    }

    #[test]
    fn test_owning_root_prefers_deepest() {
        let roots = ["", "apps", "apps/web"];
        assert_eq!(owning_root("apps/web/src/a.ts", &roots), "apps/web");
        assert_eq!(owning_root("apps/api.ts", &roots), "apps");
        assert_eq!(owning_root("appsx/a.ts", &roots), "");
        assert_eq!(strip_root("apps/web/src/a.ts", "apps/web"), "src/a.ts");
    }
}
