//! Dead-export detection.
//!
//! Reachability starts from entry modules and walks import edges
//! breadth-first. Each visited module's outgoing imports are checked against
//! the target's export list: an export counts as referenced when the
//! importing file names it anywhere. Modules the seeded walk never reaches
//! are swept afterwards in canonical order so every import edge is scanned
//! exactly once.
//!
//! Entry detection is a heuristic. A root-level module nothing imports is
//! assumed to be invoked from outside the project, which can hide dead
//! exports in library entry files and flag exports used only by external
//! callers.

use std::collections::{BTreeSet, HashSet, VecDeque};

use tracing::debug;

use super::metrics::DeadExport;
use super::{AnalysisOptions, ModuleFacts, ProjectFacts};
use crate::graph::DependencyGraph;
use crate::parser::{ExportSymbol, Language};
use crate::resolver::ModuleResolver;

/// File names conventionally run directly rather than imported.
const CONVENTIONAL_ENTRIES: &[&str] = &[
    "main.go",
    "main.py",
    "__main__.py",
    "app.py",
    "manage.py",
    "index.ts",
    "index.js",
    "index.tsx",
    "index.jsx",
    "main.ts",
    "main.js",
    "server.ts",
    "server.js",
];

/// Outcome of the reachability sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadExportReport {
    pub dead_exports: Vec<DeadExport>,
    /// Modules no entry point reaches
    pub unreachable_modules: Vec<String>,
    /// Seed modules, sorted
    pub entry_points: Vec<String>,
}

/// Seed modules: configured entries, conventional executables and root-level
/// modules with no importer.
pub fn entry_points(graph: &DependencyGraph, configured: &[String]) -> Vec<String> {
    let mut seeds: BTreeSet<String> = configured
        .iter()
        .filter(|id| graph.contains(id))
        .cloned()
        .collect();

    for module in graph.modules() {
        let file_name = module.id.rsplit('/').next().unwrap_or(&module.id);
        let conventional = CONVENTIONAL_ENTRIES.contains(&file_name);
        let orphan_root = module.depth == 0
            && graph
                .dependents(&module.id)
                .iter()
                .all(|importer| importer.id == module.id);
        if conventional || orphan_root {
            seeds.insert(module.id.clone());
        }
    }

    seeds.into_iter().collect()
}

/// Find exports no importing module references.
pub fn find_dead_exports(
    graph: &DependencyGraph,
    facts: &ProjectFacts,
    resolver: &ModuleResolver,
    options: &AnalysisOptions,
) -> DeadExportReport {
    let seeds = entry_points(graph, &options.entry_points);

    let mut visited: HashSet<&str> = HashSet::with_capacity(graph.node_count());
    let mut order: Vec<&str> = Vec::with_capacity(graph.node_count());

    walk(graph, seeds.iter().map(String::as_str), &mut visited, &mut order);
    let reached = visited.len();
    let unreachable_modules: Vec<String> = graph
        .modules()
        .filter(|m| !visited.contains(m.id.as_str()))
        .map(|m| m.id.clone())
        .collect();
    for module in graph.modules() {
        walk(graph, std::iter::once(module.id.as_str()), &mut visited, &mut order);
    }

    let mut referenced: HashSet<(&str, &str)> = HashSet::new();
    for importer in &order {
        let Some(source) = facts.get(*importer) else {
            continue;
        };
        mark_referenced(source, facts, resolver, &mut referenced);
    }

    let seed_set: HashSet<&str> = seeds.iter().map(String::as_str).collect();
    let go_packages: BTreeSet<&str> = facts
        .values()
        .filter(|m| m.language == Language::Go)
        .map(|m| crate::resolver::parent_dir(&m.id))
        .collect();

    let mut dead_exports = Vec::new();
    for (id, module) in facts {
        if options.ignore_entry_exports && seed_set.contains(id.as_str()) {
            continue;
        }
        // A lone Go package has no other package to reference it.
        if module.language == Language::Go && go_packages.len() <= 1 {
            continue;
        }
        for export in &module.extraction.exports {
            if !referenced.contains(&(id.as_str(), export.name.as_str())) {
                dead_exports.push(DeadExport {
                    module: id.clone(),
                    name: export.name.clone(),
                    kind: export.kind,
                    line: export.line,
                });
            }
        }
    }

    debug!(
        entries = seeds.len(),
        reached,
        dead = dead_exports.len(),
        "Dead-export sweep finished"
    );

    DeadExportReport {
        dead_exports,
        unreachable_modules,
        entry_points: seeds,
    }
}

/// Breadth-first walk over outgoing edges, appending newly visited modules to `order`.
fn walk<'g>(
    graph: &'g DependencyGraph,
    starts: impl Iterator<Item = &'g str>,
    visited: &mut HashSet<&'g str>,
    order: &mut Vec<&'g str>,
) {
    let mut queue: VecDeque<&'g str> = VecDeque::new();
    for start in starts {
        if visited.insert(start) {
            queue.push_back(start);
        }
    }

    while let Some(id) = queue.pop_front() {
        order.push(id);
        for dep in graph.dependencies(id) {
            if visited.insert(dep.id.as_str()) {
                queue.push_back(dep.id.as_str());
            }
        }
    }
}

/// Mark every export of every module `importer` imports that `importer` names.
fn mark_referenced<'f>(
    importer: &ModuleFacts,
    facts: &'f ProjectFacts,
    resolver: &ModuleResolver,
    referenced: &mut HashSet<(&'f str, &'f str)>,
) {
    for edge in &importer.edges {
        let Some(target) = edge.target() else {
            continue;
        };
        for (module, export) in target_exports(target, facts, resolver) {
            let used = edge.import.wildcard
                || edge.import.names.iter().any(|n| n == &export.name)
                || importer.extraction.uses(&export.name);
            if used {
                referenced.insert((module, export.name.as_str()));
            }
        }
    }
}

/// Exports visible through an import of `target`. A Go import exposes the
/// whole package.
fn target_exports<'f>(
    target: &str,
    facts: &'f ProjectFacts,
    resolver: &ModuleResolver,
) -> Vec<(&'f str, &'f ExportSymbol)> {
    let members: Vec<&str> = match facts.get(target) {
        Some(m) if m.language == Language::Go => resolver
            .go_package_members(target)
            .iter()
            .map(String::as_str)
            .collect(),
        _ => vec![target],
    };

    members
        .into_iter()
        .filter_map(|id| facts.get_key_value(id))
        .flat_map(|(id, module)| {
            module
                .extraction
                .exports
                .iter()
                .map(move |export| (id.as_str(), export))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::build_facts;
    use crate::parser::SourceFile;
    use crate::resolver::ProjectManifest;

    fn run(files: &[SourceFile], manifest: ProjectManifest, options: &AnalysisOptions) -> DeadExportReport {
        let (facts, _) = build_facts(files);
        let resolver = ModuleResolver::new(facts.keys().cloned(), manifest);
        let (facts, graph) = crate::analysis::link(facts, &resolver);
        find_dead_exports(&graph, &facts, &resolver, options)
    }

    fn dead_names(report: &DeadExportReport) -> Vec<(String, String)> {
        report
            .dead_exports
            .iter()
            .map(|d| (d.module.clone(), d.name.clone()))
            .collect()
    }

    #[test]
    fn test_unreferenced_export_is_dead() {
        let files = [
            SourceFile::source("main.py", Language::Python, "from utils import used\nused()\n"),
            SourceFile::source("utils.py", Language::Python, "def used():\n    pass\n\ndef unused():\n    pass\n"),
        ];
        let report = run(&files, ProjectManifest::new(""), &AnalysisOptions::default());

        assert_eq!(
            dead_names(&report),
            vec![("utils.py".to_string(), "unused".to_string())]
        );
        assert!(report.entry_points.contains(&"main.py".to_string()));
    }

    #[test]
    fn test_export_used_through_cycle_is_referenced() {
        let files = [
            SourceFile::source("main.ts", Language::TypeScript, "import { a } from './a';\na();\n"),
            SourceFile::source(
                "a.ts",
                Language::TypeScript,
                "import { b } from './b';\nexport function a() { return b(); }\n",
            ),
            SourceFile::source(
                "b.ts",
                Language::TypeScript,
                "import { a } from './a';\nexport function b() { return a; }\n",
            ),
        ];
        let report = run(&files, ProjectManifest::new(""), &AnalysisOptions::default());
        assert!(report.dead_exports.is_empty());
    }

    #[test]
    fn test_namespace_import_checks_member_usage() {
        let files = [
            SourceFile::source(
                "main.ts",
                Language::TypeScript,
                "import * as lib from './lib';\nlib.one();\n",
            ),
            SourceFile::source(
                "lib.ts",
                Language::TypeScript,
                "export function one() {}\nexport function two() {}\n",
            ),
        ];
        let report = run(&files, ProjectManifest::new(""), &AnalysisOptions::default());
        assert_eq!(
            dead_names(&report),
            vec![("lib.ts".to_string(), "two".to_string())]
        );
    }

    #[test]
    fn test_wildcard_import_references_everything() {
        let files = [
            SourceFile::source("main.py", Language::Python, "from lib import *\n"),
            SourceFile::source("lib.py", Language::Python, "ONE = 1\nTWO = 2\n"),
        ];
        let report = run(&files, ProjectManifest::new(""), &AnalysisOptions::default());
        assert!(report.dead_exports.is_empty());
    }

    #[test]
    fn test_import_require_links_modules() {
        let files = [
            SourceFile::source(
                "main.ts",
                Language::TypeScript,
                "import lib = require('./lib');\nlib.one();\n",
            ),
            SourceFile::source(
                "lib.ts",
                Language::TypeScript,
                "export function one() {}\nexport function two() {}\n",
            ),
        ];
        let (facts, _) = build_facts(&files);
        let resolver = ModuleResolver::new(facts.keys().cloned(), ProjectManifest::new(""));
        let (facts, graph) = crate::analysis::link(facts, &resolver);

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge("main.ts", "lib.ts"));
        let report = find_dead_exports(&graph, &facts, &resolver, &AnalysisOptions::default());
        assert_eq!(
            dead_names(&report),
            vec![("lib.ts".to_string(), "two".to_string())]
        );
    }

    #[test]
    fn test_self_importing_root_module_is_entry() {
        let files = [
            SourceFile::source(
                "tool.py",
                Language::Python,
                "import tool\n\ndef run():\n    tool.run()\n",
            ),
            SourceFile::source("main.py", Language::Python, "print('hi')\n"),
        ];
        let report = run(&files, ProjectManifest::new(""), &AnalysisOptions::default());

        assert!(report.entry_points.contains(&"tool.py".to_string()));
        assert!(report.unreachable_modules.is_empty());
    }

    #[test]
    fn test_unreachable_modules_still_scanned() {
        let files = [
            SourceFile::source("main.py", Language::Python, "print('hi')\n"),
            SourceFile::source(
                "pkg/worker.py",
                Language::Python,
                "from pkg.jobs import run\nrun()\n",
            ),
            SourceFile::source("pkg/jobs.py", Language::Python, "def run():\n    pass\n"),
        ];
        let report = run(&files, ProjectManifest::new(""), &AnalysisOptions::default());

        assert_eq!(report.unreachable_modules, vec!["pkg/jobs.py", "pkg/worker.py"]);
        assert!(report.dead_exports.is_empty());
    }

    #[test]
    fn test_ignore_entry_exports() {
        let files = [SourceFile::source("main.py", Language::Python, "def cli():\n    pass\n")];

        let report = run(&files, ProjectManifest::new(""), &AnalysisOptions::default());
        assert_eq!(report.dead_exports.len(), 1);

        let options = AnalysisOptions {
            ignore_entry_exports: true,
            ..Default::default()
        };
        let report = run(&files, ProjectManifest::new(""), &options);
        assert!(report.dead_exports.is_empty());
    }

    #[test]
    fn test_configured_entry_point() {
        let files = [
            SourceFile::source("cli/run.py", Language::Python, "from lib.core import go\ngo()\n"),
            SourceFile::source("lib/core.py", Language::Python, "def go():\n    pass\n"),
        ];
        let options = AnalysisOptions {
            entry_points: vec!["cli/run.py".into()],
            ..Default::default()
        };
        let report = run(&files, ProjectManifest::new(""), &options);

        assert_eq!(report.entry_points, vec!["cli/run.py"]);
        assert!(report.unreachable_modules.is_empty());
    }

    #[test]
    fn test_go_package_exports_checked_package_wide() {
        let files = [
            SourceFile::source(
                "main.go",
                Language::Go,
                "package main\n\nimport \"example.com/app/lib\"\n\nfunc main() {\n    lib.ExportedUsed()\n}\n",
            ),
            SourceFile::source(
                "lib/lib.go",
                Language::Go,
                "package lib\n\nfunc ExportedUsed() string { return \"used\" }\n",
            ),
            SourceFile::source(
                "lib/extra.go",
                Language::Go,
                "package lib\n\nfunc ExportedUnused() {}\n\ntype UnusedType struct{}\n",
            ),
        ];
        let manifest = ProjectManifest::new("").with_go_module("example.com/app");
        let report = run(&files, manifest, &AnalysisOptions::default());

        assert_eq!(
            dead_names(&report),
            vec![
                ("lib/extra.go".to_string(), "ExportedUnused".to_string()),
                ("lib/extra.go".to_string(), "UnusedType".to_string()),
            ]
        );
    }

    #[test]
    fn test_single_go_package_reports_nothing() {
        let files = [SourceFile::source(
            "main.go",
            Language::Go,
            "package main\n\nfunc Helper() {}\n\nfunc main() {}\n",
        )];
        let report = run(&files, ProjectManifest::new(""), &AnalysisOptions::default());
        assert!(report.dead_exports.is_empty());
    }
}
