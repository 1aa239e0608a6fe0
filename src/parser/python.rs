//! Python extraction using tree-sitter.
//!
//! Imports come from `import a.b` and `from x import y` statements anywhere in
//! the file, including deferred imports inside functions. Exports are the
//! public top-level definitions: functions, classes and simple assignments.
//! Names starting with `_` are private by convention and never exported.

use tree_sitter::{Node, Tree};

use super::types::{ExportSymbol, Extraction, ImportKind, RawImport, SymbolKind};
use super::{collect_identifiers, node_line, node_text, walk_tree, SourceExtractor};

/// Extractor for Python source files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonExtractor;

impl SourceExtractor for PythonExtractor {
    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    fn extract_tree(&self, tree: &Tree, source: &str) -> Extraction {
        let root = tree.root_node();
        let mut extraction = Extraction::default();

        walk_tree(root, |node| match node.kind() {
            "import_statement" => parse_import(&node, source, &mut extraction.imports),
            "import_from_statement" => {
                if let Some(import) = parse_from_import(&node, source) {
                    extraction.imports.push(import);
                }
            }
            _ => {}
        });

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            collect_definition(&child, source, &mut extraction.exports);
        }

        collect_identifiers(root, source, &["identifier"], &mut extraction.identifiers);
        extraction
    }
}

/// `import a.b, c as d` yields one raw import per dotted name.
fn parse_import(node: &Node<'_>, source: &str, imports: &mut Vec<RawImport>) {
    let line = node_line(node);
    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let module = match name.kind() {
            "aliased_import" => name
                .child_by_field_name("name")
                .and_then(|n| node_text(&n, source)),
            _ => node_text(&name, source),
        };
        if let Some(module) = module {
            imports.push(RawImport::new(module, ImportKind::PythonImport, line));
        }
    }
}

/// `from X import a, b` / `from . import a` / `from X import *`.
fn parse_from_import(node: &Node<'_>, source: &str) -> Option<RawImport> {
    let module_node = node.child_by_field_name("module_name")?;
    let module = node_text(&module_node, source)?;

    let mut import = RawImport::new(module, ImportKind::PythonFrom, node_line(node));

    let mut cursor = node.walk();
    for name in node.children_by_field_name("name", &mut cursor) {
        let imported = match name.kind() {
            "aliased_import" => name
                .child_by_field_name("name")
                .and_then(|n| node_text(&n, source)),
            _ => node_text(&name, source),
        };
        if let Some(imported) = imported {
            import.names.push(imported.to_string());
        }
    }

    let mut cursor = node.walk();
    if node
        .children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import")
    {
        import.wildcard = true;
    }

    Some(import)
}

fn collect_definition(node: &Node<'_>, source: &str, exports: &mut Vec<ExportSymbol>) {
    match node.kind() {
        "function_definition" => push_public(node, source, SymbolKind::Function, exports),
        "class_definition" => push_public(node, source, SymbolKind::Type, exports),
        "decorated_definition" => {
            if let Some(inner) = node.child_by_field_name("definition") {
                collect_definition(&inner, source, exports);
            }
        }
        "expression_statement" => {
            let Some(assignment) = node.named_child(0) else {
                return;
            };
            if assignment.kind() != "assignment" {
                return;
            }
            let Some(target) = assignment.child_by_field_name("left") else {
                return;
            };
            if target.kind() != "identifier" {
                return;
            }
            let Some(name) = node_text(&target, source) else {
                return;
            };
            if name.starts_with('_') {
                return;
            }
            let kind = if is_constant_name(name) {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            };
            exports.push(ExportSymbol::new(name, kind, node_line(&target)));
        }
        _ => {}
    }
}

fn push_public(node: &Node<'_>, source: &str, kind: SymbolKind, exports: &mut Vec<ExportSymbol>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let Some(name) = node_text(&name_node, source) else {
        return;
    };
    if name.starts_with('_') {
        return;
    }
    exports.push(ExportSymbol::new(name, kind, node_line(&name_node)));
}

fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
