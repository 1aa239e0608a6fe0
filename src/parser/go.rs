//! Go extraction using tree-sitter.
//!
//! Go exports are decided by capitalization: any package-level func, type,
//! const or var whose name starts with an upper-case letter. Methods hang off
//! their receiver type and are not tracked as separate exports.

use tree_sitter::{Node, Tree};

use super::types::{ExportSymbol, Extraction, ImportKind, RawImport, SymbolKind};
use super::{collect_identifiers, node_line, node_text, strip_quotes, walk_tree, SourceExtractor};

const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "type_identifier",
    "field_identifier",
    "package_identifier",
];

/// Extractor for Go source files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoExtractor;

impl SourceExtractor for GoExtractor {
    fn grammar(&self, _path: &str) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn extract_tree(&self, tree: &Tree, source: &str) -> Extraction {
        let root = tree.root_node();
        let mut extraction = Extraction::default();

        walk_tree(root, |node| {
            if node.kind() != "import_spec" {
                return;
            }
            let Some(path) = node
                .child_by_field_name("path")
                .and_then(|p| node_text(&p, source))
            else {
                return;
            };
            let mut import = RawImport::new(strip_quotes(path), ImportKind::GoImport, node_line(&node));
            // Dot imports pull every exported name into scope unqualified.
            if node
                .child_by_field_name("name")
                .is_some_and(|n| n.kind() == "dot")
            {
                import.wildcard = true;
            }
            extraction.imports.push(import);
        });

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "function_declaration" => {
                    push_exported(&child, source, SymbolKind::Function, &mut extraction.exports);
                }
                "type_declaration" => {
                    collect_specs(&child, source, SymbolKind::Type, &mut extraction.exports);
                }
                "const_declaration" => {
                    collect_specs(&child, source, SymbolKind::Constant, &mut extraction.exports);
                }
                "var_declaration" => {
                    collect_specs(&child, source, SymbolKind::Variable, &mut extraction.exports);
                }
                _ => {}
            }
        }

        collect_identifiers(root, source, IDENTIFIER_KINDS, &mut extraction.identifiers);
        extraction
    }
}

/// Walk `type_spec`/`const_spec`/`var_spec` children, descending only into spec lists.
fn collect_specs(node: &Node<'_>, source: &str, kind: SymbolKind, exports: &mut Vec<ExportSymbol>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "type_spec" | "type_alias" => push_exported(&child, source, kind, exports),
            "const_spec" | "var_spec" => {
                let mut inner = child.walk();
                for name in child.children_by_field_name("name", &mut inner) {
                    push_name(&name, source, kind, exports);
                }
            }
            "var_spec_list" | "const_spec_list" | "type_spec_list" => {
                collect_specs(&child, source, kind, exports);
            }
            _ => {}
        }
    }
}

fn push_exported(node: &Node<'_>, source: &str, kind: SymbolKind, exports: &mut Vec<ExportSymbol>) {
    if let Some(name) = node.child_by_field_name("name") {
        push_name(&name, source, kind, exports);
    }
}

fn push_name(name_node: &Node<'_>, source: &str, kind: SymbolKind, exports: &mut Vec<ExportSymbol>) {
    let Some(name) = node_text(name_node, source) else {
        return;
    };
    if !is_exported(name) || name == "main" || name == "init" {
        return;
    }
    exports.push(ExportSymbol::new(name, kind, node_line(name_node)));
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}
