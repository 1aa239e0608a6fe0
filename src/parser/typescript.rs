//! Import/export extraction for TypeScript and JavaScript using tree-sitter.
//!
//! Handles ES6 `import` statements (default, named, namespace, side-effect),
//! `export ... from` re-exports, CommonJS `require()` and dynamic `import()`,
//! plus the named exports declared at the top level of a module.

use std::collections::BTreeSet;

use tree_sitter::{Node, Tree};

use super::types::{ExportSymbol, Extraction, ImportKind, RawImport, SymbolKind};
use super::{collect_identifiers, node_line, node_text, strip_quotes, walk_tree, SourceExtractor};

const IDENTIFIER_KINDS: &[&str] = &[
    "identifier",
    "property_identifier",
    "type_identifier",
    "shorthand_property_identifier",
    "shorthand_property_identifier_pattern",
];

/// Extractor for the ES-module family of languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcmaScriptExtractor {
    TypeScript,
    JavaScript,
}

impl SourceExtractor for EcmaScriptExtractor {
    fn grammar(&self, path: &str) -> tree_sitter::Language {
        match self {
            EcmaScriptExtractor::TypeScript if path.ends_with(".tsx") => {
                tree_sitter_typescript::LANGUAGE_TSX.into()
            }
            EcmaScriptExtractor::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            EcmaScriptExtractor::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    fn extract_tree(&self, tree: &Tree, source: &str) -> Extraction {
        let root = tree.root_node();
        let mut extraction = Extraction::default();

        walk_tree(root, |node| match node.kind() {
            "import_statement" => {
                if let Some(import) = parse_es6_import(&node, source) {
                    extraction.imports.push(import);
                }
            }
            "export_statement" => {
                if let Some(import) = parse_re_export(&node, source) {
                    extraction.imports.push(import);
                }
            }
            "call_expression" => {
                if let Some(import) = parse_require_or_dynamic_import(&node, source) {
                    extraction.imports.push(import);
                }
            }
            _ => {}
        });

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() == "export_statement" {
                collect_exports(&child, source, &mut extraction.exports);
            }
        }

        collect_identifiers(root, source, IDENTIFIER_KINDS, &mut extraction.identifiers);
        extraction
    }
}

/// Parse an ES6 import statement.
fn parse_es6_import(node: &Node<'_>, source: &str) -> Option<RawImport> {
    let Some(source_node) = node.child_by_field_name("source") else {
        return parse_import_require(node, source);
    };
    let module = strip_quotes(node_text(&source_node, source)?);
    if module.is_empty() {
        return None;
    }

    let mut import = RawImport::new(module, ImportKind::ES6, node_line(node));
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "import_clause" {
            parse_import_clause(&child, source, &mut import);
        }
    }
    Some(import)
}

/// Parse TypeScript's `import lib = require('./lib')`.
fn parse_import_require(node: &Node<'_>, source: &str) -> Option<RawImport> {
    let mut cursor = node.walk();
    let clause = node
        .children(&mut cursor)
        .find(|child| child.kind() == "import_require_clause")?;
    let literal = clause.child_by_field_name("source").or_else(|| {
        let mut inner = clause.walk();
        let found = clause
            .children(&mut inner)
            .find(|child| child.kind() == "string");
        found
    })?;
    let module = strip_quotes(node_text(&literal, source)?);
    if module.is_empty() {
        return None;
    }
    Some(RawImport::new(module, ImportKind::CommonJS, node_line(node)))
}

/// Parse the import clause (everything between 'import' and 'from').
fn parse_import_clause(node: &Node<'_>, source: &str, import: &mut RawImport) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            // import { foo, bar as baz } from 'module'
            "named_imports" => {
                let mut inner = child.walk();
                for spec in child.children(&mut inner) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    if let Some(name) = spec
                        .child_by_field_name("name")
                        .and_then(|n| node_text(&n, source))
                    {
                        import.names.push(name.to_string());
                    }
                }
            }
            _ => {}
        }
    }
}

/// Parse `export { a } from './x'` and `export * from './x'`.
fn parse_re_export(node: &Node<'_>, source: &str) -> Option<RawImport> {
    let source_node = node.child_by_field_name("source")?;
    let module = strip_quotes(node_text(&source_node, source)?);
    if module.is_empty() {
        return None;
    }

    let mut import = RawImport::new(module, ImportKind::ReExport, node_line(node));
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "*" | "namespace_export" => import.wildcard = true,
            "export_clause" => {
                for name in export_clause_names(&child, source) {
                    import.names.push(name.to_string());
                }
            }
            _ => {}
        }
    }
    Some(import)
}

/// Parse require() calls or dynamic import().
fn parse_require_or_dynamic_import(node: &Node<'_>, source: &str) -> Option<RawImport> {
    let func_node = node.child_by_field_name("function")?;
    let kind = match node_text(&func_node, source)? {
        "require" => ImportKind::CommonJS,
        "import" => ImportKind::DynamicImport,
        _ => return None,
    };

    let args_node = node.child_by_field_name("arguments")?;
    let mut cursor = args_node.walk();
    let literal = args_node
        .children(&mut cursor)
        .find(|child| child.kind() == "string")?;
    let module = strip_quotes(node_text(&literal, source)?);

    let mut import = RawImport::new(module, kind, node_line(node));
    if kind == ImportKind::CommonJS {
        import.names = destructured_names(node, source);
    }
    Some(import)
}

/// Names bound by `const { a, b } = require('...')`.
fn destructured_names(call_node: &Node<'_>, source: &str) -> Vec<String> {
    let Some(parent) = call_node.parent() else {
        return Vec::new();
    };
    if parent.kind() != "variable_declarator" {
        return Vec::new();
    }
    let Some(pattern) = parent.child_by_field_name("name") else {
        return Vec::new();
    };
    if pattern.kind() != "object_pattern" {
        return Vec::new();
    }

    let mut names = BTreeSet::new();
    let mut cursor = pattern.walk();
    for child in pattern.named_children(&mut cursor) {
        let key = match child.kind() {
            "shorthand_property_identifier_pattern" => Some(child),
            "pair_pattern" => child.child_by_field_name("key"),
            _ => None,
        };
        if let Some(text) = key.and_then(|k| node_text(&k, source)) {
            names.insert(text.to_string());
        }
    }
    names.into_iter().collect()
}

fn export_clause_names<'a>(clause: &Node<'_>, source: &'a str) -> Vec<&'a str> {
    let mut names = Vec::new();
    let mut cursor = clause.walk();
    for spec in clause.children(&mut cursor) {
        if spec.kind() != "export_specifier" {
            continue;
        }
        if let Some(name) = spec
            .child_by_field_name("name")
            .and_then(|n| node_text(&n, source))
        {
            names.push(name);
        }
    }
    names
}

/// Collect named exports declared by a top-level `export` statement.
fn collect_exports(node: &Node<'_>, source: &str, exports: &mut Vec<ExportSymbol>) {
    // Re-exports forward another module's symbols; they are imports here.
    if node.child_by_field_name("source").is_some() {
        return;
    }

    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    if children.iter().any(|c| c.kind() == "default") {
        return;
    }

    for child in children {
        match child.kind() {
            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                push_named(&child, source, SymbolKind::Function, exports);
            }
            "class_declaration"
            | "abstract_class_declaration"
            | "interface_declaration"
            | "type_alias_declaration"
            | "enum_declaration" => {
                push_named(&child, source, SymbolKind::Type, exports);
            }
            "lexical_declaration" | "variable_declaration" => {
                let kind = match child.child(0).and_then(|k| node_text(&k, source)) {
                    Some("const") => SymbolKind::Constant,
                    _ => SymbolKind::Variable,
                };
                let mut inner = child.walk();
                for declarator in child.children(&mut inner) {
                    if declarator.kind() == "variable_declarator" {
                        push_named(&declarator, source, kind, exports);
                    }
                }
            }
            "export_clause" => {
                let mut inner = child.walk();
                for spec in child.children(&mut inner) {
                    if spec.kind() == "export_specifier" {
                        push_named(&spec, source, SymbolKind::Variable, exports);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_named(node: &Node<'_>, source: &str, kind: SymbolKind, exports: &mut Vec<ExportSymbol>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    // Destructured declarations have no single name.
    if !matches!(
        name_node.kind(),
        "identifier" | "type_identifier" | "property_identifier"
    ) {
        return;
    }
    if let Some(name) = node_text(&name_node, source) {
        exports.push(ExportSymbol::new(name, kind, node_line(&name_node)));
    }
}
