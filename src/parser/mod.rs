//! Per-language import/export extraction.
//!
//! Every supported language implements [`SourceExtractor`] against its own
//! tree-sitter grammar. The extractor is picked by language tag through
//! [`extractor_for`], so callers never branch on the language themselves.
//!
//! # Example
//!
//! ```rust
//! use archnav::parser::{extract, Language, SourceFile};
//!
//! let file = SourceFile::source("app.py", Language::Python, "from utils import helper\n");
//! let extraction = extract(&file).unwrap();
//! assert_eq!(extraction.imports[0].source, "utils");
//! ```

pub mod go;
pub mod python;
pub mod types;
pub mod typescript;

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

pub use go::GoExtractor;
pub use python::PythonExtractor;
pub use types::{
    ExportSymbol, Extraction, FileClass, ImportKind, Language, RawImport, SourceFile, SymbolKind,
};
pub use typescript::EcmaScriptExtractor;

/// Errors that can occur while extracting a single file.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("File is not valid UTF-8: {path}")]
    Encoding { path: String },

    #[error("Failed to parse file: {path}")]
    ParseError { path: String },

    #[error("Syntax error in {path} at line {line}")]
    SyntaxError { path: String, line: usize },

    #[error("Tree-sitter language initialization failed")]
    LanguageInit,
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// The extraction capability shared by every language.
pub trait SourceExtractor: Send + Sync {
    /// Grammar used for the file at `path`.
    fn grammar(&self, path: &str) -> tree_sitter::Language;

    /// Pull imports, exports and identifier usage out of a parsed tree.
    fn extract_tree(&self, tree: &Tree, source: &str) -> Extraction;

    /// Parse `source` and extract from it.
    ///
    /// A tree containing syntax errors is rejected as a whole: the caller
    /// drops the file from the graph instead of trusting a partial parse.
    fn extract(&self, source: &str, path: &str) -> ExtractResult<Extraction> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.grammar(path))
            .map_err(|_| ExtractError::LanguageInit)?;

        let tree = parser.parse(source, None).ok_or_else(|| ExtractError::ParseError {
            path: path.to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(ExtractError::SyntaxError {
                path: path.to_string(),
                line: first_error_line(root),
            });
        }

        Ok(self.extract_tree(&tree, source))
    }
}

static GO: GoExtractor = GoExtractor;
static PYTHON: PythonExtractor = PythonExtractor;
static TYPESCRIPT: EcmaScriptExtractor = EcmaScriptExtractor::TypeScript;
static JAVASCRIPT: EcmaScriptExtractor = EcmaScriptExtractor::JavaScript;

/// Returns the extractor for a language tag.
pub fn extractor_for(language: Language) -> &'static dyn SourceExtractor {
    match language {
        Language::Go => &GO,
        Language::Python => &PYTHON,
        Language::TypeScript => &TYPESCRIPT,
        Language::JavaScript => &JAVASCRIPT,
    }
}

/// Extract a discovered file using the extractor for its language.
pub fn extract(file: &SourceFile) -> ExtractResult<Extraction> {
    let source = std::str::from_utf8(&file.content).map_err(|_| ExtractError::Encoding {
        path: file.rel_path.clone(),
    })?;
    extractor_for(file.language).extract(source, &file.rel_path)
}

/// Depth-first pre-order walk over every node under `root`.
pub(crate) fn walk_tree<'a>(root: Node<'a>, mut visit: impl FnMut(Node<'a>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Collect the text of every node whose kind is in `kinds`.
pub(crate) fn collect_identifiers(
    root: Node<'_>,
    source: &str,
    kinds: &[&str],
    out: &mut std::collections::BTreeSet<String>,
) {
    walk_tree(root, |node| {
        if kinds.contains(&node.kind()) {
            if let Some(text) = node_text(&node, source) {
                out.insert(text.to_string());
            }
        }
    });
}

/// Extract the text content of a node.
pub(crate) fn node_text<'a>(node: &Node<'_>, source: &'a str) -> Option<&'a str> {
    source.get(node.start_byte()..node.end_byte())
}

/// 1-indexed line of a node.
pub(crate) fn node_line(node: &Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Remove surrounding quotes (single, double, or backticks).
pub(crate) fn strip_quotes(text: &str) -> &str {
    text.trim_start_matches(['"', '\'', '`'])
        .trim_end_matches(['"', '\'', '`'])
}

fn first_error_line(root: Node<'_>) -> usize {
    let mut line = None;
    walk_tree(root, |node| {
        if line.is_none() && (node.is_error() || node.is_missing()) {
            line = Some(node_line(&node));
        }
    });
    line.unwrap_or(1)
}
