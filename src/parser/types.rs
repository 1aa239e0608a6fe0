//! Shared types for source extraction.
//!
//! This module defines the records exchanged between discovery, the
//! per-language extractors and the module resolver.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Source language of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Python,
    TypeScript,
    JavaScript,
}

impl Language {
    /// Determine language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "go" => Some(Language::Go),
            "py" | "pyi" => Some(Language::Python),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Go => write!(f, "go"),
            Self::Python => write!(f, "python"),
            Self::TypeScript => write!(f, "typescript"),
            Self::JavaScript => write!(f, "javascript"),
        }
    }
}

/// Classification assigned by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileClass {
    #[default]
    Source,
    Test,
    Generated,
    Excluded,
}

impl fmt::Display for FileClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Test => write!(f, "test"),
            Self::Generated => write!(f, "generated"),
            Self::Excluded => write!(f, "excluded"),
        }
    }
}

/// A discovered file, already read into memory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated
    pub rel_path: String,
    pub language: Language,
    pub content: Vec<u8>,
    pub class: FileClass,
}

impl SourceFile {
    /// Creates an in-memory source record. Mostly useful in tests.
    pub fn new(
        rel_path: impl Into<String>,
        language: Language,
        content: impl Into<Vec<u8>>,
        class: FileClass,
    ) -> Self {
        let rel_path = rel_path.into();
        Self {
            path: PathBuf::from(&rel_path),
            rel_path,
            language,
            content: content.into(),
            class,
        }
    }

    /// Shorthand for a source-classified record.
    pub fn source(rel_path: impl Into<String>, language: Language, content: &str) -> Self {
        Self::new(rel_path, language, content.as_bytes().to_vec(), FileClass::Source)
    }
}

/// The syntactic form an import took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// ES6 import statement: `import ... from 'module'`
    ES6,
    /// CommonJS require: `const x = require('module')`
    CommonJS,
    /// Dynamic import: `import('module')`
    DynamicImport,
    /// Re-export: `export { x } from 'module'` / `export * from 'module'`
    ReExport,
    /// Python `import a.b`
    PythonImport,
    /// Python `from a import b`
    PythonFrom,
    /// Go `import "path"`
    GoImport,
}

/// One raw import statement, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    /// The import string (e.g. `./utils`, `..models`, `example.com/app/internal/db`)
    pub source: String,
    /// Names pulled in by the statement, when the syntax lists them
    pub names: Vec<String>,
    /// True for `import *` / `from x import *` / `export * from`
    pub wildcard: bool,
    pub kind: ImportKind,
    /// Line number in the source file (1-indexed)
    pub line: usize,
}

impl RawImport {
    pub fn new(source: impl Into<String>, kind: ImportKind, line: usize) -> Self {
        Self {
            source: source.into(),
            names: Vec::new(),
            wildcard: false,
            kind,
            line,
        }
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn wildcard(mut self) -> Self {
        self.wildcard = true;
        self
    }

    /// Returns true for `./` and `../` style imports and Python dotted-relative imports.
    pub fn is_relative(&self) -> bool {
        self.source.starts_with('.')
    }
}

/// Kind of exported declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Type,
    Variable,
    Constant,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Type => write!(f, "type"),
            Self::Variable => write!(f, "variable"),
            Self::Constant => write!(f, "constant"),
        }
    }
}

/// A named, exported declaration within a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSymbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Line number in the source file (1-indexed)
    pub line: usize,
}

impl ExportSymbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, line: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            line,
        }
    }
}

/// Everything one extractor pass yields for a file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Import statements in source order, duplicates preserved
    pub imports: Vec<RawImport>,
    /// Exported symbols in source order
    pub exports: Vec<ExportSymbol>,
    /// Every identifier token appearing in the file
    pub identifiers: BTreeSet<String>,
}

impl Extraction {
    /// Returns true if `name` appears anywhere in the file as an identifier.
    pub fn uses(&self, name: &str) -> bool {
        self.identifiers.contains(name)
    }
}
