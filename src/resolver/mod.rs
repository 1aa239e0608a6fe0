//! Module resolution.
//!
//! Maps a raw import string plus the importing module to either a canonical
//! in-project module id or an external marker. Module ids are paths relative
//! to the project root with `/` separators.
//!
//! Resolution order:
//! 1. relative imports (`./x`, `../x`, Python `.x`) against the importer's directory
//! 2. absolute imports against the declared module root (go.mod, package.json,
//!    pyproject.toml) or, for Python, the root and `src/` layouts
//! 3. everything else is external; no error is ever raised
//!
//! # Example
//!
//! ```rust
//! use archnav::parser::{ImportKind, Language, RawImport};
//! use archnav::resolver::{ModuleResolver, ProjectManifest, Resolution};
//!
//! let resolver = ModuleResolver::new(
//!     ["src/app.ts", "src/util/index.ts"].map(String::from),
//!     ProjectManifest::new(""),
//! );
//! let import = RawImport::new("./util", ImportKind::ES6, 1);
//! assert_eq!(
//!     resolver.resolve(&import, "src/app.ts", Language::TypeScript),
//!     Resolution::Internal { module: "src/util/index.ts".into(), traversal: 0 },
//! );
//! ```

pub mod manifest;

use std::collections::{BTreeMap, BTreeSet};

use crate::parser::{Language, RawImport};

pub use manifest::{ManifestError, ProjectManifest, MANIFEST_FILES};

/// Extensions tried, in order, for extensionless ES-module imports.
const ECMASCRIPT_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".d.ts", ".js", ".jsx", ".mjs", ".cjs", ".mts", ".cts",
];

/// ESM-in-TypeScript writes the emitted extension; map it back to sources.
const EMITTED_EXTENSIONS: &[(&str, &[&str])] = &[
    (".js", &[".ts", ".tsx"]),
    (".jsx", &[".tsx"]),
    (".mjs", &[".mts"]),
    (".cjs", &[".cts"]),
];

const PYTHON_SOURCE_ROOTS: &[&str] = &["", "src"];

/// Outcome of resolving one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Points at a project module; `traversal` counts parent-directory hops.
    Internal { module: String, traversal: usize },
    /// Standard library, third-party package, or nothing we can find.
    External,
}

impl Resolution {
    pub fn is_internal(&self) -> bool {
        matches!(self, Resolution::Internal { .. })
    }

    pub fn module(&self) -> Option<&str> {
        match self {
            Resolution::Internal { module, .. } => Some(module),
            Resolution::External => None,
        }
    }
}

/// Resolves imports against a fixed set of project files.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    files: BTreeSet<String>,
    /// Go package directory -> member files, sorted
    go_packages: BTreeMap<String, Vec<String>>,
    manifest: ProjectManifest,
}

impl ModuleResolver {
    /// Creates a resolver over project-relative module paths.
    pub fn new(paths: impl IntoIterator<Item = String>, manifest: ProjectManifest) -> Self {
        let files: BTreeSet<String> = paths.into_iter().collect();
        let mut go_packages: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for file in files.iter().filter(|f| f.ends_with(".go")) {
            go_packages
                .entry(parent_dir(file).to_string())
                .or_default()
                .push(file.clone());
        }

        Self {
            files,
            go_packages,
            manifest,
        }
    }

    /// Returns true if `module` is a known project file.
    pub fn contains(&self, module: &str) -> bool {
        self.files.contains(module)
    }

    /// Resolve `import`, written in `importer`, to a module id.
    pub fn resolve(&self, import: &RawImport, importer: &str, language: Language) -> Resolution {
        let resolved = match language {
            Language::TypeScript | Language::JavaScript => self.resolve_ecmascript(import, importer),
            Language::Python => self.resolve_python(import, importer),
            Language::Go => self.resolve_go(import, importer),
        };
        resolved.unwrap_or(Resolution::External)
    }

    fn resolve_ecmascript(&self, import: &RawImport, importer: &str) -> Option<Resolution> {
        let spec = import.source.as_str();
        if import.is_relative() {
            let (base, traversal) = join_relative(parent_dir(importer), spec)?;
            let module = self.ecmascript_candidates(&base)?;
            return Some(Resolution::Internal { module, traversal });
        }

        let package = self.manifest.package_name.as_deref()?;
        let rest = strip_package_prefix(spec, package, '/')?;
        let module = self.ecmascript_candidates(rest)?;
        Some(Resolution::Internal {
            module,
            traversal: 0,
        })
    }

    fn ecmascript_candidates(&self, base: &str) -> Option<String> {
        if !base.is_empty() && self.files.contains(base) {
            return Some(base.to_string());
        }
        for ext in ECMASCRIPT_EXTENSIONS {
            let candidate = format!("{base}{ext}");
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }
        for (emitted, sources) in EMITTED_EXTENSIONS {
            if let Some(stem) = base.strip_suffix(emitted) {
                for ext in *sources {
                    let candidate = format!("{stem}{ext}");
                    if self.files.contains(&candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        let dir = if base.is_empty() {
            String::from("index")
        } else {
            format!("{base}/index")
        };
        ECMASCRIPT_EXTENSIONS
            .iter()
            .map(|ext| format!("{dir}{ext}"))
            .find(|candidate| self.files.contains(candidate))
    }

    fn resolve_python(&self, import: &RawImport, importer: &str) -> Option<Resolution> {
        let spec = import.source.as_str();
        if import.is_relative() {
            let dots = spec.chars().take_while(|&c| c == '.').count();
            let traversal = dots - 1;
            let mut dir = parent_dir(importer).to_string();
            for _ in 0..traversal {
                if dir.is_empty() {
                    return None;
                }
                dir = parent_dir(&dir).to_string();
            }
            let rest = &spec[dots..];
            let module = self.python_in_dir(&dir, rest, &import.names)?;
            return Some(Resolution::Internal { module, traversal });
        }

        let module = PYTHON_SOURCE_ROOTS
            .iter()
            .find_map(|root| self.python_in_dir(root, spec, &import.names))
            .or_else(|| {
                let package = self.manifest.python_package.as_deref()?;
                let rest = strip_package_prefix(spec, package, '.')?;
                self.python_in_dir("", rest, &import.names)
            })?;
        Some(Resolution::Internal {
            module,
            traversal: 0,
        })
    }

    /// Resolve dotted module `rest` under `dir`, falling back to the imported
    /// names as submodules (`from pkg import module`).
    fn python_in_dir(&self, dir: &str, rest: &str, names: &[String]) -> Option<String> {
        let base = join_dotted(dir, rest);
        if rest.is_empty() {
            // `from . import views`: the names are the modules.
            return self
                .python_submodule(&base, names)
                .or_else(|| self.python_module(&base, true));
        }
        self.python_module(&base, false)
            .or_else(|| self.python_submodule(&base, names))
    }

    fn python_module(&self, base: &str, package_only: bool) -> Option<String> {
        let init = join_path(base, "__init__.py");
        let mut candidates = Vec::with_capacity(3);
        if !package_only && !base.is_empty() {
            candidates.push(format!("{base}.py"));
            candidates.push(format!("{base}.pyi"));
        }
        candidates.push(init);
        candidates.into_iter().find(|c| self.files.contains(c))
    }

    fn python_submodule(&self, base: &str, names: &[String]) -> Option<String> {
        names.iter().find_map(|name| {
            let path = join_path(base, name);
            self.python_module(&path, false)
        })
    }

    fn resolve_go(&self, import: &RawImport, importer: &str) -> Option<Resolution> {
        let spec = import.source.as_str();
        if import.is_relative() {
            let (dir, traversal) = join_relative(parent_dir(importer), spec)?;
            let module = self.go_package_entry(&dir)?;
            return Some(Resolution::Internal { module, traversal });
        }

        let module_path = self.manifest.go_module.as_deref()?;
        let dir = strip_package_prefix(spec, module_path, '/')?;
        let module = self.go_package_entry(dir)?;
        Some(Resolution::Internal {
            module,
            traversal: 0,
        })
    }

    /// The file standing in for a Go package: the one named after its
    /// directory, otherwise the first in path order.
    fn go_package_entry(&self, dir: &str) -> Option<String> {
        let members = self.go_packages.get(dir)?;
        let dir_name = dir.rsplit('/').next().unwrap_or_default();
        members
            .iter()
            .find(|m| file_stem(m) == dir_name)
            .or_else(|| members.first())
            .cloned()
    }

    /// Every Go file in the same package directory as `module`.
    pub fn go_package_members(&self, module: &str) -> &[String] {
        self.go_packages
            .get(parent_dir(module))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Directory portion of a `/`-separated path (`""` at the root).
pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.split('.').next().unwrap_or(name)
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if name.is_empty() {
        dir.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn join_dotted(dir: &str, dotted: &str) -> String {
    join_path(dir, &dotted.replace('.', "/"))
}

/// `spec` equal to `package` or under `package<sep>`; returns the remainder as a path.
fn strip_package_prefix<'a>(spec: &'a str, package: &str, sep: char) -> Option<&'a str> {
    let rest = spec.strip_prefix(package)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix(sep)
}

/// Join a `./` or `../` import onto `dir`, counting parent hops.
///
/// Returns `None` when the import climbs above the project root.
pub fn join_relative(dir: &str, spec: &str) -> Option<(String, usize)> {
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    let mut traversal = 0;
    for part in spec.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                traversal += 1;
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some((segments.join("/"), traversal))
}
