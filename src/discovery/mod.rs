//! File discovery and classification.
//!
//! Walks a scan root with `walkdir`, reads every file in a supported
//! language into a [`SourceFile`] record and classifies it as source, test,
//! generated or excluded. Directories holding a project manifest become
//! project roots for the analysis.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::DiscoveryConfig;
use crate::parser::{FileClass, Language, SourceFile};
use crate::resolver::{ProjectManifest, MANIFEST_FILES};

/// Errors that abort discovery as a whole.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Cannot read scan root {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Everything found under a scan root.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Files in a supported language, sorted by relative path
    pub files: Vec<SourceFile>,
    /// Project roots, sorted by root path; the scan root is always present
    pub manifests: Vec<ProjectManifest>,
}

impl Discovery {
    /// Number of files of the given class.
    pub fn count(&self, class: FileClass) -> usize {
        self.files.iter().filter(|f| f.class == class).count()
    }
}

/// Walk `root` and collect classified source files and project manifests.
pub fn discover(root: &Path, config: &DiscoveryConfig) -> Result<Discovery, DiscoveryError> {
    let metadata = fs::metadata(root).map_err(|source| DiscoveryError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let mut manifests: BTreeMap<String, ProjectManifest> = BTreeMap::new();
    manifests.insert(String::new(), ProjectManifest::new(""));

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e, &config.skip_dirs));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("Skipping entry: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let rel_path = relative_path(root, path);
        let file_name = entry.file_name().to_string_lossy();

        if MANIFEST_FILES.contains(&file_name.as_ref()) {
            let dir = parent_of(&rel_path);
            let manifest = manifests
                .entry(dir.to_string())
                .or_insert_with(|| ProjectManifest::new(dir));
            apply_manifest(manifest, path, &file_name);
            continue;
        }

        let Some(language) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Language::from_extension)
        else {
            continue;
        };

        if let Some(file) = read_source(path, rel_path, language, config.max_file_bytes) {
            files.push(file);
        }
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    debug!(
        files = files.len(),
        roots = manifests.len(),
        "Discovery finished for {}",
        root.display()
    );

    Ok(Discovery {
        files,
        manifests: manifests.into_values().collect(),
    })
}

fn read_source(path: &Path, rel_path: String, language: Language, max_bytes: u64) -> Option<SourceFile> {
    let size = match fs::metadata(path) {
        Ok(m) => m.len(),
        Err(err) => {
            warn!(path = %rel_path, "Failed to stat file: {}", err);
            return None;
        }
    };
    if size > max_bytes {
        debug!(path = %rel_path, size, "File exceeds size limit");
        let mut file = SourceFile::new(rel_path, language, Vec::new(), FileClass::Excluded);
        file.path = path.to_path_buf();
        return Some(file);
    }

    let content = match fs::read(path) {
        Ok(c) => c,
        Err(err) => {
            warn!(path = %rel_path, "Failed to read file: {}", err);
            return None;
        }
    };
    let class = classify(&rel_path, language, &content);
    let mut file = SourceFile::new(rel_path, language, content, class);
    file.path = path.to_path_buf();
    Some(file)
}

fn apply_manifest(manifest: &mut ProjectManifest, path: &Path, file_name: &str) {
    let mut parse = |content: &str| match file_name {
        "go.mod" => {
            manifest.apply_go_mod(content);
            Ok(())
        }
        "package.json" => manifest.apply_package_json(content),
        "pyproject.toml" => manifest.apply_pyproject(content),
        _ => Ok(()),
    };

    match fs::read_to_string(path) {
        Ok(content) => {
            if let Err(err) = parse(&content) {
                warn!(path = %path.display(), "Ignoring manifest: {}", err);
            }
        }
        Err(err) => warn!(path = %path.display(), "Failed to read manifest: {}", err),
    }
}

/// Decide how the engine treats a file.
pub fn classify(rel_path: &str, language: Language, content: &[u8]) -> FileClass {
    let file_name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    let dirs: Vec<&str> = rel_path.split('/').collect();
    let dirs = &dirs[..dirs.len().saturating_sub(1)];

    if dirs.contains(&"vendor") {
        return FileClass::Excluded;
    }

    match language {
        Language::Go => {
            if file_name.starts_with('_') || file_name.starts_with('.') {
                FileClass::Excluded
            } else if file_name.ends_with("_test.go") {
                FileClass::Test
            } else if is_generated_go(content) {
                FileClass::Generated
            } else {
                FileClass::Source
            }
        }
        Language::Python => {
            let is_test = (file_name.starts_with("test_") && file_name.ends_with(".py"))
                || file_name.ends_with("_test.py")
                || file_name == "conftest.py";
            if is_test {
                FileClass::Test
            } else {
                FileClass::Source
            }
        }
        Language::TypeScript | Language::JavaScript => {
            let is_test = file_name.contains(".test.")
                || file_name.contains(".spec.")
                || dirs.contains(&"__tests__");
            if is_test {
                FileClass::Test
            } else {
                FileClass::Source
            }
        }
    }
}

/// `// Code generated ... DO NOT EDIT.` above the package clause.
fn is_generated_go(content: &[u8]) -> bool {
    let text = String::from_utf8_lossy(content);
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with("package ") {
            return false;
        }
        if line.starts_with("// Code generated") && line.contains("DO NOT EDIT") {
            return true;
        }
    }
    false
}

/// Check if a directory should be skipped during traversal.
fn is_skipped_dir(entry: &DirEntry, skip_dirs: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || skip_dirs.iter().any(|d| d == name.as_ref())
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn parent_of(rel_path: &str) -> &str {
    rel_path.rfind('/').map_or("", |idx| &rel_path[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_classify_go() {
        assert_eq!(classify("pkg/db.go", Language::Go, b"package db\n"), FileClass::Source);
        assert_eq!(classify("pkg/db_test.go", Language::Go, b"package db\n"), FileClass::Test);
        assert_eq!(classify("pkg/_scratch.go", Language::Go, b"package db\n"), FileClass::Excluded);
        assert_eq!(
            classify(
                "pkg/db.pb.go",
                Language::Go,
                b"// Code generated by protoc-gen-go. DO NOT EDIT.\n\npackage db\n"
            ),
            FileClass::Generated
        );
        assert_eq!(
            classify(
                "pkg/late.go",
                Language::Go,
                b"package db\n\n// Code generated by hand. DO NOT EDIT.\n"
            ),
            FileClass::Source
        );
    }

    #[test]
    fn test_classify_python_and_typescript() {
        assert_eq!(classify("tests/test_api.py", Language::Python, b""), FileClass::Test);
        assert_eq!(classify("api_test.py", Language::Python, b""), FileClass::Test);
        assert_eq!(classify("conftest.py", Language::Python, b""), FileClass::Test);
        assert_eq!(classify("testing.py", Language::Python, b""), FileClass::Source);

        assert_eq!(classify("src/a.test.ts", Language::TypeScript, b""), FileClass::Test);
        assert_eq!(classify("src/a.spec.js", Language::JavaScript, b""), FileClass::Test);
        assert_eq!(classify("src/__tests__/a.ts", Language::TypeScript, b""), FileClass::Test);
        assert_eq!(classify("src/a.ts", Language::TypeScript, b""), FileClass::Source);
        assert_eq!(classify("vendor/lib/a.ts", Language::TypeScript, b""), FileClass::Excluded);
    }

    #[test]
    fn test_discover_walks_and_skips() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "main.py", "import app\n");
        write(root, "app/__init__.py", "");
        write(root, "app/test_app.py", "");
        write(root, "node_modules/pkg/index.js", "");
        write(root, ".hidden/x.py", "");
        write(root, "README.md", "# readme\n");

        let discovery = discover(root, &DiscoveryConfig::default()).unwrap();
        let paths: Vec<_> = discovery.files.iter().map(|f| f.rel_path.as_str()).collect();

        assert_eq!(paths, vec!["app/__init__.py", "app/test_app.py", "main.py"]);
        assert_eq!(discovery.count(FileClass::Test), 1);
        assert_eq!(discovery.count(FileClass::Source), 2);
        assert_eq!(discovery.files[2].content, b"import app\n");
    }

    #[test]
    fn test_discover_size_limit() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "big.ts", &"x".repeat(64));

        let config = DiscoveryConfig {
            max_file_bytes: 16,
            ..Default::default()
        };
        let discovery = discover(dir.path(), &config).unwrap();
        assert_eq!(discovery.files[0].class, FileClass::Excluded);
        assert!(discovery.files[0].content.is_empty());
    }

    #[test]
    fn test_discover_manifests() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "services/api/go.mod", "module example.com/api\n\ngo 1.22\n");
        write(root, "services/api/main.go", "package main\n");
        write(root, "web/package.json", r#"{"name": "@acme/web"}"#);
        write(root, "web/broken/package.json", "{ nope");
        write(root, "py/pyproject.toml", "[project]\nname = \"data-tools\"\n");

        let discovery = discover(root, &DiscoveryConfig::default()).unwrap();
        let roots: Vec<_> = discovery.manifests.iter().map(|m| m.root.as_str()).collect();
        assert_eq!(roots, vec!["", "py", "services/api", "web", "web/broken"]);

        assert_eq!(discovery.manifests[1].python_package.as_deref(), Some("data_tools"));
        assert_eq!(discovery.manifests[2].go_module.as_deref(), Some("example.com/api"));
        assert_eq!(discovery.manifests[3].package_name.as_deref(), Some("@acme/web"));
        assert_eq!(discovery.manifests[4].package_name, None);
    }

    #[test]
    fn test_discover_missing_root() {
        let err = discover(Path::new("/nonexistent/archnav"), &DiscoveryConfig::default()).unwrap_err();
        assert!(matches!(err, DiscoveryError::Root { .. }));
    }
}
