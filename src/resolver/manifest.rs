//! Project manifests: the declared module roots imports are matched against.
//!
//! Reads `go.mod` (module path), `package.json` (package name) and
//! `pyproject.toml` (project name). Parsing is pure; discovery reads the files
//! and hands their contents over.

use serde::Deserialize;
use thiserror::Error;

/// File names that mark a directory as a project root.
pub const MANIFEST_FILES: &[&str] = &[
    "go.mod",
    "package.json",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
];

/// Errors that can occur while parsing a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Invalid package.json: {0}")]
    PackageJson(#[from] serde_json::Error),

    #[error("Invalid pyproject.toml: {0}")]
    Pyproject(#[from] toml::de::Error),
}

/// The subset of package.json needed for resolution.
#[derive(Debug, Clone, Deserialize, Default)]
struct PackageJson {
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct Pyproject {
    project: Option<PyprojectProject>,
    tool: Option<PyprojectTool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PyprojectProject {
    name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PyprojectTool {
    poetry: Option<PyprojectProject>,
}

/// Declared module roots for one project directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectManifest {
    /// Project root relative to the scan root (`""` for the scan root itself)
    pub root: String,
    /// `module` line of go.mod
    pub go_module: Option<String>,
    /// `name` of package.json
    pub package_name: Option<String>,
    /// Importable Python package name declared by pyproject.toml
    pub python_package: Option<String>,
}

impl ProjectManifest {
    /// Creates an empty manifest for a project root.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_go_module(mut self, module: impl Into<String>) -> Self {
        self.go_module = Some(module.into());
        self
    }

    pub fn with_package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }

    pub fn with_python_package(mut self, name: impl Into<String>) -> Self {
        self.python_package = Some(name.into());
        self
    }

    /// Reads the module path out of go.mod content.
    pub fn apply_go_mod(&mut self, content: &str) {
        self.go_module = content.lines().find_map(|line| {
            let rest = line.trim().strip_prefix("module")?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let module = rest.trim().trim_matches('"');
            (!module.is_empty()).then(|| module.to_string())
        });
    }

    /// Reads the package name out of package.json content.
    pub fn apply_package_json(&mut self, content: &str) -> Result<(), ManifestError> {
        let pkg: PackageJson = serde_json::from_str(content)?;
        self.package_name = pkg.name.filter(|n| !n.is_empty());
        Ok(())
    }

    /// Reads the project name out of pyproject.toml content.
    ///
    /// Distribution names may use `-`; the importable package uses `_`.
    pub fn apply_pyproject(&mut self, content: &str) -> Result<(), ManifestError> {
        let pyproject: Pyproject = toml::from_str(content)?;
        let name = pyproject
            .project
            .and_then(|p| p.name)
            .or_else(|| pyproject.tool.and_then(|t| t.poetry).and_then(|p| p.name));
        self.python_package = name
            .filter(|n| !n.is_empty())
            .map(|n| n.replace('-', "_").to_lowercase());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_mod_module_line() {
        let mut manifest = ProjectManifest::new("");
        manifest.apply_go_mod("// comment\nmodule github.com/acme/tool\n\ngo 1.22\n");
        assert_eq!(manifest.go_module.as_deref(), Some("github.com/acme/tool"));
    }

    #[test]
    fn test_go_mod_without_module_line() {
        let mut manifest = ProjectManifest::new("");
        manifest.apply_go_mod("go 1.22\nmodulex foo\n");
        assert_eq!(manifest.go_module, None);
    }

    #[test]
    fn test_package_json_name() {
        let mut manifest = ProjectManifest::new("web");
        manifest
            .apply_package_json(r#"{"name": "@acme/web", "version": "1.0.0"}"#)
            .unwrap();
        assert_eq!(manifest.package_name.as_deref(), Some("@acme/web"));
    }

    #[test]
    fn test_package_json_invalid() {
        let mut manifest = ProjectManifest::new("");
        assert!(manifest.apply_package_json("{ not json").is_err());
    }

    #[test]
    fn test_pyproject_name_normalized() {
        let mut manifest = ProjectManifest::new("");
        manifest
            .apply_pyproject("[project]\nname = \"My-Service\"\nversion = \"0.1\"\n")
            .unwrap();
        assert_eq!(manifest.python_package.as_deref(), Some("my_service"));
    }

    #[test]
    fn test_pyproject_poetry_name() {
        let mut manifest = ProjectManifest::new("");
        manifest
            .apply_pyproject("[tool.poetry]\nname = \"tooling\"\n")
            .unwrap();
        assert_eq!(manifest.python_package.as_deref(), Some("tooling"));
    }
}
