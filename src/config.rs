//! Project configuration loaded from `archnav.toml`.
//!
//! Every field is optional; a missing file means defaults.
//!
//! ```toml
//! [discovery]
//! skip_dirs = ["node_modules", ".git", "vendor"]
//! max_file_bytes = 1048576
//!
//! [analysis]
//! entry_points = ["cmd/server/main.go"]
//! workers = 0
//! ignore_entry_exports = false
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::analysis::AnalysisOptions;

/// Config file looked up at the scan root.
pub const CONFIG_FILE: &str = "archnav.toml";

/// Directories never descended into unless the config says otherwise.
pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "vendor",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    "target",
    "testdata",
];

/// Files larger than this are classified as excluded.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Directory names skipped anywhere in the tree
    pub skip_dirs: Vec<String>,
    pub max_file_bytes: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|d| d.to_string()).collect(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Modules treated as externally invoked, relative to the scan root
    pub entry_points: Vec<String>,
    /// 0 = one worker per core
    pub workers: usize,
    pub ignore_entry_exports: bool,
}

/// Top-level `archnav.toml` layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub discovery: DiscoveryConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Parses config file content.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads an explicit config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content, path)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Loads `archnav.toml` from `root`, or defaults when it does not exist.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            debug!("No {} in {}, using defaults", CONFIG_FILE, root.display());
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Engine options derived from the `[analysis]` table.
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            entry_points: self.analysis.entry_points.clone(),
            workers: self.analysis.workers,
            ignore_entry_exports: self.analysis.ignore_entry_exports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.discovery.skip_dirs.contains(&"node_modules".to_string()));
        assert_eq!(config.discovery.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert_eq!(config.analysis.workers, 0);
        assert!(!config.analysis.ignore_entry_exports);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::from_toml(
            "[analysis]\nentry_points = [\"cmd/api/main.go\"]\nignore_entry_exports = true\n",
            Path::new(CONFIG_FILE),
        )
        .unwrap();

        assert_eq!(config.analysis.entry_points, vec!["cmd/api/main.go"]);
        assert!(config.analysis.ignore_entry_exports);
        assert_eq!(config.discovery, DiscoveryConfig::default());

        let options = config.analysis_options();
        assert_eq!(options.entry_points, vec!["cmd/api/main.go"]);
        assert!(options.ignore_entry_exports);
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::from_toml("[discovery]\nmax_file_bytes = \"big\"\n", Path::new(CONFIG_FILE))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_discover_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_discover_reads_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[discovery]\nskip_dirs = [\"gen\"]\n\n[analysis]\nworkers = 2\n",
        )
        .unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.discovery.skip_dirs, vec!["gen"]);
        assert_eq!(config.analysis.workers, 2);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let err = Config::load(Path::new("/nonexistent/archnav.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
