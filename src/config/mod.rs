//! Pipeline configuration loaded from `pipewright.toml`.
//!
//! Every section has full defaults, so a project without a config file
//! gets the conventional `src/` → `dist/` layout.

pub mod section;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::normalize_path;
pub use section::{BuildConfig, PathsConfig, PhpConfig, ServeConfig};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub serve: ServeConfig,
    pub php: PhpConfig,
    pub build: BuildConfig,

    /// Project root (directory containing the config file).
    #[serde(skip)]
    root: PathBuf,
}

impl PipelineConfig {
    /// Load configuration from the given file path.
    ///
    /// A missing file is not an error: all sections default. The project
    /// root is the config file's parent directory (or cwd without one).
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.is_file() {
            let raw = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        let root = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.root = normalize_path(&root);
        Ok(config)
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute source tree root.
    pub fn src_dir(&self) -> PathBuf {
        self.root.join(&self.paths.src)
    }

    /// Absolute output tree root.
    pub fn dist_dir(&self) -> PathBuf {
        self.root.join(&self.paths.dist)
    }

    /// Rebase the config onto a root directory (for tests).
    pub fn with_root(mut self, root: &Path) -> Self {
        self.root = root.to_path_buf();
        self
    }
}

/// Parse a config from a TOML string (test helper).
#[cfg(test)]
pub fn test_parse_config(raw: &str) -> PipelineConfig {
    toml::from_str(raw).expect("test config must parse")
}
