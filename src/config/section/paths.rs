//! `[paths]` section configuration.
//!
//! ```toml
//! [paths]
//! src = "src"      # source tree root
//! dist = "dist"    # output tree root
//! ```
//!
//! Both paths are relative to the project root. The per-category input
//! globs (`assets/scss/**/*.scss` and friends) are a fixed layout
//! contract, not configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Source and output tree roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Source tree root, relative to the project root.
    pub src: PathBuf,

    /// Output tree root, relative to the project root.
    pub dist: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src: PathBuf::from("src"),
            dist: PathBuf::from("dist"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_paths_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.paths.src, PathBuf::from("src"));
        assert_eq!(config.paths.dist, PathBuf::from("dist"));
    }

    #[test]
    fn test_paths_override() {
        let config = test_parse_config("[paths]\nsrc = \"app\"\ndist = \"public\"");
        assert_eq!(config.paths.src, PathBuf::from("app"));
        assert_eq!(config.paths.dist, PathBuf::from("public"));
    }
}
