//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! minify = true                    # minify HTML/CSS/JS outputs
//! images = true                    # recompress PNG/JPEG images
//! jpeg_quality = 82                # JPEG re-encode quality (1-100)
//! css_targets = ["chrome 60", "firefox 60", "safari 11", "edge 16", "ios 11"]
//! ```
//!
//! `css_targets` drives vendor prefixing: each entry is a browser name
//! and minimum major version.

use serde::{Deserialize, Serialize};

/// Build pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Minify HTML, CSS and JS outputs.
    pub minify: bool,

    /// Recompress PNG/JPEG images (other formats copied through).
    pub images: bool,

    /// JPEG re-encode quality (1-100).
    pub jpeg_quality: u8,

    /// Browser targets for CSS vendor prefixing, `"name version"` pairs.
    pub css_targets: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            minify: true,
            images: true,
            jpeg_quality: 82,
            css_targets: ["chrome 60", "firefox 60", "safari 11", "edge 16", "ios 11"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        assert!(config.build.minify);
        assert!(config.build.images);
        assert_eq!(config.build.jpeg_quality, 82);
        assert_eq!(config.build.css_targets.len(), 5);
    }

    #[test]
    fn test_build_override() {
        let config =
            test_parse_config("[build]\nminify = false\ncss_targets = [\"chrome 100\"]");
        assert!(!config.build.minify);
        assert_eq!(config.build.css_targets, vec!["chrome 100"]);
    }
}
