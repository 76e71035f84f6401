//! Content transformers behind a uniform per-file contract.
//!
//! Every stage is bound to one `TransformKind`, resolved at declaration
//! time. `apply` computes the transformed bytes and nothing else; writing
//! is the stage runner's job, and a failed file never aborts its batch.

mod image;
mod markup;
mod script;
mod style;

use std::path::Path;

use thiserror::Error;

use crate::config::BuildConfig;

/// Per-file transform failure. Collected into the batch result, never
/// escalated on its own.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("sass: {0}")]
    Sass(String),

    #[error("css: {0}")]
    Css(String),

    #[error("js: {0}")]
    Script(String),

    #[error("markup: {0}")]
    Markup(String),

    #[error("image: {0}")]
    Image(String),

    #[error("not valid UTF-8")]
    NotUtf8,
}

/// The closed set of content transformers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// `.scss` → expanded CSS (`grass`).
    Sass,
    /// Vendor prefixing + minification (`lightningcss`).
    Css,
    /// HTML whitespace collapse (`minify-html`).
    Markup,
    /// HTML minification with PHP blocks preserved.
    PhpMarkup,
    /// JS compress + mangle (`oxc`).
    Script,
    /// PNG/JPEG recompression (`image`), other formats copied.
    Image,
    /// Byte-for-byte copy (fonts, unknown assets).
    Copy,
}

impl TransformKind {
    /// Apply the transform to one file's content.
    pub fn apply(
        self,
        content: &[u8],
        path: &Path,
        config: &BuildConfig,
    ) -> Result<Vec<u8>, TransformError> {
        match self {
            Self::Copy => Ok(content.to_vec()),
            Self::Image => image::optimize(content, path, config),
            Self::Sass => {
                let source = as_text(content)?;
                style::compile_sass(source, path).map(String::into_bytes)
            }
            Self::Css => {
                // Pre-minified files are copied through untouched
                if is_preminified(path) {
                    return Ok(content.to_vec());
                }
                let source = as_text(content)?;
                style::process_css(source, config).map(String::into_bytes)
            }
            Self::Script => {
                if is_preminified(path) {
                    return Ok(content.to_vec());
                }
                let source = as_text(content)?;
                script::minify_js(source, config).map(String::into_bytes)
            }
            Self::Markup => {
                let source = as_text(content)?;
                markup::minify_html(source, config).map(String::into_bytes)
            }
            Self::PhpMarkup => {
                let source = as_text(content)?;
                markup::minify_php(source, config).map(String::into_bytes)
            }
        }
    }

    /// Output file extension override, if the transform changes it.
    pub fn output_extension(self) -> Option<&'static str> {
        match self {
            Self::Sass => Some("css"),
            _ => None,
        }
    }

    /// Whether this transform skips the given input entirely.
    ///
    /// Sass partials (`_vars.scss`) are imported by entry files, never
    /// compiled standalone.
    pub fn skips_input(self, path: &Path) -> bool {
        matches!(self, Self::Sass)
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('_'))
    }

}

/// Check for `*.min.js` / `*.min.css` style names.
fn is_preminified(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with(".min"))
}

fn as_text(content: &[u8]) -> Result<&str, TransformError> {
    std::str::from_utf8(content).map_err(|_| TransformError::NotUtf8)
}
