//! The built-in stage set.
//!
//! Path conventions follow the classic asset layout: sources under
//! `src/`, compiled output under `dist/`, with assets grouped under
//! `src/assets/{scss,css,js,img,fonts}`. The Sass stage is the one
//! exception to the src-to-dist flow: it compiles into `src/assets/css`
//! so the CSS stage (and the dev server) can pick its output up.

use crate::config::PipelineConfig;
use crate::transform::TransformKind;

use super::{ReloadAction, Stage};

/// Markup pages, minified into the dist root.
pub fn html(config: &PipelineConfig) -> Stage {
    Stage {
        name: "html".into(),
        input_root: config.src_dir(),
        glob: "**/*.html".into(),
        output_dir: config.dist_dir(),
        transform: TransformKind::Markup,
        incremental: true,
        reload: ReloadAction::Full,
    }
}

/// PHP templates, minified with code blocks preserved.
pub fn php(config: &PipelineConfig) -> Stage {
    Stage {
        name: "php".into(),
        input_root: config.src_dir(),
        glob: "**/*.php".into(),
        output_dir: config.dist_dir(),
        transform: TransformKind::PhpMarkup,
        incremental: false,
        reload: ReloadAction::Full,
    }
}

/// Sass compilation, writing into the source CSS directory.
///
/// Always a full run: a partial edit must rebuild every entry point
/// that might import it, and import graphs are not tracked.
pub fn scss(config: &PipelineConfig) -> Stage {
    Stage {
        name: "scss".into(),
        input_root: config.src_dir().join("assets/scss"),
        glob: "**/*.scss".into(),
        output_dir: config.src_dir().join("assets/css"),
        transform: TransformKind::Sass,
        incremental: false,
        reload: ReloadAction::Styles,
    }
}

/// Stylesheet processing: prefixing and minification into dist.
pub fn css(config: &PipelineConfig) -> Stage {
    Stage {
        name: "css".into(),
        input_root: config.src_dir().join("assets/css"),
        glob: "**/*.css".into(),
        output_dir: config.dist_dir().join("assets/css"),
        transform: TransformKind::Css,
        incremental: true,
        reload: ReloadAction::Styles,
    }
}

/// Script minification into dist.
pub fn js(config: &PipelineConfig) -> Stage {
    Stage {
        name: "js".into(),
        input_root: config.src_dir().join("assets/js"),
        glob: "**/*.js".into(),
        output_dir: config.dist_dir().join("assets/js"),
        transform: TransformKind::Script,
        incremental: true,
        reload: ReloadAction::Full,
    }
}

/// Image recompression into dist. Always a full run.
pub fn images(config: &PipelineConfig) -> Stage {
    Stage {
        name: "images".into(),
        input_root: config.src_dir().join("assets/img"),
        glob: "**/*".into(),
        output_dir: config.dist_dir().join("assets/img"),
        transform: TransformKind::Image,
        incremental: false,
        reload: ReloadAction::Full,
    }
}

/// Font files, copied through byte for byte.
pub fn fonts(config: &PipelineConfig) -> Stage {
    Stage {
        name: "fonts".into(),
        input_root: config.src_dir().join("assets/fonts"),
        glob: "**/*".into(),
        output_dir: config.dist_dir().join("assets/fonts"),
        transform: TransformKind::Copy,
        incremental: true,
        reload: ReloadAction::Full,
    }
}
