//! Stylesheet transforms: Sass compilation and CSS post-processing.
//!
//! Sass goes through `grass` with the entry file's directory on the load
//! path so `@use`/`@import` of partials resolves. CSS goes through
//! lightningcss: parse, add vendor prefixes for the configured browser
//! targets, minify.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use super::TransformError;
use crate::config::BuildConfig;

/// Compile a Sass source file to expanded CSS.
pub fn compile_sass(source: &str, path: &Path) -> Result<String, TransformError> {
    let mut options = grass::Options::default().style(grass::OutputStyle::Expanded);
    if let Some(parent) = path.parent() {
        options = options.load_path(parent);
    }

    grass::from_string(source.to_string(), &options)
        .map_err(|e| TransformError::Sass(e.to_string()))
}

/// Prefix and minify a CSS source file.
pub fn process_css(source: &str, config: &BuildConfig) -> Result<String, TransformError> {
    let targets = Targets::from(parse_targets(&config.css_targets));

    let mut stylesheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| TransformError::Css(e.to_string()))?;

    stylesheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| TransformError::Css(e.to_string()))?;

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: config.minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| TransformError::Css(e.to_string()))?;

    Ok(result.code)
}

/// Parse `"name version"` target entries into a lightningcss browser set.
///
/// Unknown names and malformed entries are skipped; an empty result means
/// no prefixing (lightningcss treats `None` browsers as "no targets").
pub fn parse_targets(entries: &[String]) -> Browsers {
    let mut browsers = Browsers::default();

    for entry in entries {
        let mut parts = entry.split_whitespace();
        let (Some(name), Some(version)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Some(encoded) = encode_version(version) else {
            continue;
        };

        match name.to_ascii_lowercase().as_str() {
            "android" => browsers.android = Some(encoded),
            "chrome" => browsers.chrome = Some(encoded),
            "edge" => browsers.edge = Some(encoded),
            "firefox" => browsers.firefox = Some(encoded),
            "ie" => browsers.ie = Some(encoded),
            "ios" | "ios_saf" => browsers.ios_saf = Some(encoded),
            "opera" => browsers.opera = Some(encoded),
            "safari" => browsers.safari = Some(encoded),
            "samsung" => browsers.samsung = Some(encoded),
            _ => {}
        }
    }

    browsers
}

/// Encode `major[.minor[.patch]]` into lightningcss's packed version format.
fn encode_version(version: &str) -> Option<u32> {
    let mut parts = version.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some((major << 16) | (minor << 8) | patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_compile_sass_basic() {
        let css = compile_sass(
            "$accent: #e33;\na { color: $accent; }",
            &PathBuf::from("main.scss"),
        )
        .unwrap();
        assert!(css.contains("color: #e33"));
    }

    #[test]
    fn test_compile_sass_nesting() {
        let css = compile_sass(
            "nav { ul { margin: 0; } }",
            &PathBuf::from("main.scss"),
        )
        .unwrap();
        assert!(css.contains("nav ul"));
    }

    #[test]
    fn test_compile_sass_error() {
        let err = compile_sass("a { color: $undefined; }", &PathBuf::from("main.scss"));
        assert!(matches!(err, Err(TransformError::Sass(_))));
    }

    #[test]
    fn test_process_css_minifies() {
        let config = BuildConfig::default();
        let out = process_css("a {\n  color: #ee3333;\n}\n", &config).unwrap();
        assert!(out.len() < "a {\n  color: #ee3333;\n}\n".len());
        assert!(!out.contains('\n'));
    }

    #[test]
    fn test_process_css_prefixes_for_old_targets() {
        let config = BuildConfig::default();
        let out = process_css("a { user-select: none; }", &config).unwrap();
        assert!(out.contains("-webkit-user-select"), "got: {out}");
    }

    #[test]
    fn test_process_css_parse_error() {
        let config = BuildConfig::default();
        let err = process_css("][ { color: red; }", &config);
        assert!(matches!(err, Err(TransformError::Css(_))));
    }

    #[test]
    fn test_parse_targets() {
        let browsers = parse_targets(&["chrome 90".into(), "safari 14.1".into()]);
        assert_eq!(browsers.chrome, Some(90 << 16));
        assert_eq!(browsers.safari, Some((14 << 16) | (1 << 8)));
        assert_eq!(browsers.firefox, None);
    }

    #[test]
    fn test_parse_targets_skips_malformed() {
        let browsers = parse_targets(&["chrome".into(), "netscape 4".into(), "".into()]);
        assert_eq!(browsers.chrome, None);
        assert_eq!(browsers.safari, None);
    }
}
