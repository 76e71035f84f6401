//! HTML and PHP markup minification.
//!
//! Plain HTML goes straight through `minify-html`. PHP templates need
//! their `<?php ... ?>` / `<?= ... ?>` blocks preserved verbatim, so
//! they are masked with opaque placeholders before minification and
//! restored afterwards.

use std::sync::LazyLock;

use regex::Regex;

use super::TransformError;
use crate::config::BuildConfig;

/// PHP code blocks, including an unterminated trailing block.
static PHP_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<\?(?:php|=)?.*?(?:\?>|\z)").expect("php block regex is valid")
});

/// Minify an HTML document (whitespace collapse, comment removal).
pub fn minify_html(source: &str, config: &BuildConfig) -> Result<String, TransformError> {
    if !config.minify {
        return Ok(source.to_string());
    }

    let minified = minify_html::minify(source.as_bytes(), &minify_cfg());
    String::from_utf8(minified).map_err(|_| TransformError::NotUtf8)
}

/// Minify a PHP template, leaving PHP blocks byte-identical.
pub fn minify_php(source: &str, config: &BuildConfig) -> Result<String, TransformError> {
    if !config.minify {
        return Ok(source.to_string());
    }

    // Mask PHP blocks so the HTML minifier never sees them. Owned
    // copies: the match borrows cannot outlive the replacer closure.
    let mut blocks: Vec<String> = Vec::new();
    let masked = PHP_BLOCK.replace_all(source, |caps: &regex::Captures<'_>| {
        let token = placeholder(blocks.len());
        blocks.push(caps[0].to_string());
        token
    });

    let minified = minify_html::minify(masked.as_bytes(), &minify_cfg());
    let mut result = String::from_utf8(minified).map_err(|_| TransformError::NotUtf8)?;

    // Restore in reverse so shorter prefixes never clobber longer tokens
    for (index, block) in blocks.iter().enumerate().rev() {
        result = result.replace(&placeholder(index), block);
    }

    if !blocks.is_empty() && result.contains("__PW_PHP_") {
        return Err(TransformError::Markup(
            "minifier corrupted a PHP placeholder".to_string(),
        ));
    }

    Ok(result)
}

fn placeholder(index: usize) -> String {
    format!("__PW_PHP_{index}__")
}

fn minify_cfg() -> minify_html::Cfg {
    minify_html::Cfg {
        // CSS/JS inside markup is handled by the dedicated stages
        minify_css: false,
        minify_js: false,
        ..minify_html::Cfg::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_html_collapses_whitespace() {
        let config = BuildConfig::default();
        let out = minify_html(
            "<div>\n    <p>  hello   world  </p>\n</div>\n",
            &config,
        )
        .unwrap();
        assert!(out.len() < "<div>\n    <p>  hello   world  </p>\n</div>\n".len());
        assert!(out.contains("hello world"));
    }

    #[test]
    fn test_minify_php_preserves_blocks() {
        let config = BuildConfig::default();
        let source = "<html>\n  <body>\n    <?php echo  $greeting ;  ?>\n  </body>\n</html>";
        let out = minify_php(source, &config).unwrap();
        assert!(out.contains("<?php echo  $greeting ;  ?>"));
        assert!(!out.contains("__PW_PHP_"));
    }

    #[test]
    fn test_minify_php_short_echo_in_attribute() {
        let config = BuildConfig::default();
        let source = "<a href=\"<?= $url ?>\">  link  </a>";
        let out = minify_php(source, &config).unwrap();
        assert!(out.contains("<?= $url ?>"));
    }

    #[test]
    fn test_minify_php_many_blocks_restore_in_order() {
        let config = BuildConfig::default();
        let source = "<ul>\n  <li><?= $first ?></li>\n  <li><?= $second ?></li>\n  <li><?php echo $third; ?></li>\n</ul>";
        let out = minify_php(source, &config).unwrap();
        assert!(out.contains("<?= $first ?>"));
        assert!(out.contains("<?= $second ?>"));
        assert!(out.contains("<?php echo $third; ?>"));
        assert!(!out.contains("__PW_PHP_"));
        // blocks come back in document order
        let first = out.find("$first").unwrap();
        let third = out.find("$third").unwrap();
        assert!(first < third);
    }

    #[test]
    fn test_minify_php_unterminated_block() {
        let config = BuildConfig::default();
        let source = "<p>page</p>\n<?php\n// pure code file tail\nrender();";
        let out = minify_php(source, &config).unwrap();
        assert!(out.contains("render();"));
        assert!(!out.contains("__PW_PHP_"));
    }

    #[test]
    fn test_minify_disabled_passthrough() {
        let config = BuildConfig {
            minify: false,
            ..BuildConfig::default()
        };
        let source = "<p>   spaced   </p>";
        assert_eq!(minify_html(source, &config).unwrap(), source);
        assert_eq!(minify_php(source, &config).unwrap(), source);
    }
}
