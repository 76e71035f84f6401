//! Path normalization utilities.
//!
//! Pure functions for path manipulation. No side effects.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Display a path relative to a root directory (for log messages).
///
/// Falls back to the full path when it is not under the root.
pub fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Check if path is a temp/backup file (editor artifacts).
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_absolute() {
        let path = Path::new("/absolute/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let path = Path::new("relative/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_relative_display() {
        let root = Path::new("/project/src");
        let path = Path::new("/project/src/assets/js/app.js");
        assert_eq!(relative_display(path, root), "assets/js/app.js");

        let outside = Path::new("/elsewhere/file.txt");
        assert_eq!(relative_display(outside, root), "/elsewhere/file.txt");
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("/a/.main.scss.swp")));
        assert!(is_temp_file(Path::new("/a/index.html~")));
        assert!(is_temp_file(Path::new("/a/style.css.bak")));
        assert!(!is_temp_file(Path::new("/a/main.scss")));
    }
}
