//! Incremental selection by modification time.
//!
//! A file is selected when its mtime is strictly newer than the stage's
//! last completed batch. Files whose mtime cannot be read are selected
//! unconditionally; processing them is the safe direction.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::debug;

/// Modification time of a file, if the filesystem will tell us.
pub fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Keep only files changed since `last_run`. `None` means the stage has
/// never run, so everything is kept.
pub fn filter_changed(files: Vec<PathBuf>, last_run: Option<SystemTime>) -> Vec<PathBuf> {
    let Some(last_run) = last_run else {
        return files;
    };

    files
        .into_iter()
        .filter(|path| match mtime(path) {
            Some(modified) => modified > last_run,
            None => {
                debug!("pipeline"; "no mtime for {}, selecting", path.display());
                true
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_no_record_selects_everything() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.css");
        std::fs::write(&a, "a{}").unwrap();

        let selected = filter_changed(vec![a.clone()], None);
        assert_eq!(selected, vec![a]);
    }

    #[test]
    fn test_unchanged_files_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.css");
        std::fs::write(&a, "a{}").unwrap();

        let after = SystemTime::now() + Duration::from_secs(60);
        assert!(filter_changed(vec![a], Some(after)).is_empty());
    }

    #[test]
    fn test_newer_file_is_selected() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.css");
        std::fs::write(&a, "a{}").unwrap();

        let before = SystemTime::now() - Duration::from_secs(60);
        let selected = filter_changed(vec![a.clone()], Some(before));
        assert_eq!(selected, vec![a]);
    }

    #[test]
    fn test_missing_file_is_selected() {
        let ghost = PathBuf::from("/nonexistent/ghost.css");
        let selected = filter_changed(vec![ghost.clone()], Some(SystemTime::now()));
        assert_eq!(selected, vec![ghost]);
    }
}
