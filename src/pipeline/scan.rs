//! Input enumeration.
//!
//! Walks a stage's glob pattern and returns the matching regular files
//! in sorted order, so batch output and logs are deterministic across
//! runs and platforms.

use std::path::PathBuf;

use crate::debug;

use super::{Stage, StageFatal};

/// Enumerate the files a stage run will consider.
///
/// Inputs the transform declines (Sass partials) are filtered here,
/// before incremental selection, so they never count as skipped.
pub fn scan_inputs(stage: &Stage) -> Result<Vec<PathBuf>, StageFatal> {
    let pattern = stage.pattern();
    let paths = glob::glob(&pattern).map_err(|source| StageFatal::Pattern {
        pattern: pattern.clone(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if !path.is_file() {
                    continue;
                }
                if stage.transform.skips_input(&path) {
                    debug!("pipeline"; "{}: skipping {}", stage.name, path.display());
                    continue;
                }
                files.push(path);
            }
            Err(e) => {
                // Unreadable directory entries are logged and dropped,
                // not fatal: the rest of the batch can still run.
                debug!("pipeline"; "{}: unreadable entry: {}", stage.name, e);
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ReloadAction;
    use crate::transform::TransformKind;

    fn stage_at(root: &std::path::Path, glob: &str, transform: TransformKind) -> Stage {
        Stage {
            name: "test".into(),
            input_root: root.to_path_buf(),
            glob: glob.into(),
            output_dir: root.join("out"),
            transform,
            incremental: false,
            reload: ReloadAction::None,
        }
    }

    #[test]
    fn test_scan_finds_nested_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pages")).unwrap();
        std::fs::write(dir.path().join("pages/about.html"), "<p>a</p>").unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>i</p>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let stage = stage_at(dir.path(), "**/*.html", TransformKind::Markup);
        let files = scan_inputs(&stage).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("index.html"),
                dir.path().join("pages/about.html"),
            ]
        );
    }

    #[test]
    fn test_scan_excludes_sass_partials() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.scss"), "body { margin: 0 }").unwrap();
        std::fs::write(dir.path().join("_mixins.scss"), "@mixin x {}").unwrap();

        let stage = stage_at(dir.path(), "**/*.scss", TransformKind::Sass);
        let files = scan_inputs(&stage).unwrap();
        assert_eq!(files, vec![dir.path().join("main.scss")]);
    }

    #[test]
    fn test_scan_empty_dir_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let stage = stage_at(dir.path(), "**/*.css", TransformKind::Css);
        assert!(scan_inputs(&stage).unwrap().is_empty());
    }

    #[test]
    fn test_bad_pattern_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let stage = stage_at(dir.path(), "***.css", TransformKind::Css);
        assert!(matches!(
            scan_inputs(&stage),
            Err(StageFatal::Pattern { .. })
        ));
    }
}
