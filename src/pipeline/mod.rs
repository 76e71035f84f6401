//! Pipeline stages: declaration, scanning, incremental selection, running.
//!
//! A [`Stage`] binds an input glob to an output directory and one
//! transform. Stages are immutable after declaration; the only mutable
//! shared state in the whole pipeline is [`RunRecords`], written by the
//! runner after a batch completes and read by the incremental selector
//! before the next one starts.

mod records;
pub mod runner;
pub mod scan;
pub mod selector;
pub mod stages;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::BuildConfig;
use crate::reload::ReloadHub;
use crate::transform::TransformKind;

pub use records::RunRecords;

/// What a completed batch tells the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadAction {
    /// No notification (pure output stages like PHP markup).
    None,
    /// Full page reload.
    Full,
    /// Stylesheet swap when possible, reload otherwise.
    Styles,
}

/// A named, configured file transformation. Immutable after declaration.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: String,
    /// Root directory inputs are enumerated under; output paths mirror
    /// the input path relative to this root.
    pub input_root: PathBuf,
    /// Glob pattern relative to `input_root`.
    pub glob: String,
    pub output_dir: PathBuf,
    pub transform: TransformKind,
    /// Restrict runs to files changed since the last successful run.
    pub incremental: bool,
    pub reload: ReloadAction,
}

impl Stage {
    /// Full glob pattern string rooted at `input_root`.
    pub fn pattern(&self) -> String {
        self.input_root.join(&self.glob).display().to_string()
    }
}

/// Result of one stage batch. Per-file failures are data here, not
/// errors: they surface in reports and exit codes, never as panics or
/// early returns.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// Files transformed and written.
    pub processed: usize,
    /// Files excluded by the incremental selector.
    pub skipped: usize,
    /// Per-file failures (path, reason).
    pub failures: Vec<(PathBuf, String)>,
}

impl RunResult {
    pub fn merge(&mut self, other: RunResult) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Unrecoverable stage failure: the batch cannot even start.
#[derive(Debug, Error)]
pub enum StageFatal {
    #[error("invalid glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("cannot prepare output root {}: {source}", path.display())]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything a task run needs, passed explicitly instead of living in
/// ambient globals.
pub struct RunContext<'a> {
    pub build: &'a BuildConfig,
    pub records: &'a RunRecords,
    /// Live reload hub; absent for one-shot builds.
    pub hub: Option<&'a ReloadHub>,
    /// Directory the dev server serves, for computing site-relative URLs.
    pub site_root: PathBuf,
    /// Log each processed file (quiet during full builds).
    pub log_files: bool,
}

impl<'a> RunContext<'a> {
    pub fn new(build: &'a BuildConfig, records: &'a RunRecords, site_root: &Path) -> Self {
        Self {
            build,
            records,
            hub: None,
            site_root: site_root.to_path_buf(),
            log_files: false,
        }
    }

    pub fn with_hub(mut self, hub: &'a ReloadHub) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn logging_files(mut self, log_files: bool) -> Self {
        self.log_files = log_files;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_pattern() {
        let stage = Stage {
            name: "scss".into(),
            input_root: PathBuf::from("/p/src/assets/scss"),
            glob: "**/*.scss".into(),
            output_dir: PathBuf::from("/p/src/assets/css"),
            transform: TransformKind::Sass,
            incremental: false,
            reload: ReloadAction::Styles,
        };
        assert_eq!(stage.pattern(), "/p/src/assets/scss/**/*.scss");
    }

    #[test]
    fn test_run_result_merge() {
        let mut a = RunResult {
            processed: 2,
            skipped: 1,
            failures: vec![(PathBuf::from("x"), "bad".into())],
        };
        a.merge(RunResult {
            processed: 3,
            skipped: 0,
            failures: vec![(PathBuf::from("y"), "worse".into())],
        });
        assert_eq!(a.processed, 5);
        assert_eq!(a.skipped, 1);
        assert_eq!(a.failures.len(), 2);
        assert!(!a.is_clean());
    }
}
