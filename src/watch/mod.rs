//! Watch mode: filesystem events in, task runs out.
//!
//! The coordinator binds glob patterns to declared task names, debounces
//! raw notify events, and runs the matched tasks synchronously on its
//! own thread. One batch at a time: events arriving during a run are
//! queued by the debouncer and handled in the next cycle, so task runs
//! never overlap.

mod debouncer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossbeam::channel::{self, RecvTimeoutError};
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashMap;

use crate::core::SessionPhase;
use crate::graph::{TaskError, TaskGraph};
use crate::logger::{status_error, status_success, status_unchanged};
use crate::pipeline::{RunContext, RunResult};
use crate::utils::path::normalize_path;
use crate::{debug, log};

pub use debouncer::ChangeKind;
use debouncer::Debouncer;

/// A glob pattern mapped to a declared task name.
struct WatchBinding {
    pattern: glob::Pattern,
    task: String,
}

/// Dispatches debounced file changes to task runs.
pub struct WatchCoordinator<'a> {
    graph: &'a TaskGraph,
    roots: Vec<PathBuf>,
    bindings: Vec<WatchBinding>,
}

impl<'a> WatchCoordinator<'a> {
    pub fn new(graph: &'a TaskGraph) -> Self {
        Self {
            graph,
            roots: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Watch a directory tree for events.
    pub fn watch_root(&mut self, root: &Path) {
        let root = normalize_path(root);
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    /// Bind `glob` under `root` to a declared task. Bindings are checked
    /// in declaration order and a task runs at most once per batch.
    pub fn bind(&mut self, root: &Path, glob: &str, task: &str) -> Result<()> {
        if !self.graph.contains(task) {
            anyhow::bail!("watch binding references unknown task `{task}`");
        }

        let full = normalize_path(root).join(glob);
        let pattern = glob::Pattern::new(&full.to_string_lossy())
            .with_context(|| format!("invalid watch pattern {}", full.display()))?;

        self.bindings.push(WatchBinding {
            pattern,
            task: task.to_string(),
        });
        Ok(())
    }

    /// Tasks matching a change batch, deduplicated, in binding order.
    fn tasks_for(&self, changes: &FxHashMap<PathBuf, ChangeKind>) -> Vec<&str> {
        let mut tasks: Vec<&str> = Vec::new();
        for binding in &self.bindings {
            if tasks.contains(&binding.task.as_str()) {
                continue;
            }
            if changes.keys().any(|p| binding.pattern.matches_path(p)) {
                tasks.push(&binding.task);
            }
        }
        tasks
    }

    /// Run the watch loop until shutdown. Blocks the calling thread.
    pub fn run(&self, ctx: &RunContext) -> Result<()> {
        let (tx, rx) = channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .context("create filesystem watcher")?;

        for root in &self.roots {
            watcher
                .watch(root, RecursiveMode::Recursive)
                .with_context(|| format!("watch {}", root.display()))?;
            log!("watch"; "watching {}", root.display());
        }

        let mut debouncer = Debouncer::new();

        loop {
            if crate::core::is_shutdown() {
                break;
            }

            // Cap the sleep so shutdown is noticed promptly even when idle
            let timeout = debouncer
                .sleep_duration()
                .min(std::time::Duration::from_millis(500));
            match rx.recv_timeout(timeout) {
                Ok(Ok(event)) => debouncer.add_event(&event),
                Ok(Err(e)) => log!("watch"; "watcher error: {}", e),
                Err(RecvTimeoutError::Timeout) => {
                    let Some(changes) = debouncer.take_if_ready() else {
                        continue;
                    };
                    let tasks = self.tasks_for(&changes);
                    if tasks.is_empty() {
                        debug!("watch"; "{} change(s), no binding matched", changes.len());
                        continue;
                    }

                    debug!("watch"; "phase: {}", SessionPhase::Building.label());
                    if let Err(e) = self.run_batch(&tasks, ctx) {
                        // Filesystem gone bad: stop the session, take the
                        // server down with it
                        crate::core::request_shutdown();
                        return Err(e);
                    }
                    debug!("watch"; "phase: {}", SessionPhase::Idle.label());
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Ok(())
    }

    /// Run one batch of matched tasks, reporting via the status line.
    ///
    /// Per-file failures and non-fatal task errors are reported and the
    /// remaining tasks of the batch still run. A fatal error (unusable
    /// output root, failed clean) is returned and ends the session.
    fn run_batch(&self, tasks: &[&str], ctx: &RunContext) -> Result<()> {
        let mut report = RunResult::default();
        for task in tasks {
            match self.graph.run(task, ctx) {
                Ok(result) => report.merge(result),
                Err(e) if e.is_fatal() => {
                    return Err(anyhow::Error::new(e).context(format!("task `{task}` failed")));
                }
                Err(TaskError::SequenceAbort { step, source }) => {
                    status_error(
                        &format!("task `{task}` aborted at step {step}"),
                        &source.to_string(),
                    );
                }
                Err(e) => {
                    status_error(&format!("task `{task}` failed"), &e.to_string());
                }
            }
        }

        if !report.is_clean() {
            let detail: Vec<String> = report
                .failures
                .iter()
                .map(|(path, reason)| format!("{}: {}", path.display(), reason))
                .collect();
            status_error(
                &format!("{} file(s) failed", report.failures.len()),
                &detail.join("\n"),
            );
        } else if report.processed == 0 {
            status_unchanged("no files changed");
        } else {
            status_success(&format!(
                "rebuilt {} file(s) [{}]",
                report.processed,
                tasks.join(", ")
            ));
        }
        Ok(())
    }
}
