//! Task composition and execution.
//!
//! Tasks form a tree: stages and housekeeping steps at the leaves,
//! sequence and parallel combinators above them. Trees cannot express
//! cycles, so there is nothing to detect at declaration time.
//!
//! A sequence stops at the first failing child. A parallel group always
//! runs every child to completion and reports all failures together,
//! so one broken stage never hides output (or errors) from its siblings.

mod error;

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::pipeline::{RunContext, RunResult, Stage, runner};
use crate::reload::ReloadMessage;
use crate::{debug, log};

pub use error::TaskError;

/// One node of a task tree.
pub enum TaskNode {
    /// Run a pipeline stage.
    Stage(Stage),
    /// Remove a directory tree (missing directory is a no-op).
    Clean(std::path::PathBuf),
    /// Broadcast a full reload with the given reason.
    Notify(String),
    /// Run children in order, stopping at the first failure.
    Sequence(Vec<TaskNode>),
    /// Run children concurrently, collecting every failure.
    Parallel(Vec<TaskNode>),
}

/// Named task trees, declared once and run by name.
#[derive(Default)]
pub struct TaskGraph {
    tasks: FxHashMap<String, TaskNode>,
    /// Declaration order, for stable listings.
    order: Vec<String>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a named task. Names are unique.
    pub fn declare(&mut self, name: impl Into<String>, node: TaskNode) -> Result<(), TaskError> {
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(TaskError::Duplicate(name));
        }
        self.order.push(name.clone());
        self.tasks.insert(name, node);
        Ok(())
    }

    /// Declared task names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Look up a declared task.
    pub fn get(&self, name: &str) -> Option<&TaskNode> {
        self.tasks.get(name)
    }

    /// Run a declared task to completion.
    pub fn run(&self, name: &str, ctx: &RunContext) -> Result<RunResult, TaskError> {
        let node = self
            .tasks
            .get(name)
            .ok_or_else(|| TaskError::Unknown(name.to_string()))?;
        debug!("task"; "running `{}`", name);
        run_node(node, ctx)
    }
}

fn run_node(node: &TaskNode, ctx: &RunContext) -> Result<RunResult, TaskError> {
    match node {
        TaskNode::Stage(stage) => Ok(runner::run_stage(stage, ctx)?),

        TaskNode::Clean(path) => {
            if path.exists() {
                log!("task"; "clean {}", path.display());
                std::fs::remove_dir_all(path).map_err(|source| TaskError::Clean {
                    path: path.clone(),
                    source,
                })?;
            }
            Ok(RunResult::default())
        }

        TaskNode::Notify(reason) => {
            if let Some(hub) = ctx.hub {
                hub.notify(&ReloadMessage::reload_with_reason(reason.clone()));
            }
            Ok(RunResult::default())
        }

        TaskNode::Sequence(children) => {
            let mut report = RunResult::default();
            for (step, child) in children.iter().enumerate() {
                match run_node(child, ctx) {
                    Ok(result) => report.merge(result),
                    Err(source) => {
                        return Err(TaskError::SequenceAbort {
                            step,
                            source: Box::new(source),
                        });
                    }
                }
            }
            Ok(report)
        }

        TaskNode::Parallel(children) => {
            let results: Vec<_> = children.par_iter().map(|c| run_node(c, ctx)).collect();

            let mut report = RunResult::default();
            let mut errors = Vec::new();
            for result in results {
                match result {
                    Ok(r) => report.merge(r),
                    Err(e) => errors.push(e),
                }
            }
            if errors.is_empty() {
                Ok(report)
            } else {
                Err(TaskError::ParallelFailure(errors))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use crate::pipeline::RunRecords;

    fn ctx<'a>(
        build: &'a BuildConfig,
        records: &'a RunRecords,
        root: &std::path::Path,
    ) -> RunContext<'a> {
        RunContext::new(build, records, root)
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        let mut graph = TaskGraph::new();
        graph.declare("clean", TaskNode::Clean("x".into())).unwrap();
        assert!(matches!(
            graph.declare("clean", TaskNode::Clean("y".into())),
            Err(TaskError::Duplicate(_))
        ));
    }

    #[test]
    fn test_unknown_task() {
        let dir = tempfile::tempdir().unwrap();
        let build = BuildConfig::default();
        let records = RunRecords::new();
        let graph = TaskGraph::new();
        assert!(matches!(
            graph.run("nope", &ctx(&build, &records, dir.path())),
            Err(TaskError::Unknown(_))
        ));
    }

    #[test]
    fn test_clean_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let build = BuildConfig::default();
        let records = RunRecords::new();
        let mut graph = TaskGraph::new();
        graph
            .declare("clean", TaskNode::Clean(dir.path().join("gone")))
            .unwrap();
        graph
            .run("clean", &ctx(&build, &records, dir.path()))
            .unwrap();
    }

    #[test]
    fn test_sequence_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        // A Clean pointed at a file fails with NotADirectory.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let build = BuildConfig::default();
        let records = RunRecords::new();
        let mut graph = TaskGraph::new();
        graph
            .declare(
                "seq",
                TaskNode::Sequence(vec![
                    TaskNode::Clean(blocker),
                    TaskNode::Clean(marker.clone()),
                ]),
            )
            .unwrap();

        let err = graph
            .run("seq", &ctx(&build, &records, dir.path()))
            .unwrap_err();
        assert!(matches!(err, TaskError::SequenceAbort { step: 0, .. }));
    }

    #[test]
    fn test_parallel_collects_all_failures() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"x").unwrap();

        let build = BuildConfig::default();
        let records = RunRecords::new();
        let mut graph = TaskGraph::new();
        graph
            .declare(
                "par",
                TaskNode::Parallel(vec![
                    TaskNode::Clean(a),
                    TaskNode::Clean(dir.path().join("missing")),
                    TaskNode::Clean(b),
                ]),
            )
            .unwrap();

        match graph
            .run("par", &ctx(&build, &records, dir.path()))
            .unwrap_err()
        {
            TaskError::ParallelFailure(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected ParallelFailure, got {other}"),
        }
    }

    #[test]
    fn test_parallel_failures_keep_sibling_output() {
        use crate::pipeline::ReloadAction;
        use crate::transform::TransformKind;

        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("fonts");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("body.woff2"), b"wOF2").unwrap();
        // Clean pointed at a regular file fails with NotADirectory
        let bad_a = dir.path().join("bad-a");
        let bad_b = dir.path().join("bad-b");
        std::fs::write(&bad_a, b"x").unwrap();
        std::fs::write(&bad_b, b"x").unwrap();

        let build = BuildConfig::default();
        let records = RunRecords::new();
        let mut graph = TaskGraph::new();
        graph
            .declare(
                "par",
                TaskNode::Parallel(vec![
                    TaskNode::Stage(Stage {
                        name: "fonts".into(),
                        input_root: src,
                        glob: "**/*".into(),
                        output_dir: dir.path().join("dist/fonts"),
                        transform: TransformKind::Copy,
                        incremental: false,
                        reload: ReloadAction::Full,
                    }),
                    TaskNode::Clean(bad_a),
                    TaskNode::Clean(bad_b),
                ]),
            )
            .unwrap();

        match graph
            .run("par", &ctx(&build, &records, dir.path()))
            .unwrap_err()
        {
            TaskError::ParallelFailure(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected ParallelFailure, got {other}"),
        }
        // Failing siblings never roll back the child that succeeded
        assert!(dir.path().join("dist/fonts/body.woff2").exists());
    }

    #[test]
    fn test_names_in_declaration_order() {
        let mut graph = TaskGraph::new();
        graph.declare("b", TaskNode::Notify("b".into())).unwrap();
        graph.declare("a", TaskNode::Notify("a".into())).unwrap();
        let names: Vec<_> = graph.names().collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
