//! Dev command: serve the source tree directly, compiling Sass on
//! change and pushing reloads for everything else.
//!
//! No dist output is involved: HTML, CSS and JS are served as-is from
//! `src`, and the Sass stage writes its output into `src/assets/css`
//! where the server (or PHP backend) picks it up.

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::graph::{TaskGraph, TaskNode};
use crate::log;
use crate::pipeline::{RunContext, RunRecords, stages};
use crate::reload::ReloadHub;
use crate::serve::{self, PhpBackend};
use crate::watch::WatchCoordinator;

/// Declare the dev tasks: Sass compilation plus notify-only tasks for
/// files served straight from src.
fn declare_tasks(graph: &mut TaskGraph, config: &PipelineConfig) -> Result<()> {
    graph.declare("scss", TaskNode::Stage(stages::scss(config)))?;
    graph.declare("reload-markup", TaskNode::Notify("markup".into()))?;
    graph.declare("reload-scripts", TaskNode::Notify("scripts".into()))?;
    Ok(())
}

fn bind_watchers(
    coordinator: &mut WatchCoordinator,
    config: &PipelineConfig,
    php: bool,
) -> Result<()> {
    let src = config.src_dir();
    coordinator.watch_root(&src);
    coordinator.bind(&src.join("assets/scss"), "**/*.scss", "scss")?;
    coordinator.bind(&src, "**/*.html", "reload-markup")?;
    if php {
        coordinator.bind(&src, "**/*.php", "reload-markup")?;
    }
    coordinator.bind(&src.join("assets/js"), "**/*.js", "reload-scripts")?;
    Ok(())
}

/// Entry point for `pipewright dev`.
pub fn run(config: &PipelineConfig, php: bool) -> Result<()> {
    let src = config.src_dir();
    anyhow::ensure!(
        src.is_dir(),
        "source directory {} does not exist",
        src.display()
    );

    let mut graph = TaskGraph::new();
    declare_tasks(&mut graph, config)?;

    let records = RunRecords::new();
    let hub = config
        .serve
        .watch
        .then(|| ReloadHub::start(config.serve.ws_port))
        .transpose()?;

    let mut ctx = RunContext::new(&config.build, &records, &src).logging_files(true);
    if let Some(hub) = &hub {
        ctx = ctx.with_hub(hub);
    }

    // Initial Sass compile so the session starts with fresh styles
    let report = graph.run("scss", &ctx).context("initial sass build")?;
    if !report.is_clean() {
        log!("error"; "{} stylesheet(s) failed to compile", report.failures.len());
    }

    let backend = php
        .then(|| PhpBackend::spawn(&config.php, &src))
        .transpose()?;
    let bound = serve::bind_server(&config.serve, hub.as_ref().map(ReloadHub::port))?;

    let mut coordinator = WatchCoordinator::new(&graph);
    bind_watchers(&mut coordinator, config, php)?;

    // A fatal watch error shuts the server down and surfaces here as
    // the process exit status.
    std::thread::scope(|scope| -> Result<()> {
        let watcher = config.serve.watch.then(|| {
            let ctx = &ctx;
            let coordinator = &coordinator;
            scope.spawn(move || coordinator.run(ctx))
        });

        let served = bound.run(&src, backend);

        if let Some(handle) = watcher {
            match handle.join() {
                Ok(watched) => watched.context("watch session failed")?,
                Err(_) => anyhow::bail!("watch thread panicked"),
            }
        }
        served
    })?;

    if let Some(hub) = &hub {
        hub.shutdown();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_dev_tasks_declared() {
        let config = PipelineConfig::default().with_root(Path::new("/proj"));
        let mut graph = TaskGraph::new();
        declare_tasks(&mut graph, &config).unwrap();
        assert!(graph.contains("scss"));
        assert!(graph.contains("reload-markup"));
        assert!(graph.contains("reload-scripts"));
    }

    #[test]
    fn test_dev_scss_stage_announces_styles() {
        use crate::pipeline::ReloadAction;

        let config = PipelineConfig::default().with_root(Path::new("/proj"));
        let mut graph = TaskGraph::new();
        declare_tasks(&mut graph, &config).unwrap();

        // Dev serves src, where the compiled stylesheet actually lives
        match graph.get("scss") {
            Some(TaskNode::Stage(stage)) => assert_eq!(stage.reload, ReloadAction::Styles),
            _ => panic!("expected scss stage"),
        }
    }

    #[test]
    fn test_dev_requires_src() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::default().with_root(dir.path());
        assert!(run(&config, false).is_err());
    }
}
