//! Build command: the full production pipeline, optionally followed by
//! a watch + serve session over dist.

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::graph::{TaskGraph, TaskNode};
use crate::logger::is_verbose;
use crate::pipeline::{ReloadAction, RunContext, RunRecords, RunResult, Stage, stages};
use crate::reload::ReloadHub;
use crate::serve::{self, PhpBackend};
use crate::watch::WatchCoordinator;
use crate::log;

/// Declare the production tasks: each stage by name plus the composite
/// `build` tree. Stages that neither read nor write the same paths run
/// in parallel; everything ordered stays in sequence.
/// The build session serves dist, so Sass output under `src/assets/css`
/// has no fetchable URL; the css stage that picks it up announces the
/// stylesheet swap instead.
fn scss_stage(config: &PipelineConfig) -> Stage {
    let mut stage = stages::scss(config);
    stage.reload = ReloadAction::None;
    stage
}

pub fn declare_tasks(graph: &mut TaskGraph, config: &PipelineConfig, php: bool) -> Result<()> {
    graph.declare("clean", TaskNode::Clean(config.dist_dir()))?;
    graph.declare("html", TaskNode::Stage(stages::html(config)))?;
    graph.declare("scss", TaskNode::Stage(scss_stage(config)))?;
    graph.declare("css", TaskNode::Stage(stages::css(config)))?;
    graph.declare("js", TaskNode::Stage(stages::js(config)))?;
    graph.declare("images", TaskNode::Stage(stages::images(config)))?;
    graph.declare("fonts", TaskNode::Stage(stages::fonts(config)))?;
    if php {
        graph.declare("php", TaskNode::Stage(stages::php(config)))?;
    }

    let mut steps = vec![
        TaskNode::Clean(config.dist_dir()),
        TaskNode::Stage(stages::html(config)),
    ];
    if php {
        steps.push(TaskNode::Stage(stages::php(config)));
    }
    // scss feeds css, so those two stay ordered before the parallel tail
    steps.push(TaskNode::Stage(scss_stage(config)));
    steps.push(TaskNode::Stage(stages::css(config)));
    steps.push(TaskNode::Parallel(vec![
        TaskNode::Stage(stages::js(config)),
        TaskNode::Stage(stages::images(config)),
        TaskNode::Stage(stages::fonts(config)),
    ]));
    graph.declare("build", TaskNode::Sequence(steps))?;
    Ok(())
}

/// Wire watch bindings for the production graph: each asset family
/// re-runs its own stage. Sass output lands in `src/assets/css`, which
/// the css binding picks up as a follow-up batch.
fn bind_watchers(
    coordinator: &mut WatchCoordinator,
    config: &PipelineConfig,
    php: bool,
) -> Result<()> {
    let src = config.src_dir();
    coordinator.watch_root(&src);
    coordinator.bind(&src, "**/*.html", "html")?;
    if php {
        coordinator.bind(&src, "**/*.php", "php")?;
    }
    coordinator.bind(&src.join("assets/scss"), "**/*.scss", "scss")?;
    coordinator.bind(&src.join("assets/css"), "**/*.css", "css")?;
    coordinator.bind(&src.join("assets/js"), "**/*.js", "js")?;
    coordinator.bind(&src.join("assets/img"), "**/*", "images")?;
    coordinator.bind(&src.join("assets/fonts"), "**/*", "fonts")?;
    Ok(())
}

/// Entry point for `pipewright build`.
pub fn run(config: &PipelineConfig, php: bool, with_serve: bool) -> Result<()> {
    let mut graph = TaskGraph::new();
    declare_tasks(&mut graph, config, php)?;

    let records = RunRecords::new();
    let dist = config.dist_dir();

    if !with_serve {
        let ctx = RunContext::new(&config.build, &records, &dist).logging_files(is_verbose());
        let report = graph.run("build", &ctx).context("build failed")?;
        summarize(&report);
        if !report.is_clean() {
            anyhow::bail!("{} file(s) failed to build", report.failures.len());
        }
        return Ok(());
    }

    // build, then keep the session alive: watch src, serve dist
    let hub = config
        .serve
        .watch
        .then(|| ReloadHub::start(config.serve.ws_port))
        .transpose()?;

    let mut ctx = RunContext::new(&config.build, &records, &dist).logging_files(is_verbose());
    if let Some(hub) = &hub {
        ctx = ctx.with_hub(hub);
    }

    let report = graph.run("build", &ctx).context("build failed")?;
    summarize(&report);

    let backend = php
        .then(|| PhpBackend::spawn(&config.php, &dist))
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

        let served = bound.run(&dist, backend);

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

/// Log the batch summary the way one-shot builds report it.
fn summarize(report: &RunResult) {
    if report.failures.is_empty() {
        log!("build"; "{} file(s) processed, {} unchanged", report.processed, report.skipped);
    } else {
        for (path, reason) in &report.failures {
            log!("error"; "{}: {}", path.display(), reason);
        }
        log!("build"; "{} file(s) processed, {} failed", report.processed, report.failures.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_declared_task_names() {
        let config = PipelineConfig::default().with_root(Path::new("/proj"));
        let mut graph = TaskGraph::new();
        declare_tasks(&mut graph, &config, false).unwrap();

        for name in ["clean", "html", "scss", "css", "js", "images", "fonts", "build"] {
            assert!(graph.contains(name), "missing task {name}");
        }
        assert!(!graph.contains("php"));
    }

    #[test]
    fn test_build_scss_stage_does_not_announce_styles() {
        let config = PipelineConfig::default().with_root(Path::new("/proj"));
        let mut graph = TaskGraph::new();
        declare_tasks(&mut graph, &config, false).unwrap();

        match graph.get("scss") {
            Some(TaskNode::Stage(stage)) => assert_eq!(stage.reload, ReloadAction::None),
            _ => panic!("expected scss stage"),
        }
    }

    #[test]
    fn test_php_task_declared_on_request() {
        let config = PipelineConfig::default().with_root(Path::new("/proj"));
        let mut graph = TaskGraph::new();
        declare_tasks(&mut graph, &config, true).unwrap();
        assert!(graph.contains("php"));
    }

    #[test]
    fn test_full_build_produces_dist() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("assets/scss")).unwrap();
        std::fs::create_dir_all(src.join("assets/js")).unwrap();
        std::fs::write(
            src.join("index.html"),
            "<html><body>  <p>hi</p>  </body></html>",
        )
        .unwrap();
        std::fs::write(src.join("assets/scss/main.scss"), "body { margin: 0 }").unwrap();
        std::fs::write(src.join("assets/js/app.js"), "const answer = 40 + 2;").unwrap();

        let config = PipelineConfig::default().with_root(dir.path());
        run(&config, false, false).unwrap();

        let dist = dir.path().join("dist");
        assert!(dist.join("index.html").exists());
        assert!(dist.join("assets/css/main.css").exists());
        assert!(dist.join("assets/js/app.js").exists());
        // intermediate sass output lands in src
        assert!(src.join("assets/css/main.css").exists());
    }

    #[test]
    fn test_build_fails_on_broken_input() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("assets/scss")).unwrap();
        std::fs::write(src.join("assets/scss/main.scss"), "body { color: $missing }").unwrap();

        let config = PipelineConfig::default().with_root(dir.path());
        assert!(run(&config, false, false).is_err());
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("index.html"), "<p>hi</p>").unwrap();

        let stale = dir.path().join("dist/stale.txt");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        let config = PipelineConfig::default().with_root(dir.path());
        run(&config, false, false).unwrap();

        assert!(!stale.exists());
        assert!(PathBuf::from(dir.path().join("dist/index.html")).exists());
    }
}
