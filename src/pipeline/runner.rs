//! Stage execution.
//!
//! One call = one batch: scan, select, transform, write, record, notify.
//! Per-file failures are collected and reported; only a failure that
//! prevents the batch from running at all (bad pattern, unusable output
//! root) is an error.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

use crate::reload::ReloadMessage;
use crate::utils::relative_display;
use crate::{debug, log};

use super::{ReloadAction, RunContext, RunResult, Stage, StageFatal, scan, selector};

/// Run one stage batch.
pub fn run_stage(stage: &Stage, ctx: &RunContext) -> Result<RunResult, StageFatal> {
    let started = SystemTime::now();

    let all = scan::scan_inputs(stage)?;
    let total = all.len();
    let files = if stage.incremental {
        selector::filter_changed(all, ctx.records.last_run(&stage.name))
    } else {
        all
    };

    let mut result = RunResult {
        skipped: total - files.len(),
        ..RunResult::default()
    };

    if files.is_empty() {
        ctx.records.mark_completed(&stage.name, started);
        debug!("pipeline"; "{}: nothing to do ({} unchanged)", stage.name, result.skipped);
        return Ok(result);
    }

    std::fs::create_dir_all(&stage.output_dir).map_err(|source| StageFatal::OutputRoot {
        path: stage.output_dir.clone(),
        source,
    })?;

    let mut outputs = Vec::new();
    for path in &files {
        match process_file(stage, path, ctx) {
            Ok(dest) => {
                result.processed += 1;
                if ctx.log_files {
                    log!("pipeline"; "{}: {}", stage.name, relative_display(&dest, &ctx.site_root));
                }
                outputs.push(dest);
            }
            Err(e) => {
                log!("error"; "{}: {}: {:#}", stage.name, path.display(), e);
                result.failures.push((path.clone(), format!("{e:#}")));
            }
        }
    }

    ctx.records.mark_completed(&stage.name, started);
    notify_batch(stage, ctx, &outputs);

    Ok(result)
}

/// Transform one input file and write the output, mirroring the input's
/// path relative to the stage root under the output directory.
fn process_file(stage: &Stage, path: &Path, ctx: &RunContext) -> Result<PathBuf> {
    let rel = path
        .strip_prefix(&stage.input_root)
        .with_context(|| format!("input outside stage root {}", stage.input_root.display()))?;

    let mut dest = stage.output_dir.join(rel);
    if let Some(ext) = stage.transform.output_extension() {
        dest.set_extension(ext);
    }

    let content = std::fs::read(path).context("read input")?;
    let output = stage
        .transform
        .apply(&content, path, ctx.build)
        .map_err(anyhow::Error::from)?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(&dest, output).with_context(|| format!("write {}", dest.display()))?;

    Ok(dest)
}

/// One notification per non-empty batch. A batch producing exactly one
/// stylesheet becomes a CSS swap; anything else is a full reload.
fn notify_batch(stage: &Stage, ctx: &RunContext, outputs: &[PathBuf]) {
    let Some(hub) = ctx.hub else { return };
    if let Some(msg) = batch_message(stage, &ctx.site_root, outputs) {
        hub.notify(&msg);
    }
}

/// The swap fast path needs a URL the browser can fetch, so it only
/// applies when the single stylesheet landed under the served root.
fn batch_message(stage: &Stage, site_root: &Path, outputs: &[PathBuf]) -> Option<ReloadMessage> {
    if outputs.is_empty() {
        return None;
    }

    Some(match stage.reload {
        ReloadAction::None => return None,
        ReloadAction::Full => ReloadMessage::reload_with_reason(stage.name.clone()),
        ReloadAction::Styles => match &outputs[..] {
            [only]
                if only.extension().is_some_and(|e| e == "css")
                    && only.starts_with(site_root) =>
            {
                ReloadMessage::css(site_url(only, site_root))
            }
            _ => ReloadMessage::reload_with_reason(stage.name.clone()),
        },
    })
}

/// Site-relative URL for an output file, e.g. `/assets/css/main.css`.
fn site_url(output: &Path, site_root: &Path) -> String {
    let rel = output.strip_prefix(site_root).unwrap_or(output);
    let mut url = String::from("/");
    url.push_str(&rel.to_string_lossy().replace('\\', "/"));
    url
}
