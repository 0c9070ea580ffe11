//! One-shot commands: a single leaf task or the `build` graph.
//!
//! Transform failures are reported and the command still succeeds;
//! filesystem errors end it with a non-zero exit.

use std::time::Instant;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use crate::config::PipelineConfig;
use crate::{debug, log};
use crate::task::{RunSummary, Runner, Step, TaskContext, TaskKind};
use crate::utils::plural::plural_count;

/// Multi-thread runtime hosting the task graph.
pub fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .context("Failed to start async runtime")
}

/// Run `step` to completion and log a one-line summary.
pub fn run_step(config: &PipelineConfig, step: Step) -> Result<RunSummary> {
    let ctx = TaskContext::from_config(config)?;
    let runner = Runner::new(ctx);
    let started = Instant::now();

    let label = step.to_string();
    debug!("build"; "{} ({})", label, plural_count(step.tasks().len(), "task"));
    let summary = runtime()?
        .block_on(runner.run(step))
        .with_context(|| format!("{label} aborted"))?;

    log_summary(&summary, started);
    Ok(summary)
}

fn log_summary(summary: &RunSummary, started: Instant) {
    for kind in TaskKind::ALL {
        if let Some(report) = summary.report(kind) {
            debug!("build"; "{}: {}", kind, report.describe());
        }
    }

    let elapsed = started.elapsed().as_millis();
    if summary.is_success() {
        log!("build"; "done: {} in {} ms", plural_count(summary.written(), "file"), elapsed);
    } else {
        log!(
            "build";
            "finished with {} ({}): {} in {} ms",
            plural_count(summary.failures.len(), "error"),
            failed_tasks(summary),
            plural_count(summary.written(), "file"),
            elapsed
        );
    }
}

/// Names of the tasks that failed, in declaration order.
fn failed_tasks(summary: &RunSummary) -> String {
    TaskKind::ALL
        .into_iter()
        .filter(|&kind| summary.failed(kind))
        .map(TaskKind::name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> PipelineConfig {
        PipelineConfig {
            root: dir.path().to_path_buf(),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_build_with_broken_stylesheet_succeeds() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/scss")).unwrap();
        fs::write(dir.path().join("src/index.html"), "<p/>").unwrap();
        fs::write(dir.path().join("src/scss/main.scss"), ".a {").unwrap();

        let summary = run_step(&config(&dir), Step::build()).unwrap();
        assert!(summary.failed(TaskKind::Css));
        assert_eq!(failed_tasks(&summary), "css");
        assert!(dir.path().join("dist/index.html").exists());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = run_step(&config(&dir), TaskKind::Html.into()).unwrap_err();
        assert!(err.to_string().contains("html aborted"));
    }
}
