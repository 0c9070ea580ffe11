//! Async execution of task graphs.
//!
//! Leaves run on the blocking pool; sequences await each step in turn;
//! parallel groups join every member before returning.
//!
//! Error policy:
//! - a [`TransformError`](super::TransformError) is logged and recorded in
//!   the [`RunSummary`]; sibling steps keep going.
//! - any other error aborts the surrounding sequence. A parallel group lets
//!   its members finish first, then returns the first such error.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::JoinSet;

use super::{Step, TaskContext, TaskError, TaskKind, TaskReport};
use crate::{debug, log};

type StepFuture = Pin<Box<dyn Future<Output = Result<RunSummary, TaskError>> + Send + 'static>>;

/// A task that failed with a recoverable error.
#[derive(Debug)]
pub struct TaskFailure {
    pub task: TaskKind,
    pub error: TaskError,
}

/// Outcome of a step: reports of successful tasks plus recovered failures.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<TaskReport>,
    pub failures: Vec<TaskFailure>,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.reports.extend(other.reports);
        self.failures.extend(other.failures);
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of files written.
    pub fn written(&self) -> usize {
        self.reports.iter().map(|r| r.written.len()).sum()
    }

    pub fn report(&self, task: TaskKind) -> Option<&TaskReport> {
        self.reports.iter().find(|r| r.task == task)
    }

    pub fn failed(&self, task: TaskKind) -> bool {
        self.failures.iter().any(|f| f.task == task)
    }
}

/// Executes [`Step`]s against a shared [`TaskContext`].
#[derive(Debug, Clone)]
pub struct Runner {
    ctx: Arc<TaskContext>,
    /// Per-task progress goes to `debug!` instead of `log!`.
    quiet: bool,
}

impl Runner {
    pub fn new(ctx: TaskContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            quiet: false,
        }
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn context(&self) -> &TaskContext {
        &self.ctx
    }

    /// Run `step` to completion.
    pub fn run(&self, step: Step) -> StepFuture {
        let runner = self.clone();
        Box::pin(async move {
            match step {
                Step::Task(kind) => runner.run_task(kind).await,
                Step::Sequence(steps) => runner.run_sequence(steps).await,
                Step::Parallel(steps) => runner.run_parallel(steps).await,
            }
        })
    }

    async fn run_task(&self, kind: TaskKind) -> Result<RunSummary, TaskError> {
        self.progress(kind, "started");

        let ctx = Arc::clone(&self.ctx);
        let result = tokio::task::spawn_blocking(move || kind.run(&ctx))
            .await
            .map_err(|_| TaskError::Aborted {
                step: kind.name().to_string(),
            })?;

        let mut summary = RunSummary::default();
        match result {
            Ok(report) => {
                self.progress(
                    kind,
                    &format!(
                        "completed ({}, {} ms)",
                        report.describe(),
                        report.elapsed.as_millis()
                    ),
                );
                summary.reports.push(report);
            }
            Err(error) if !error.is_fatal() => {
                if self.quiet {
                    debug!("error"; "{}: {}", kind, error);
                } else {
                    log!("error"; "{}: {}", kind, error);
                }
                summary.failures.push(TaskFailure { task: kind, error });
            }
            Err(error) => return Err(error),
        }
        Ok(summary)
    }

    async fn run_sequence(&self, steps: Vec<Step>) -> Result<RunSummary, TaskError> {
        let mut summary = RunSummary::default();
        for step in steps {
            summary.merge(self.run(step).await?);
        }
        Ok(summary)
    }

    async fn run_parallel(&self, steps: Vec<Step>) -> Result<RunSummary, TaskError> {
        let mut set = JoinSet::new();
        for step in steps {
            let label = step.to_string();
            let future = self.run(step);
            set.spawn(async move { (label, future.await) });
        }

        let mut summary = RunSummary::default();
        let mut fatal = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(member))) => summary.merge(member),
                Ok((label, Err(error))) => {
                    debug!("error"; "{} failed: {}", label, error);
                    fatal.get_or_insert(error);
                }
                Err(_) => {
                    fatal.get_or_insert(TaskError::Aborted {
                        step: "parallel group".to_string(),
                    });
                }
            }
        }

        match fatal {
            Some(error) => Err(error),
            None => Ok(summary),
        }
    }

    fn progress(&self, kind: TaskKind, message: &str) {
        if self.quiet {
            debug!(kind.name(); "{}", message);
        } else {
            log!(kind.name(); "{}", message);
        }
    }
}
