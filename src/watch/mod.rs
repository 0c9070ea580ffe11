//! Watch loop of the dev session.
//!
//! ```text
//! notify → Debouncer → plan_batch → Runner → ReloadServer
//! ```
//!
//! The loop is either idle or rebuilding one batch. Events keep arriving
//! while a rebuild runs; they stay in the debouncer and form the next batch
//! once the rebuild has finished and the cooldown has passed.
//!
//! # Modules
//!
//! - `debouncer` - per-path change coalescing and batch timing
//! - `binding` - glob to step table, batch planning

mod binding;
mod debouncer;

use std::time::Instant;

use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};

use crate::config::WatchConfig;
use crate::core::ProjectPaths;
use crate::logger::{is_verbose, status_detach, status_error, status_success};
use crate::reload::{HotReloadMessage, ReloadServer};
use crate::task::{RunSummary, Runner, TaskError};
use crate::utils::plural::plural_count;
use crate::{debug, log};

use binding::{Batch, ReloadKind, WatchBinding, default_bindings, plan_batch};
use debouncer::Debouncer;

type RebuildResult = Result<RunSummary, TaskError>;

enum WatchState {
    Idle,
    Rebuilding(Rebuild),
}

/// The batch in flight.
struct Rebuild {
    handle: JoinHandle<RebuildResult>,
    batch: Batch,
    started: Instant,
}

/// Watches `src/`, rebuilds affected outputs and notifies browsers.
pub struct WatchLoop<'a> {
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    events: mpsc::Receiver<notify::Event>,
    paths: ProjectPaths,
    bindings: Vec<WatchBinding>,
    debouncer: Debouncer,
    runner: Runner,
    reload: &'a ReloadServer,
    state: WatchState,
}

impl<'a> WatchLoop<'a> {
    /// Start watching the source tree. Events buffer until [`run`](Self::run).
    pub fn new(runner: Runner, reload: &'a ReloadServer, config: &WatchConfig) -> Result<Self> {
        let paths = runner.context().paths.clone();
        let source = paths.source();

        // notify delivers on its own thread; forward into the async loop
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher
            .watch(&source, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", source.display()))?;

        let (event_tx, events) = mpsc::channel(64);
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if event_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        let bindings = default_bindings()?;
        for binding in &bindings {
            debug!("watch"; "binding: {}", binding.pattern());
        }

        Ok(Self {
            _watcher: watcher,
            events,
            paths,
            bindings,
            debouncer: Debouncer::new(config.debounce(), config.cooldown()),
            runner: runner.quiet(true),
            reload,
            state: WatchState::Idle,
        })
    }

    /// Run until `shutdown` fires. A rebuild in flight is awaited first.
    pub async fn run(mut self, shutdown: crossbeam::channel::Receiver<()>) {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        std::thread::spawn(move || {
            if shutdown.recv().is_ok() {
                let _ = stop_tx.send(());
            }
        });

        log!("watch"; "watching {}", self.paths.display_relative(&self.paths.source()));

        loop {
            let idle = matches!(self.state, WatchState::Idle);
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                Some(event) = self.events.recv() => self.debouncer.add_event(&event),
                joined = rebuild_finished(&mut self.state) => self.finish(joined),
                _ = tokio::time::sleep(self.debouncer.sleep_duration()), if idle => self.dispatch(),
            }
        }

        if let WatchState::Rebuilding(rebuild) = std::mem::replace(&mut self.state, WatchState::Idle) {
            debug!("watch"; "waiting for rebuild of {}", rebuild.batch.trigger);
            let _ = rebuild.handle.await;
        }
    }

    /// Start a rebuild if idle, a batch is ready and anything in it is bound.
    fn dispatch(&mut self) {
        if !matches!(self.state, WatchState::Idle) {
            return;
        }
        let Some(changes) = self.debouncer.take_if_ready() else {
            return;
        };

        let changes: Vec<_> = changes
            .into_iter()
            .filter_map(|(path, kind)| Some((self.paths.source_relative(&path)?, kind)))
            .collect();

        let Some(batch) = plan_batch(&self.bindings, &changes) else {
            debug!("watch"; "{} ignored", plural_count(changes.len(), "change"));
            return;
        };

        let step = batch.step();
        debug!("watch"; "{} -> {}", batch.trigger, step);

        let handle = tokio::spawn(self.runner.run(step));
        self.state = WatchState::Rebuilding(Rebuild {
            handle,
            batch,
            started: Instant::now(),
        });
    }

    /// Report a finished rebuild and notify browsers.
    ///
    /// Errors are shown and the loop keeps watching.
    fn finish(&mut self, joined: Result<RebuildResult, JoinError>) {
        let WatchState::Rebuilding(rebuild) = std::mem::replace(&mut self.state, WatchState::Idle)
        else {
            return;
        };
        let Rebuild { batch, started, .. } = rebuild;
        let label = describe(&batch);

        // debug lines were printed since the last status; keep them
        if is_verbose() {
            status_detach();
        }

        match joined {
            Ok(Ok(summary)) => {
                self.notify(&batch);
                if summary.is_success() {
                    status_success(&format!(
                        "rebuilt: {} ({}, {} ms)",
                        label,
                        plural_count(summary.written(), "file"),
                        started.elapsed().as_millis()
                    ));
                } else {
                    let detail = summary
                        .failures
                        .iter()
                        .map(|f| format!("{}: {}", f.task, f.error))
                        .collect::<Vec<_>>()
                        .join("\n");
                    status_error(&format!("rebuild failed: {label}"), &detail);
                }
            }
            Ok(Err(error)) => status_error(&format!("rebuild aborted: {label}"), &error.to_string()),
            Err(error) => status_error(&format!("rebuild aborted: {label}"), &error.to_string()),
        }

        let queued = self.debouncer.pending();
        if queued > 0 {
            debug!("watch"; "{} queued during rebuild", plural_count(queued, "change"));
        }
    }

    fn notify(&self, batch: &Batch) {
        let message = match batch.reload {
            ReloadKind::Css => HotReloadMessage::css(&batch.trigger),
            ReloadKind::Full => HotReloadMessage::reload(&batch.trigger),
        };
        let reached = self.reload.broadcast(&message);
        debug!("reload"; "{} notified", plural_count(reached, "client"));
    }
}

/// Completes when the rebuild in flight does; never while idle.
async fn rebuild_finished(state: &mut WatchState) -> Result<RebuildResult, JoinError> {
    match state {
        WatchState::Rebuilding(rebuild) => (&mut rebuild.handle).await,
        WatchState::Idle => std::future::pending().await,
    }
}

/// `trigger` plus how many other matched changes the batch carries.
fn describe(batch: &Batch) -> String {
    match batch.matched {
        0 | 1 => batch.trigger.clone(),
        n => format!("{} (+{} more)", batch.trigger, n - 1),
    }
}
