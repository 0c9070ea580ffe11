//! `dev`: build, expand HTML, then serve `dist/` and rebuild on change.
//!
//! ```text
//! prelude (Step::dev) → bind ReloadServer → bind StaticServer → WatchLoop
//! ```
//!
//! Ctrl+C stops the watch loop, unblocks the HTTP server and closes the
//! WebSocket clients.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::core::register_server;
use crate::reload::ReloadServer;
use crate::serve::StaticServer;
use crate::task::{Runner, Step, TaskContext};
use crate::utils::plural::plural_count;
use crate::watch::WatchLoop;
use crate::{debug, log};

use super::build::runtime;

pub fn run_dev(config: &PipelineConfig) -> Result<()> {
    let ctx = TaskContext::from_config(config)?;
    let runner = Runner::new(ctx);
    let rt = runtime()?;

    let summary = rt
        .block_on(runner.run(Step::dev()))
        .context("dev prelude aborted")?;
    if !summary.is_success() {
        log!("dev"; "prelude finished with errors, watching for fixes");
    }

    let serve = &config.serve;
    let reload = ReloadServer::bind(serve.interface, serve.reload_port)
        .context("Failed to start reload server")?;
    debug!("reload"; "ws://{}:{}", serve.interface, reload.port());

    let server = StaticServer::bind(serve.interface, serve.port)
        .context("Failed to start HTTP server")?;
    let handle = server.handle();
    log!("serve"; "http://{}", server.addr());

    let (shutdown_tx, shutdown_rx) = crossbeam::channel::unbounded();
    register_server(Arc::clone(&handle), shutdown_tx);

    let http = server.spawn(config.paths().dist(), reload.port());

    let watch = WatchLoop::new(runner, &reload, &config.watch)?;
    rt.block_on(watch.run(shutdown_rx));

    handle.unblock();
    debug!("reload"; "closing {}", plural_count(reload.client_count(), "client"));
    reload.shutdown();
    if http.join().is_err() {
        debug!("serve"; "request loop panicked");
    }
    log!("dev"; "stopped");
    Ok(())
}
