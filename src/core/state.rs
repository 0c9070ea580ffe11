//! Ctrl+C handling.
//!
//! One-shot commands and the `dev` prelude have nothing to wind down, so
//! Ctrl+C exits at once. Once `dev` has registered its HTTP server, the
//! handler instead unblocks that server and tells the watch loop to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam::channel::Sender;
use tiny_http::Server;

/// Exit code of a process ended by SIGINT.
const INTERRUPTED: i32 = 130;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// What a running dev session needs to hear about Ctrl+C.
struct Session {
    server: Arc<Server>,
    stop_watch: Sender<()>,
}

static SESSION: OnceLock<Session> = OnceLock::new();

/// Install the Ctrl+C handler. Call once, first thing in `main`.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        let Some(session) = SESSION.get() else {
            std::process::exit(INTERRUPTED);
        };
        crate::log!("serve"; "shutting down...");
        let _ = session.stop_watch.send(());
        session.server.unblock();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Hand the dev session's server and watch-loop channel to the handler.
pub fn register_server(server: Arc<Server>, stop_watch: Sender<()>) {
    let _ = SESSION.set(Session { server, stop_watch });
}

/// Whether Ctrl+C has been received.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
