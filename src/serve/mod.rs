//! Static development server for `dist/`.
//!
//! Serves built files unchanged, except HTML pages, which get the reload
//! script tag injected. The script itself is served from memory.

mod content;
mod path;
mod response;

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use tiny_http::{Request, Server};

use crate::embed::serve::RELOAD_JS_PATH;
use crate::log;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Bound HTTP server, not yet serving.
pub struct StaticServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl StaticServer {
    /// Bind to the specified interface and port, with automatic port retry.
    pub fn bind(interface: IpAddr, base_port: u16) -> Result<Self> {
        let mut last_error = None;

        for offset in 0..MAX_PORT_RETRIES {
            let port = base_port.saturating_add(offset);
            match Server::http(SocketAddr::new(interface, port)) {
                Ok(server) => {
                    if offset > 0 {
                        log!("serve"; "port {} in use, using {} instead", base_port, port);
                    }
                    let addr = server
                        .server_addr()
                        .to_ip()
                        .unwrap_or_else(|| SocketAddr::new(interface, port));
                    return Ok(Self {
                        server: Arc::new(server),
                        addr,
                    });
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(anyhow!(
            "Failed to bind after {} attempts (ports {}-{}): {}",
            MAX_PORT_RETRIES,
            base_port,
            base_port.saturating_add(MAX_PORT_RETRIES - 1),
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared handle, used to unblock the request loop on shutdown.
    pub fn handle(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Serve `root` on a dedicated thread until the server is unblocked.
    pub fn spawn(self, root: PathBuf, ws_port: u16) -> JoinHandle<()> {
        thread::spawn(move || {
            for request in self.server.incoming_requests() {
                if let Err(e) = handle_request(request, &root, ws_port) {
                    log!("serve"; "request error: {e}");
                }
            }
        })
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, root: &Path, ws_port: u16) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let url = request.url().split(['?', '#']).next().unwrap_or_default();
    if url == RELOAD_JS_PATH {
        return response::respond_reload_js(request, ws_port);
    }

    match path::resolve_path(request.url(), root) {
        Some(file) => response::respond_file(request, &file),
        None => response::respond_not_found(request),
    }
}
