//! WebSocket Server for Live Reload
//!
//! An acceptor thread performs the handshake and registers clients; a reader
//! thread polls them so closed connections are dropped. Broadcasting happens
//! on the caller's thread.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::message::HotReloadMessage;
use crate::{debug, log};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Poll interval of the acceptor and reader threads
const POLL_INTERVAL: Duration = Duration::from_millis(100);

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Live-reload service owned by the dev session.
pub struct ReloadServer {
    port: u16,
    clients: Clients,
    running: Arc<AtomicBool>,
}

impl ReloadServer {
    /// Bind to `interface:base_port`, trying the next ports when busy, and
    /// start accepting clients.
    pub fn bind(interface: IpAddr, base_port: u16) -> Result<Self> {
        let (listener, port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
        listener.set_nonblocking(true)?;

        let server = Self {
            port,
            clients: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(true)),
        };

        let clients = Arc::clone(&server.clients);
        let running = Arc::clone(&server.running);
        thread::spawn(move || accept_loop(listener, clients, running));

        let clients = Arc::clone(&server.clients);
        let running = Arc::clone(&server.running);
        thread::spawn(move || reader_loop(clients, running));

        Ok(server)
    }

    /// Actual bound port
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Send `msg` to every client, dropping the ones that fail.
    ///
    /// Returns the number of clients reached.
    pub fn broadcast(&self, msg: &HotReloadMessage) -> usize {
        let text = Message::Text(msg.to_json().into());
        let mut clients = self.clients.lock();

        if clients.is_empty() {
            debug!("reload"; "no clients connected");
            return 0;
        }

        clients.retain_mut(|ws| match ws.send(text.clone()) {
            Ok(()) => true,
            Err(e) => {
                debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        debug!("reload"; "broadcast to {} clients", clients.len());
        clients.len()
    }

    /// Stop accepting and close every client.
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut clients = self.clients.lock();
        for mut ws in clients.drain(..) {
            let _ = ws.close(None);
            let _ = ws.flush();
        }
        debug!("reload"; "shut down");
    }
}

impl Drop for ReloadServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn accept_loop(listener: TcpListener, clients: Clients, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                debug!("reload"; "client connected: {}", addr);
                add_client(stream, &clients);
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                log!("reload"; "accept error: {}", e);
                thread::sleep(POLL_INTERVAL);
            }
        }
    }
}

fn add_client(stream: TcpStream, clients: &Clients) {
    // Blocking for the handshake, non-blocking afterwards for polling reads
    let _ = stream.set_nonblocking(false);
    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            log!("reload"; "handshake failed: {}", e);
            return;
        }
    };
    let _ = ws.get_ref().set_nonblocking(true);

    // Greet and register under one lock; a broadcast sees both or neither.
    let mut clients = clients.lock();
    let connected = Message::Text(HotReloadMessage::connected().to_json().into());
    if let Err(e) = ws.send(connected) {
        log!("reload"; "failed to send connected message: {}", e);
        return;
    }
    clients.push(ws);
    debug!("reload"; "client registered (total: {})", clients.len());
}

fn reader_loop(clients: Clients, running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        thread::sleep(POLL_INTERVAL);

        clients.lock().retain_mut(|ws| match ws.read() {
            Ok(Message::Close(_)) => false,
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => true,
            Err(_) => false,
        });
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
