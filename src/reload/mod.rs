//! Reload Module
//!
//! WebSocket-based live reload for `dev`.
//!
//! ```text
//! watch loop --[HotReloadMessage]--> ReloadServer --[JSON]--> Browser
//! ```
//!
//! # Modules
//!
//! - `message` - Hot reload message types (connected, reload, css)
//! - `server` - WebSocket server owning the client set

pub mod message;
pub mod server;

pub use message::HotReloadMessage;
pub use server::ReloadServer;
