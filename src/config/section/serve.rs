//! `[serve]` section configuration.
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"   # "0.0.0.0" exposes the dev server on the LAN
//! port = 3000               # HTTP
//! reload_port = 35729       # live reload WebSocket
//! ```
//!
//! A busy port is retried upwards, so the bound ports may differ.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Dev server addresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub interface: IpAddr,
    pub port: u16,
    pub reload_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            reload_port: 35729,
        }
    }
}
