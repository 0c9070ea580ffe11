//! Hot Reload Message Protocol
//!
//! JSON messages sent from the reload server to browser clients.
//!
//! # Message Types
//!
//! - `connected`: sent once after the handshake
//! - `reload`: full page reload
//! - `css`: re-fetch stylesheets in place

use serde::{Deserialize, Serialize};

/// Hot reload message sent over WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },

    /// Full page reload
    Reload {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Stylesheets changed; pages swap `<link rel="stylesheet">` without reloading
    Css {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl HotReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn reload(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: Some(reason.into()),
        }
    }

    pub fn css(reason: impl Into<String>) -> Self {
        Self::Css {
            reason: Some(reason.into()),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}
