//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! debounce_ms = 300   # quiet period before a batch of changes is rebuilt
//! cooldown_ms = 800   # minimum time between two rebuilds
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File watcher timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub debounce_ms: u64,
    pub cooldown_ms: u64,
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            cooldown_ms: 800,
        }
    }
}
