//! Core types shared across the codebase.

mod paths;
mod state;

pub use paths::{ProjectPaths, to_slash};
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
