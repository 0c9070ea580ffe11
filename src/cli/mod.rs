//! Command-line interface module.
//!
//! - `args` - clap definitions
//! - `build` - single tasks and `build`
//! - `dev` - prelude, servers and the watch loop

mod args;
pub mod build;
pub mod dev;

pub use args::{Cli, Commands};
