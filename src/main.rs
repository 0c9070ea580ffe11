//! frontline - a front-end asset pipeline with a live-reload dev server.

mod cli;
mod config;
mod core;
mod embed;
mod logger;
mod reload;
mod serve;
mod task;
mod transform;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;
use task::Step;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = PipelineConfig::load(&cli)?;

    match (cli.command, cli.command.task()) {
        (_, Some(task)) => cli::build::run_step(&config, task.into()).map(|_| ()),
        (Commands::Dev, None) => cli::dev::run_dev(&config),
        (_, None) => cli::build::run_step(&config, Step::build()).map(|_| ()),
    }
}
