//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::task::TaskKind;

/// Front-end asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Project root containing `src/` (default: current directory)
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Config file path, relative to the project root
    #[arg(short = 'C', long, global = true, default_value = DEFAULT_CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Remove the `dist/` directory
    Cleaning,

    /// Copy top-level HTML pages into `dist/`
    Html,

    /// Expand `@@include` directives of `src/index.html` into `dist/`
    #[command(name = "processHtml", visible_alias = "process-html")]
    ProcessHtml,

    /// Expand layout partials in memory (writes nothing)
    #[command(name = "layoutProcessHtml", visible_alias = "layout-process-html")]
    LayoutProcessHtml,

    /// Compile, prefix and minify stylesheets into `dist/css/`
    Css,

    /// Copy fonts into `dist/fonts/`
    Font,

    /// Recompress raster images into `dist/img/`
    Images,

    /// Minify SVG images into `dist/img/`
    Svg,

    /// Clean, then run html, css, font, images and svg in parallel
    #[command(visible_alias = "b")]
    Build,

    /// Build, expand HTML, then serve `dist/` with live reload
    #[command(visible_alias = "d")]
    Dev,
}

impl Commands {
    /// The leaf task a command runs on its own, if any.
    pub const fn task(self) -> Option<TaskKind> {
        match self {
            Self::Cleaning => Some(TaskKind::Cleaning),
            Self::Html => Some(TaskKind::Html),
            Self::ProcessHtml => Some(TaskKind::ProcessHtml),
            Self::LayoutProcessHtml => Some(TaskKind::LayoutProcessHtml),
            Self::Css => Some(TaskKind::Css),
            Self::Font => Some(TaskKind::Font),
            Self::Images => Some(TaskKind::Images),
            Self::Svg => Some(TaskKind::Svg),
            Self::Build | Self::Dev => None,
        }
    }
}
