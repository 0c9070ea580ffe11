//! Pipeline configuration from the optional `frontline.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [serve], [watch], [css], [images]
//! ├── error.rs       # ConfigError, ConfigDiagnostics
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! Source and destination directories are fixed (`src/`, `dist/`); the
//! file only tunes the dev server, the watcher and the transforms. A
//! missing file means all defaults.

mod error;
pub mod section;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{CssConfig, ImagesConfig, ServeConfig, WatchConfig};

use crate::{cli::Cli, core::ProjectPaths, debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file looked up at the project root when `-C` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "frontline.toml";

/// Root configuration structure representing frontline.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Project root directory (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// File watcher settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// Stylesheet settings
    #[serde(default)]
    pub css: CssConfig,

    /// Raster image settings
    #[serde(default)]
    pub images: ImagesConfig,
}

impl PipelineConfig {
    /// Load configuration from CLI arguments.
    ///
    /// The project root is `--root` (relative to cwd) or cwd itself.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let root = match &cli.root {
            Some(root) => cwd.join(root),
            None => cwd,
        };
        let config_path = root.join(&cli.config);

        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else if cli.config != Path::new(DEFAULT_CONFIG_FILE) {
            // an explicit `-C` must point at a file
            return Err(ConfigError::NotFound(config_path).into());
        } else {
            debug!("config"; "{} not found, using defaults", cli.config.display());
            Self::default()
        };

        config.root = root;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Check field values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diagnostics = ConfigDiagnostics::new();

        if self.serve.port != 0 && self.serve.port == self.serve.reload_port {
            diagnostics.error("serve.reload_port", "must differ from serve.port");
        }
        if self.watch.debounce_ms == 0 {
            diagnostics.error("watch.debounce_ms", "must be greater than 0");
        }
        if !(1..=100).contains(&self.images.jpeg_quality) {
            diagnostics.error("images.jpeg_quality", "must be between 1 and 100");
        }
        if let Err(e) = crate::transform::css::resolve_targets(&self.css.browsers) {
            diagnostics.error("css.browsers", e);
        }

        diagnostics.into_result()
    }

    /// Source and destination layout rooted at this project.
    pub fn paths(&self) -> ProjectPaths {
        ProjectPaths::new(&self.root)
    }
}

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
