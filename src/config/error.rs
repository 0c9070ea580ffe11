//! Errors from loading `frontline.toml`.

use std::fmt;
use std::path::PathBuf;

use owo_colors::{OwoColorize, Stream};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("config file `{}` not found", .0.display())]
    NotFound(PathBuf),

    #[error("invalid TOML in config file")]
    Toml(#[from] toml::de::Error),

    /// Printed in full by `Display`; no `source` so it is not repeated.
    #[error("{0}")]
    Invalid(ConfigDiagnostics),
}

/// One rejected field, e.g. `images.jpeg_quality`.
#[derive(Debug, Clone)]
struct FieldError {
    field: &'static str,
    message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field.if_supports_color(Stream::Stderr, |s| s.cyan());
        write!(f, "  {field}: {}", self.message)
    }
}

/// Validation errors, reported together.
#[derive(Debug, Default)]
pub struct ConfigDiagnostics {
    errors: Vec<FieldError>,
}

impl ConfigDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn into_result(self) -> Result<(), ConfigError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(self))
        }
    }
}

impl fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = "invalid config:".if_supports_color(Stream::Stderr, |s| s.red());
        write!(f, "{title}")?;
        for error in &self.errors {
            write!(f, "\n{error}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_io_error_names_file() {
        let err = ConfigError::Io(
            PathBuf::from("frontline.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        assert_eq!(err.to_string(), "cannot read `frontline.toml`");
    }

    #[test]
    fn test_diagnostics_into_result() {
        assert!(ConfigDiagnostics::new().into_result().is_ok());

        let mut diagnostics = ConfigDiagnostics::new();
        diagnostics.error("serve.reload_port", "must differ from serve.port");
        diagnostics.error("images.jpeg_quality", "must be between 1 and 100");
        let display = diagnostics.into_result().unwrap_err().to_string();

        assert!(display.contains("serve.reload_port"));
        assert!(display.contains("must be between 1 and 100"));
        assert_eq!(display.lines().count(), 3);
    }
}
