//! Task error taxonomy.
//!
//! - [`TransformError`]: a single input could not be transformed. Recovered
//!   at the task boundary (logged, stream ends early).
//! - [`FsError`]: the filesystem itself failed. Propagates to the caller.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::transform::include::IncludeError;

/// A malformed input file.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{}: {}", .path.display(), .message)]
    Stylesheet { path: PathBuf, message: String },

    #[error("{}: {}", .path.display(), .source)]
    Template {
        path: PathBuf,
        #[source]
        source: IncludeError,
    },

    #[error("{}: {}", .path.display(), .message)]
    Image { path: PathBuf, message: String },

    #[error("{}: {}", .path.display(), .message)]
    Svg { path: PathBuf, message: String },
}

/// Filesystem failure while reading sources or writing outputs.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("source directory `{}` does not exist", .0.display())]
    MissingSource(PathBuf),

    #[error("failed to {action} `{}`", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk `{}`", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: jwalk::Error,
    },
}

impl FsError {
    /// Build a `map_err` adapter for an I/O action on `path`.
    ///
    /// ```ignore
    /// fs::read(&path).map_err(FsError::io("read", &path))?;
    /// ```
    pub fn io(action: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

/// Any failure of a leaf task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Filesystem(#[from] FsError),

    #[error("invalid glob pattern")]
    Pattern(#[from] globset::Error),

    #[error("`{step}` aborted: worker panicked")]
    Aborted { step: String },
}

impl TaskError {
    /// Whether the error must stop the surrounding step.
    ///
    /// Transform errors are recovered at the task boundary, everything else
    /// propagates.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Transform(_))
    }
}
