//! Fixed project layout.
//!
//! ```text
//! <root>/
//! ├── src/                 # sources
//! │   ├── *.html           # top-level pages
//! │   ├── html/layout/     # partials
//! │   ├── scss/
//! │   ├── img/
//! │   └── fonts/
//! └── dist/                # output, mirrors src/ (css/, img/, fonts/)
//! ```

use std::path::{Component, Path, PathBuf};

/// Source directory name, relative to the project root
pub const SOURCE_DIR: &str = "src";

/// Destination directory name, relative to the project root
pub const DIST_DIR: &str = "dist";

/// Resolved source and destination roots of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/src`
    pub fn source(&self) -> PathBuf {
        self.root.join(SOURCE_DIR)
    }

    /// `<root>/dist`
    pub fn dist(&self) -> PathBuf {
        self.root.join(DIST_DIR)
    }

    /// Join a path under `<root>/src`.
    pub fn source_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.source().join(path)
    }

    /// Join a path under `<root>/dist`.
    pub fn dist_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.dist().join(path)
    }

    /// Path of `path` relative to `src/`, with `/` separators.
    ///
    /// Returns `None` for paths outside the source directory.
    pub fn source_relative(&self, path: &Path) -> Option<String> {
        let source = self.source();
        if let Ok(rel) = path.strip_prefix(&source) {
            return to_slash(rel);
        }
        // notify may report canonical paths (e.g. /private/var on macOS)
        let canonical = source.canonicalize().ok()?;
        to_slash(path.strip_prefix(canonical).ok()?)
    }

    /// Path relative to the project root, for log output.
    pub fn display_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Join normal path components with `/`.
///
/// Returns `None` when the path has parent/root components or is empty.
pub fn to_slash(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
