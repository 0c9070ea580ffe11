//! SCSS compilation with grass.

use std::path::Path;

/// Compile an SCSS entry file to (unminified) CSS.
///
/// Imports resolve against the entry's own directory first, then
/// `scss_root`, so partials may live anywhere under `src/scss`.
pub fn compile(entry: &Path, scss_root: &Path) -> Result<String, String> {
    let mut options = grass::Options::default();
    if let Some(dir) = entry.parent() {
        options = options.load_path(dir);
    }
    options = options.load_path(scss_root);

    grass::from_path(entry, &options).map_err(|e| e.to_string())
}
