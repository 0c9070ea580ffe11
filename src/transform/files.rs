//! Plain filesystem transforms: directory removal and verbatim copies.

use std::fs;
use std::path::{Path, PathBuf};

use crate::task::{FsError, SourceFile};

/// Remove `dir` and everything below it.
///
/// Returns `false` when there was nothing to remove.
pub fn remove_dir(dir: &Path) -> Result<bool, FsError> {
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(dir).map_err(FsError::io("remove", dir))?;
    Ok(true)
}

/// Copy a stream file to `<dest>/<rel>` byte for byte.
pub fn copy_to(file: &SourceFile, dest: &Path) -> Result<PathBuf, FsError> {
    let output = dest.join(&file.rel);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(FsError::io("create", parent))?;
    }
    fs::copy(&file.path, &output).map_err(FsError::io("copy", &file.path))?;
    Ok(output)
}
