//! File streams: glob-matched sources under a base directory.
//!
//! A stream mirrors paths: a file matched at `<base>/a/b.png` is written to
//! `<dest>/a/b.png`. Patterns are relative to the base and `*` never crosses
//! a `/`. Hidden files and directories are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use jwalk::WalkDir;

use super::FsError;
use crate::core::to_slash;

/// A matched source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path of the source.
    pub path: PathBuf,
    /// Path relative to the stream base, mirrored under the destination.
    pub rel: PathBuf,
}

impl SourceFile {
    pub fn read(&self) -> Result<Vec<u8>, FsError> {
        fs::read(&self.path).map_err(FsError::io("read", &self.path))
    }
}

/// Include/exclude glob sets over one base directory.
#[derive(Debug, Clone)]
pub struct FileStream {
    base: PathBuf,
    include: GlobSet,
    exclude: GlobSet,
}

impl FileStream {
    pub fn new(base: impl Into<PathBuf>, include: &[&str]) -> Result<Self, globset::Error> {
        Ok(Self {
            base: base.into(),
            include: build_set(include)?,
            exclude: GlobSet::empty(),
        })
    }

    /// Drop files matching any of `patterns`, even when included.
    pub fn exclude(mut self, patterns: &[&str]) -> Result<Self, globset::Error> {
        self.exclude = build_set(patterns)?;
        Ok(self)
    }

    /// Whether a base-relative, `/`-separated path belongs to the stream.
    pub fn matches(&self, rel: &str) -> bool {
        self.include.is_match(rel) && !self.exclude.is_match(rel)
    }

    /// Walk the base directory and return matching files, sorted by path.
    ///
    /// A missing base yields an empty stream.
    pub fn collect(&self) -> Result<Vec<SourceFile>, FsError> {
        if !self.base.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.base).sort(true) {
            let entry = entry.map_err(|source| FsError::Walk {
                path: self.base.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Ok(rel) = path.strip_prefix(&self.base) else {
                continue;
            };
            let Some(rel_str) = to_slash(rel) else {
                continue;
            };
            if self.matches(&rel_str) {
                files.push(SourceFile {
                    rel: rel.to_path_buf(),
                    path,
                });
            }
        }
        Ok(files)
    }
}

fn build_set(patterns: &[&str]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).literal_separator(true).build()?);
    }
    builder.build()
}

/// Write `data` to `<dest>/<rel>`, creating parent directories.
pub fn write_output(dest: &Path, rel: &Path, data: &[u8]) -> Result<PathBuf, FsError> {
    let output = dest.join(rel);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(FsError::io("create", parent))?;
    }
    fs::write(&output, data).map_err(FsError::io("write", &output))?;
    Ok(output)
}
