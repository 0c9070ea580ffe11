//! Leaf task bodies.
//!
//! Each body walks one file stream and stops at the first error. Files
//! written before the error stay in place.

use std::path::PathBuf;

use ::image::ImageFormat;

use super::{FileStream, SourceFile, TaskContext, TaskError, TransformError, write_output};
use crate::debug;
use crate::transform::include::{self, IncludeResolver};
use crate::transform::{css as stylesheet, files, image, scss, svg};

/// Page that gets its includes expanded.
const INDEX_PAGE: &str = "index.html";

#[derive(Debug, Default)]
pub(super) struct Outcome {
    pub written: Vec<PathBuf>,
    pub checked: usize,
}

pub(super) fn cleaning(ctx: &TaskContext) -> Result<Outcome, TaskError> {
    let dist = ctx.paths.dist();
    if files::remove_dir(&dist)? {
        debug!("cleaning"; "removed {}", ctx.paths.display_relative(&dist));
    }
    Ok(Outcome::default())
}

pub(super) fn html(ctx: &TaskContext) -> Result<Outcome, TaskError> {
    let stream = FileStream::new(ctx.paths.source(), &["*.html"])?;
    let dest = ctx.paths.dist();

    let mut outcome = Outcome::default();
    for file in stream.collect()? {
        outcome.written.push(files::copy_to(&file, &dest)?);
    }
    Ok(outcome)
}

pub(super) fn process_html(ctx: &TaskContext) -> Result<Outcome, TaskError> {
    let stream = FileStream::new(ctx.paths.source(), &[INDEX_PAGE])?;
    let resolver = IncludeResolver::new(ctx.paths.source());
    let dest = ctx.paths.dist();

    let mut outcome = Outcome::default();
    for file in stream.collect()? {
        let html = render(&resolver, &file)?;
        outcome
            .written
            .push(write_output(&dest, &file.rel, html.as_bytes())?);
    }
    Ok(outcome)
}

/// Expand every layout partial in memory; nothing is written.
pub(super) fn layout_process_html(ctx: &TaskContext) -> Result<Outcome, TaskError> {
    let stream = FileStream::new(ctx.paths.source_join("html/layout"), &["**/*.html"])?;
    let resolver = IncludeResolver::new(ctx.paths.source());

    let mut outcome = Outcome::default();
    for file in stream.collect()? {
        render(&resolver, &file)?;
        outcome.checked += 1;
    }
    Ok(outcome)
}

fn render(resolver: &IncludeResolver, file: &SourceFile) -> Result<String, TaskError> {
    let failed = |source| TransformError::Template {
        path: file.path.clone(),
        source,
    };
    let content = include::decode(&file.path, file.read()?).map_err(failed)?;
    let html = resolver.expand(&content, &file.path).map_err(failed)?;
    Ok(html)
}

pub(super) fn css(ctx: &TaskContext) -> Result<Outcome, TaskError> {
    let scss_root = ctx.paths.source_join("scss");
    let stream = FileStream::new(&scss_root, &["**/*.scss"])?.exclude(&["**/_*.scss"])?;
    let dest = ctx.paths.dist_join("css");

    let mut outcome = Outcome::default();
    for file in stream.collect()? {
        debug!("css"; "processing: {}", ctx.paths.display_relative(&file.path));

        let failed = |message: String| TransformError::Stylesheet {
            path: file.path.clone(),
            message,
        };
        let compiled = scss::compile(&file.path, &scss_root).map_err(failed)?;
        let filename = file.path.display().to_string();
        let minified =
            stylesheet::optimize(&compiled, &filename, ctx.css_targets.clone()).map_err(failed)?;

        let rel = file.rel.with_extension("css");
        outcome
            .written
            .push(write_output(&dest, &rel, minified.as_bytes())?);
    }
    Ok(outcome)
}

pub(super) fn font(ctx: &TaskContext) -> Result<Outcome, TaskError> {
    let stream = FileStream::new(ctx.paths.source_join("fonts"), &["**/*.*"])?;
    let dest = ctx.paths.dist_join("fonts");

    let mut outcome = Outcome::default();
    for file in stream.collect()? {
        outcome.written.push(files::copy_to(&file, &dest)?);
    }
    Ok(outcome)
}

pub(super) fn images(ctx: &TaskContext) -> Result<Outcome, TaskError> {
    let stream = FileStream::new(ctx.paths.source_join("img"), &["**/*.{jpg,jpeg,png,gif}"])?
        .exclude(&["**/*.svg"])?;
    let dest = ctx.paths.dist_join("img");

    let mut outcome = Outcome::default();
    for file in stream.collect()? {
        let failed = |message: String| TransformError::Image {
            path: file.path.clone(),
            message,
        };
        let format = ImageFormat::from_path(&file.path).map_err(|e| failed(e.to_string()))?;
        let optimized = image::optimize(file.read()?, format, ctx.jpeg_quality).map_err(failed)?;
        outcome
            .written
            .push(write_output(&dest, &file.rel, &optimized)?);
    }
    Ok(outcome)
}

pub(super) fn svg(ctx: &TaskContext) -> Result<Outcome, TaskError> {
    let stream = FileStream::new(ctx.paths.source_join("img"), &["**/*.svg"])?;
    let dest = ctx.paths.dist_join("img");

    let mut outcome = Outcome::default();
    for file in stream.collect()? {
        let minified = svg::minify(&file.read()?).map_err(|message| TransformError::Svg {
            path: file.path.clone(),
            message,
        })?;
        outcome
            .written
            .push(write_output(&dest, &file.rel, &minified)?);
    }
    Ok(outcome)
}
