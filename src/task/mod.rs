//! Leaf tasks and their composition.
//!
//! # Module Structure
//!
//! ```text
//! task/
//! ├── error.rs     # TransformError, FsError, TaskError
//! ├── stream.rs    # FileStream: include/exclude globs over a base directory
//! ├── leaf.rs      # the eight leaf task bodies
//! ├── plan.rs      # Step: Task | Sequence | Parallel, build/dev graphs
//! ├── runner.rs    # async Step execution, RunSummary
//! └── mod.rs       # TaskKind, TaskContext, TaskReport (this file)
//! ```

mod error;
mod leaf;
mod plan;
mod runner;
mod stream;

pub use error::{FsError, TaskError, TransformError};
pub use plan::Step;
pub use runner::{RunSummary, Runner};
pub use stream::{FileStream, SourceFile, write_output};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use lightningcss::targets::Targets;

use crate::config::PipelineConfig;
use crate::core::ProjectPaths;
use crate::utils::plural::plural_count;

/// A named leaf task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Cleaning,
    Html,
    ProcessHtml,
    LayoutProcessHtml,
    Css,
    Font,
    Images,
    Svg,
}

impl TaskKind {
    pub const ALL: [TaskKind; 8] = [
        Self::Cleaning,
        Self::Html,
        Self::ProcessHtml,
        Self::LayoutProcessHtml,
        Self::Css,
        Self::Font,
        Self::Images,
        Self::Svg,
    ];

    /// Task key as used on the command line and in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cleaning => "cleaning",
            Self::Html => "html",
            Self::ProcessHtml => "processHtml",
            Self::LayoutProcessHtml => "layoutProcessHtml",
            Self::Css => "css",
            Self::Font => "font",
            Self::Images => "images",
            Self::Svg => "svg",
        }
    }

    /// Run the task to completion on the current thread.
    ///
    /// Every task but `cleaning` requires the source root to exist.
    pub fn run(self, ctx: &TaskContext) -> Result<TaskReport, TaskError> {
        let started = Instant::now();

        if self != Self::Cleaning {
            let source = ctx.paths.source();
            if !source.is_dir() {
                return Err(FsError::MissingSource(source).into());
            }
        }

        let outcome = match self {
            Self::Cleaning => leaf::cleaning(ctx),
            Self::Html => leaf::html(ctx),
            Self::ProcessHtml => leaf::process_html(ctx),
            Self::LayoutProcessHtml => leaf::layout_process_html(ctx),
            Self::Css => leaf::css(ctx),
            Self::Font => leaf::font(ctx),
            Self::Images => leaf::images(ctx),
            Self::Svg => leaf::svg(ctx),
        }?;

        Ok(TaskReport {
            task: self,
            written: outcome.written,
            checked: outcome.checked,
            elapsed: started.elapsed(),
        })
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a leaf task needs, resolved once from the config.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub paths: ProjectPaths,
    pub css_targets: Targets,
    pub jpeg_quality: u8,
}

impl TaskContext {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let css_targets = crate::transform::css::resolve_targets(&config.css.browsers)
            .map_err(anyhow::Error::msg)
            .context("Failed to resolve [css] browsers")?;

        Ok(Self {
            paths: config.paths(),
            css_targets,
            jpeg_quality: config.images.jpeg_quality,
        })
    }
}

/// What a finished leaf task produced.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: TaskKind,
    /// Output files, in write order.
    pub written: Vec<PathBuf>,
    /// Inputs validated without producing output.
    pub checked: usize,
    pub elapsed: Duration,
}

impl TaskReport {
    /// Short result description, e.g. `3 files` or `2 files checked`.
    pub fn describe(&self) -> String {
        if self.written.is_empty() && self.checked > 0 {
            format!("{} checked", plural_count(self.checked, "file"))
        } else {
            plural_count(self.written.len(), "file")
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transform::include::IncludeError;
    use std::fs;
    use tempfile::TempDir;

    pub(crate) fn project(files: &[(&str, &[u8])]) -> (TempDir, TaskContext) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let config = PipelineConfig {
            root: dir.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        let ctx = TaskContext::from_config(&config).unwrap();
        (dir, ctx)
    }

    fn rels(dir: &TempDir, report: &TaskReport) -> Vec<String> {
        report
            .written
            .iter()
            .map(|p| crate::core::to_slash(p.strip_prefix(dir.path()).unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn test_names_unique() {
        let mut names: Vec<_> = TaskKind::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TaskKind::ALL.len());
    }

    #[test]
    fn test_missing_source_root() {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig {
            root: dir.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        let ctx = TaskContext::from_config(&config).unwrap();

        for kind in TaskKind::ALL {
            let result = kind.run(&ctx);
            if kind == TaskKind::Cleaning {
                assert!(result.is_ok());
            } else {
                assert!(
                    matches!(result, Err(TaskError::Filesystem(FsError::MissingSource(_)))),
                    "{kind}"
                );
            }
        }
    }

    #[test]
    fn test_cleaning_missing_dist() {
        let (_dir, ctx) = project(&[]);
        let report = TaskKind::Cleaning.run(&ctx).unwrap();
        assert!(report.written.is_empty());
    }

    #[test]
    fn test_html_copies_top_level_only() {
        let (dir, ctx) = project(&[
            ("src/index.html", b"@@include('html/layout/a.html')"),
            ("src/about.html", b"<p>about</p>"),
            ("src/html/layout/a.html", b"<a/>"),
        ]);
        let report = TaskKind::Html.run(&ctx).unwrap();
        assert_eq!(rels(&dir, &report), vec!["dist/about.html", "dist/index.html"]);
        // raw copy, includes untouched
        let index = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
        assert_eq!(index, "@@include('html/layout/a.html')");
    }

    #[test]
    fn test_process_html_expands_index() {
        let (dir, ctx) = project(&[
            ("src/index.html", b"<body>@@include(\"partial.html\")</body>"),
            ("src/about.html", b"@@include('missing.html')"),
            ("src/partial.html", b"<p>hi</p>"),
        ]);
        let report = TaskKind::ProcessHtml.run(&ctx).unwrap();
        assert_eq!(rels(&dir, &report), vec!["dist/index.html"]);

        let index = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
        assert_eq!(index, "<body><p>hi</p></body>");
        assert!(!dir.path().join("dist/about.html").exists());
    }

    #[test]
    fn test_process_html_template_error() {
        let (_dir, ctx) = project(&[("src/index.html", b"@@include('missing.html')")]);
        let err = TaskKind::ProcessHtml.run(&ctx).unwrap_err();
        assert!(matches!(
            err,
            TaskError::Transform(TransformError::Template { .. })
        ));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_non_utf8_page_is_template_error() {
        let (dir, ctx) = project(&[
            ("src/index.html", b"<body>caf\xe9</body>"),
            ("src/html/layout/footer.html", b"<footer>\xff</footer>"),
        ]);

        for kind in [TaskKind::ProcessHtml, TaskKind::LayoutProcessHtml] {
            let err = kind.run(&ctx).unwrap_err();
            assert!(!err.is_fatal(), "{kind}");
            let TaskError::Transform(TransformError::Template { source, .. }) = err else {
                panic!("{kind}: expected template error");
            };
            assert!(matches!(source, IncludeError::Encoding { .. }));
        }
        assert!(!dir.path().join("dist/index.html").exists());
    }

    #[test]
    fn test_layout_writes_nothing() {
        let (dir, ctx) = project(&[
            ("src/html/layout/header.html", b"<header>@@include('html/layout/nav.html')</header>"),
            ("src/html/layout/nav.html", b"<nav/>"),
        ]);
        let report = TaskKind::LayoutProcessHtml.run(&ctx).unwrap();
        assert!(report.written.is_empty());
        assert_eq!(report.checked, 2);
        assert_eq!(report.describe(), "2 files checked");
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_css_compiles_entry_with_partial() {
        let (dir, ctx) = project(&[
            ("src/scss/_vars.scss", b"$gap: 4px;"),
            (
                "src/scss/main.scss",
                b"@import 'vars';\n/* note */\n.grid {\n  gap: $gap;\n  .cell { user-select: none; }\n}\n",
            ),
        ]);
        let report = TaskKind::Css.run(&ctx).unwrap();
        assert_eq!(rels(&dir, &report), vec!["dist/css/main.css"]);

        let css = fs::read_to_string(dir.path().join("dist/css/main.css")).unwrap();
        assert!(css.contains(".grid{gap:4px}"), "{css}");
        assert!(css.contains(".grid .cell{"), "{css}");
        assert!(!css.contains("note"));
        assert!(!css.contains('\n'));
    }

    #[test]
    fn test_css_error_is_stylesheet() {
        let (_dir, ctx) = project(&[("src/scss/main.scss", b".a { color: $nope; }")]);
        let err = TaskKind::Css.run(&ctx).unwrap_err();
        assert!(matches!(
            err,
            TaskError::Transform(TransformError::Stylesheet { .. })
        ));
    }

    #[test]
    fn test_font_mirrors_tree() {
        let (dir, ctx) = project(&[
            ("src/fonts/a.woff2", b"font-a"),
            ("src/fonts/roboto/regular.ttf", b"font-b"),
        ]);
        let report = TaskKind::Font.run(&ctx).unwrap();
        assert_eq!(
            rels(&dir, &report),
            vec!["dist/fonts/a.woff2", "dist/fonts/roboto/regular.ttf"]
        );
    }

    fn encoded(format: ::image::ImageFormat) -> Vec<u8> {
        let img = ::image::DynamicImage::new_rgb8(8, 8);
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_images_and_svg_partition() {
        let png = encoded(::image::ImageFormat::Png);
        let jpeg = encoded(::image::ImageFormat::Jpeg);
        let (dir, ctx) = project(&[
            ("src/img/anim.gif", b"GIF89a"),
            ("src/img/photo.jpg", &jpeg),
            ("src/img/scan.jpeg", &jpeg),
            ("src/img/icons/badge.png", &png),
            ("src/img/icons/logo.svg", b"<svg><!-- x --><g/></svg>"),
            ("src/img/notes.txt", b"not an image"),
        ]);

        let images = TaskKind::Images.run(&ctx).unwrap();
        let mut raster = rels(&dir, &images);
        raster.sort();
        assert_eq!(
            raster,
            vec![
                "dist/img/anim.gif",
                "dist/img/icons/badge.png",
                "dist/img/photo.jpg",
                "dist/img/scan.jpeg",
            ]
        );

        let svg = TaskKind::Svg.run(&ctx).unwrap();
        assert_eq!(rels(&dir, &svg), vec!["dist/img/icons/logo.svg"]);
        let logo = fs::read_to_string(dir.path().join("dist/img/icons/logo.svg")).unwrap();
        assert_eq!(logo, "<svg><g/></svg>");

        for rel in &raster {
            assert!(!svg.written.contains(&dir.path().join(rel)));
        }
        assert!(!dir.path().join("dist/img/notes.txt").exists());
    }

    #[test]
    fn test_corrupt_png_is_image_error() {
        let (_dir, ctx) = project(&[("src/img/broken.png", b"definitely not png")]);
        let err = TaskKind::Images.run(&ctx).unwrap_err();
        assert!(matches!(
            err,
            TaskError::Transform(TransformError::Image { .. })
        ));
    }
}
