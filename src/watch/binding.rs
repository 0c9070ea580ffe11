//! Watch bindings: which source changes re-run which steps.
//!
//! | Glob (under `src/`)                 | Events   | Step           | Reload |
//! |-------------------------------------|----------|----------------|--------|
//! | `img/**/*.{jpg,jpeg,png,gif}`       | all      | `images`       | full   |
//! | `img/**/*.svg`                      | all      | `svg`          | full   |
//! | `scss/**/*.scss`                    | all      | `css`          | css    |
//! | `*.html`                            | modified | html refresh   | full   |
//! | `html/layout/**/*.html`             | all      | html refresh   | full   |

use globset::{GlobBuilder, GlobMatcher};

use super::debouncer::ChangeKind;
use crate::task::{Step, TaskKind};

/// Which change kinds a binding reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    All,
    /// Edits of existing files only.
    Modified,
}

impl EventFilter {
    pub fn accepts(self, kind: ChangeKind) -> bool {
        match self {
            Self::All => true,
            Self::Modified => kind == ChangeKind::Modified,
        }
    }
}

/// How open pages pick up a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadKind {
    /// Reload the whole page.
    Full,
    /// Swap stylesheets in place.
    Css,
}

#[derive(Debug, Clone)]
pub struct WatchBinding {
    matcher: GlobMatcher,
    filter: EventFilter,
    step: Step,
    reload: ReloadKind,
}

impl WatchBinding {
    pub fn new(
        pattern: &str,
        filter: EventFilter,
        step: impl Into<Step>,
        reload: ReloadKind,
    ) -> Result<Self, globset::Error> {
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()?
            .compile_matcher();
        Ok(Self {
            matcher,
            filter,
            step: step.into(),
            reload,
        })
    }

    pub fn pattern(&self) -> &str {
        self.matcher.glob().glob()
    }

    /// `rel` is relative to `src/` with `/` separators.
    pub fn matches(&self, rel: &str, kind: ChangeKind) -> bool {
        self.filter.accepts(kind) && self.matcher.is_match(rel)
    }
}

/// Bindings of the dev session, in dispatch order.
pub fn default_bindings() -> Result<Vec<WatchBinding>, globset::Error> {
    use EventFilter::*;
    use ReloadKind::*;

    Ok(vec![
        WatchBinding::new("img/**/*.{jpg,jpeg,png,gif}", All, TaskKind::Images, Full)?,
        WatchBinding::new("img/**/*.svg", All, TaskKind::Svg, Full)?,
        WatchBinding::new("scss/**/*.scss", All, TaskKind::Css, Css)?,
        WatchBinding::new("*.html", Modified, Step::html_refresh(), Full)?,
        WatchBinding::new("html/layout/**/*.html", All, Step::html_refresh(), Full)?,
    ])
}

/// Work derived from one batch of changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Matched steps in binding order, each at most once.
    pub steps: Vec<Step>,
    pub reload: ReloadKind,
    /// First matched path, for status output.
    pub trigger: String,
    pub matched: usize,
}

impl Batch {
    pub fn step(&self) -> Step {
        match self.steps.as_slice() {
            [single] => single.clone(),
            steps => Step::Sequence(steps.to_vec()),
        }
    }
}

/// Match `changes` against `bindings`.
///
/// Returns `None` when nothing matched. The reload is `Css` only when every
/// matched binding asks for it.
pub fn plan_batch(bindings: &[WatchBinding], changes: &[(String, ChangeKind)]) -> Option<Batch> {
    let mut steps: Vec<Step> = Vec::new();
    let mut reload = ReloadKind::Css;
    let mut trigger = None;
    let mut matched = 0;

    for (rel, kind) in changes {
        if bindings.iter().any(|b| b.matches(rel, *kind)) {
            matched += 1;
            trigger.get_or_insert_with(|| rel.clone());
        }
    }

    for binding in bindings {
        if !changes.iter().any(|(rel, kind)| binding.matches(rel, *kind)) {
            continue;
        }
        if binding.reload == ReloadKind::Full {
            reload = ReloadKind::Full;
        }
        if !steps.contains(&binding.step) {
            steps.push(binding.step.clone());
        }
    }

    Some(Batch {
        steps,
        reload,
        trigger: trigger?,
        matched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChangeKind::*;

    fn plan(changes: &[(&str, ChangeKind)]) -> Option<Batch> {
        let bindings = default_bindings().unwrap();
        let changes: Vec<_> = changes
            .iter()
            .map(|(rel, kind)| (rel.to_string(), *kind))
            .collect();
        plan_batch(&bindings, &changes)
    }

    #[test]
    fn test_default_patterns() {
        let bindings = default_bindings().unwrap();
        let patterns: Vec<_> = bindings.iter().map(WatchBinding::pattern).collect();
        assert_eq!(
            patterns,
            [
                "img/**/*.{jpg,jpeg,png,gif}",
                "img/**/*.svg",
                "scss/**/*.scss",
                "*.html",
                "html/layout/**/*.html",
            ]
        );
    }

    #[test]
    fn test_stylesheet_change_swaps_css() {
        let batch = plan(&[("scss/base/_vars.scss", Modified)]).unwrap();
        assert_eq!(batch.step(), Step::Task(TaskKind::Css));
        assert_eq!(batch.reload, ReloadKind::Css);
        assert_eq!(batch.trigger, "scss/base/_vars.scss");
    }

    #[test]
    fn test_images_by_extension() {
        let raster = plan(&[("img/photos/a.jpeg", Created)]).unwrap();
        assert_eq!(raster.step(), Step::Task(TaskKind::Images));
        assert_eq!(raster.reload, ReloadKind::Full);

        let vector = plan(&[("img/icons/x.svg", Removed)]).unwrap();
        assert_eq!(vector.step(), Step::Task(TaskKind::Svg));

        assert!(plan(&[("img/notes.txt", Modified)]).is_none());
    }

    #[test]
    fn test_top_level_pages_only_on_modify() {
        let batch = plan(&[("about.html", Modified)]).unwrap();
        assert_eq!(batch.step(), Step::html_refresh());

        assert!(plan(&[("about.html", Created)]).is_none());
        assert!(plan(&[("about.html", Removed)]).is_none());
        // not a top-level page, not a layout partial
        assert!(plan(&[("html/pages/a.html", Modified)]).is_none());
    }

    #[test]
    fn test_layout_partials_any_event() {
        let batch = plan(&[("html/layout/header.html", Created)]).unwrap();
        assert_eq!(batch.step(), Step::html_refresh());
        assert_eq!(batch.reload, ReloadKind::Full);
    }

    #[test]
    fn test_mixed_batch_dedups_and_reloads_fully() {
        let batch = plan(&[
            ("html/layout/footer.html", Modified),
            ("index.html", Modified),
            ("notes.md", Modified),
            ("scss/main.scss", Modified),
        ])
        .unwrap();

        assert_eq!(
            batch.steps,
            vec![Step::Task(TaskKind::Css), Step::html_refresh()]
        );
        assert_eq!(batch.reload, ReloadKind::Full);
        assert_eq!(batch.matched, 3);
        assert_eq!(batch.trigger, "html/layout/footer.html");
    }

    #[test]
    fn test_nothing_matched() {
        assert!(plan(&[]).is_none());
        assert!(plan(&[("fonts/a.woff", Created)]).is_none());
    }
}
