//! Static task graphs.

use std::fmt;

use super::TaskKind;

/// A node of the task graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Task(TaskKind),
    /// Each step completes before the next starts.
    Sequence(Vec<Step>),
    /// All steps start together; completes when every step has.
    Parallel(Vec<Step>),
}

impl Step {
    /// `cleaning`, then every output-producing task at once.
    pub fn build() -> Self {
        use TaskKind::*;
        Self::Sequence(vec![
            Self::Task(Cleaning),
            Self::Parallel(vec![
                Self::Task(Html),
                Self::Task(Css),
                Self::Task(Font),
                Self::Task(Images),
                Self::Task(Svg),
            ]),
        ])
    }

    /// `build`, then template expansion. The watch loop starts afterwards.
    pub fn dev() -> Self {
        Self::Sequence(vec![
            Self::build(),
            Self::Parallel(vec![
                Self::Task(TaskKind::LayoutProcessHtml),
                Self::Task(TaskKind::ProcessHtml),
            ]),
        ])
    }

    /// Re-run after a page or layout change.
    pub fn html_refresh() -> Self {
        Self::Sequence(vec![
            Self::Task(TaskKind::Html),
            Self::Task(TaskKind::LayoutProcessHtml),
            Self::Task(TaskKind::ProcessHtml),
        ])
    }

    /// All leaf tasks, in declaration order.
    pub fn tasks(&self) -> Vec<TaskKind> {
        let mut tasks = Vec::new();
        self.collect_tasks(&mut tasks);
        tasks
    }

    fn collect_tasks(&self, out: &mut Vec<TaskKind>) {
        match self {
            Self::Task(kind) => out.push(*kind),
            Self::Sequence(steps) | Self::Parallel(steps) => {
                steps.iter().for_each(|step| step.collect_tasks(out));
            }
        }
    }
}

impl From<TaskKind> for Step {
    fn from(kind: TaskKind) -> Self {
        Self::Task(kind)
    }
}

/// `[a -> b]` for sequences, `{a | b}` for parallel groups.
impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, sep, close, steps) = match self {
            Self::Task(kind) => return f.write_str(kind.name()),
            Self::Sequence(steps) => ("[", " -> ", "]", steps),
            Self::Parallel(steps) => ("{", " | ", "}", steps),
        };
        f.write_str(open)?;
        for (i, step) in steps.iter().enumerate() {
            if i > 0 {
                f.write_str(sep)?;
            }
            write!(f, "{step}")?;
        }
        f.write_str(close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_graph() {
        assert_eq!(
            Step::build().to_string(),
            "[cleaning -> {html | css | font | images | svg}]"
        );
    }

    #[test]
    fn test_dev_graph() {
        assert_eq!(
            Step::dev().to_string(),
            "[[cleaning -> {html | css | font | images | svg}] -> {layoutProcessHtml | processHtml}]"
        );
    }

    #[test]
    fn test_tasks_flatten() {
        assert_eq!(
            Step::html_refresh().tasks(),
            vec![
                TaskKind::Html,
                TaskKind::LayoutProcessHtml,
                TaskKind::ProcessHtml
            ]
        );
        assert_eq!(Step::dev().tasks().len(), TaskKind::ALL.len());
    }

    #[test]
    fn test_build_cleans_first() {
        let Step::Sequence(steps) = Step::build() else {
            panic!("build is a sequence");
        };
        assert_eq!(steps[0], Step::Task(TaskKind::Cleaning));
        assert!(!steps[1].tasks().contains(&TaskKind::Cleaning));
    }
}
