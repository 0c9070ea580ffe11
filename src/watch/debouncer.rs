//! Event coalescing for the watch loop.
//!
//! Collects raw notify events into one change per path and decides when a
//! batch is ready: after a quiet period, and never sooner than the
//! cooldown since the previous batch was taken.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::ModifyKind;
use rustc_hash::FxHashMap;

use crate::debug;

/// Kind of change recorded for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            // mtime/chmod noise would retrigger rebuilds forever
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }
}

/// Pending changes plus the timestamps that gate the next batch.
pub struct Debouncer {
    debounce: Duration,
    cooldown: Duration,
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
    last_batch: Option<Instant>,
}

impl Debouncer {
    pub fn new(debounce: Duration, cooldown: Duration) -> Self {
        Self {
            debounce,
            cooldown,
            changes: FxHashMap::default(),
            last_event: None,
            last_batch: None,
        }
    }

    pub fn pending(&self) -> usize {
        self.changes.len()
    }

    /// Record a notify event.
    ///
    /// A path seen twice in one window keeps a single entry:
    /// - removed, then created or modified: the new kind (restored)
    /// - modified, then removed: removed
    /// - created, then removed: dropped
    /// - anything else: the first kind
    pub fn add_event(&mut self, event: &notify::Event) {
        let Some(kind) = ChangeKind::from_event(&event.kind) else {
            return;
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            self.record(path.clone(), kind);
        }
    }

    fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        use ChangeKind::*;

        match self.changes.get(&path).copied() {
            None => {
                debug!("watch"; "{}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
            }
            Some(Removed) if matches!(kind, Created | Modified) => {
                self.changes.insert(path, kind);
            }
            Some(Modified) if kind == Removed => {
                self.changes.insert(path, Removed);
            }
            Some(Created) if kind == Removed => {
                debug!("watch"; "discard created+removed: {}", path.display());
                self.changes.remove(&path);
            }
            Some(_) => return,
        }
        self.last_event = Some(Instant::now());
    }

    /// Take the pending changes if the batch is ready, starting a new
    /// cooldown window.
    pub fn take_if_ready(&mut self) -> Option<Vec<(PathBuf, ChangeKind)>> {
        if !self.is_ready() {
            return None;
        }

        self.last_event = None;
        self.last_batch = Some(Instant::now());

        let mut changes: Vec<_> = std::mem::take(&mut self.changes).into_iter().collect();
        changes.sort();
        Some(changes)
    }

    pub fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < self.debounce {
            return false;
        }
        if let Some(last_batch) = self.last_batch
            && last_batch.elapsed() < self.cooldown
        {
            return false;
        }
        !self.changes.is_empty()
    }

    /// Time until the batch can next become ready.
    pub fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };

        let debounce_remaining = self.debounce.saturating_sub(last_event.elapsed());
        let cooldown_remaining = self
            .last_batch
            .map(|t| self.cooldown.saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        debounce_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}

/// Editor swap and backup files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
