//! View registry - one live output destination per command.
//!
//! The registry maps `(group, command)` keys to view entries: the
//! ordered output cells, the mirror of dynamic regions and streaming
//! containers, selection/running flags, and the record of the last run.
//! Entries are created lazily on first use and never destroyed while
//! the application lives: switching the selected command hides
//! entries, it does not drop them, so background output keeps
//! accumulating while hidden.
//!
//! # Text coalescing
//!
//! A command that prints line by line must not produce hundreds of
//! micro-artifacts. Consecutive plain-text artifacts accumulate into
//! one open [`OutputCell::TextRun`]; any non-text artifact (or an
//! explicit [`flush_text`](ViewRegistry::flush_text) boundary) seals
//! the run, and the next plain line opens a new one.
//!
//! The registry is the *model*: every mutation here is mirrored to the
//! display through the surface port by the router. Background threads
//! only ever append through these methods; nobody iterates the map from
//! a worker.

use janus_blocks::RegionBinding;
use janus_types::{CellId, RegionId, StreamId, ViewKey};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Lifecycle of one command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run in progress.
    Idle,
    /// Parameters are being validated; execution has not started.
    Validating,
    /// The body is executing.
    Running,
    /// The last run completed normally.
    Succeeded,
    /// The last run failed (validation or execution).
    Failed,
}

/// Record of a command's last run.
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Current lifecycle state.
    pub state: RunState,
    /// Return value of the last completed run, if any.
    pub result: Option<serde_json::Value>,
    /// Text rendition of everything emitted, in emission order.
    pub captured: Vec<String>,
}

impl Default for RunRecord {
    fn default() -> Self {
        Self {
            state: RunState::Idle,
            result: None,
            captured: Vec::new(),
        }
    }
}

/// One cell in a view's output destination.
#[derive(Debug, Clone)]
pub enum OutputCell<A> {
    /// An accumulating run of plain-text lines.
    TextRun {
        /// Cell identity.
        id: CellId,
        /// Accumulated lines, oldest first.
        lines: Vec<String>,
    },
    /// A single resolved artifact.
    Artifact {
        /// Cell identity.
        id: CellId,
        /// The artifact.
        artifact: A,
    },
}

impl<A> OutputCell<A> {
    /// Returns the cell identity.
    #[must_use]
    pub fn id(&self) -> CellId {
        match self {
            Self::TextRun { id, .. } | Self::Artifact { id, .. } => *id,
        }
    }
}

/// What a routed artifact did to the entry; the surface mirrors this.
#[derive(Debug, Clone)]
pub enum RouteEffect {
    /// A new cell was appended.
    Appended {
        /// Identity of the new cell.
        cell: CellId,
    },
    /// An open text run absorbed another line.
    TextUpdated {
        /// Identity of the updated cell.
        cell: CellId,
        /// Full accumulated text of the cell.
        text: String,
    },
}

/// Per-command destination state.
struct ViewEntry<A> {
    cells: Vec<OutputCell<A>>,
    /// Last render of each dynamic region, by stable identity.
    regions: HashMap<RegionId, A>,
    /// Region bindings kept alive for the entry's lifetime so state
    /// observers keep firing after the originating scope closed.
    region_bindings: HashMap<RegionId, Arc<RegionBinding>>,
    /// Live children of streaming containers.
    streams: HashMap<StreamId, Vec<A>>,
    record: RunRecord,
    running: bool,
    visible: bool,
    /// Index of the open text run, if the last artifact was plain text.
    open_text: Option<usize>,
}

impl<A> ViewEntry<A> {
    fn new() -> Self {
        Self {
            cells: Vec::new(),
            regions: HashMap::new(),
            region_bindings: HashMap::new(),
            streams: HashMap::new(),
            record: RunRecord::default(),
            running: false,
            visible: false,
            open_text: None,
        }
    }
}

struct RegistryInner<A> {
    entries: HashMap<ViewKey, ViewEntry<A>>,
    selected: Option<ViewKey>,
}

/// The shared view registry. Cloning shares the map.
pub struct ViewRegistry<A> {
    inner: Arc<Mutex<RegistryInner<A>>>,
}

impl<A> Clone for ViewRegistry<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A> Default for ViewRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> ViewRegistry<A> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                entries: HashMap::new(),
                selected: None,
            })),
        }
    }

    /// Creates the entry for `key` if it does not exist yet.
    pub fn ensure_entry(&self, key: &ViewKey) {
        self.inner
            .lock()
            .entries
            .entry(key.clone())
            .or_insert_with(ViewEntry::new);
    }

    /// Returns the currently selected command, if any.
    #[must_use]
    pub fn selected(&self) -> Option<ViewKey> {
        self.inner.lock().selected.clone()
    }

    /// Selects `key`: it becomes visible, everything else is hidden.
    ///
    /// Returns the keys that were visible and are now hidden, so the
    /// caller can mirror the change to the surface. Hidden entries are
    /// not destroyed.
    pub fn select(&self, key: &ViewKey) -> Vec<ViewKey> {
        let mut inner = self.inner.lock();
        inner.selected = Some(key.clone());

        let mut hidden = Vec::new();
        for (other, entry) in inner.entries.iter_mut() {
            if other != key && entry.visible {
                entry.visible = false;
                hidden.push(other.clone());
            }
        }
        inner
            .entries
            .entry(key.clone())
            .or_insert_with(ViewEntry::new)
            .visible = true;
        hidden
    }

    /// Routes one artifact into the entry, coalescing plain text.
    ///
    /// `plain` is the artifact's text when it is a plain-text artifact
    /// (eligible for coalescing); `display` is its text rendition for
    /// the captured-text record.
    pub fn append_artifact(
        &self,
        key: &ViewKey,
        artifact: A,
        plain: Option<String>,
        display: String,
    ) -> RouteEffect {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .entry(key.clone())
            .or_insert_with(ViewEntry::new);

        if !display.is_empty() || plain.is_some() {
            entry.record.captured.push(display);
        }

        match plain {
            Some(line) => {
                if let Some(index) = entry.open_text {
                    if let OutputCell::TextRun { id, lines } = &mut entry.cells[index] {
                        lines.push(line);
                        return RouteEffect::TextUpdated {
                            cell: *id,
                            text: lines.join("\n"),
                        };
                    }
                }
                let id = CellId::new();
                entry.cells.push(OutputCell::TextRun {
                    id,
                    lines: vec![line],
                });
                entry.open_text = Some(entry.cells.len() - 1);
                RouteEffect::Appended { cell: id }
            }
            None => {
                entry.open_text = None;
                let id = CellId::new();
                entry.cells.push(OutputCell::Artifact { id, artifact });
                RouteEffect::Appended { cell: id }
            }
        }
    }

    /// Seals the open text run; the next plain line starts a new cell.
    pub fn flush_text(&self, key: &ViewKey) {
        if let Some(entry) = self.inner.lock().entries.get_mut(key) {
            entry.open_text = None;
        }
    }

    /// Records a dynamic region's latest render, keeping its binding
    /// alive for the entry's lifetime.
    pub fn set_region(
        &self,
        key: &ViewKey,
        region: RegionId,
        artifact: A,
        binding: Arc<RegionBinding>,
    ) {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .entry(key.clone())
            .or_insert_with(ViewEntry::new);
        entry.regions.insert(region, artifact);
        entry.region_bindings.insert(region, binding);
    }

    /// Replaces a dynamic region's render in place.
    pub fn replace_region(&self, key: &ViewKey, region: RegionId, artifact: A) {
        if let Some(entry) = self.inner.lock().entries.get_mut(key) {
            entry.regions.insert(region, artifact);
        }
    }

    /// Appends a live child to a streaming container's mirror.
    pub fn stream_append(&self, key: &ViewKey, stream: StreamId, artifact: A) {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .entry(key.clone())
            .or_insert_with(ViewEntry::new);
        entry.streams.entry(stream).or_default().push(artifact);
    }

    /// Clears displayed output for `key`: cells, regions, streams and
    /// the captured record. Does not touch a running worker.
    pub fn clear(&self, key: &ViewKey) {
        if let Some(entry) = self.inner.lock().entries.get_mut(key) {
            entry.cells.clear();
            entry.open_text = None;
            entry.regions.clear();
            entry.region_bindings.clear();
            entry.streams.clear();
            entry.record.captured.clear();
            entry.record.result = None;
        }
    }

    /// Sets the running flag.
    pub fn set_running(&self, key: &ViewKey, running: bool) {
        let mut inner = self.inner.lock();
        inner
            .entries
            .entry(key.clone())
            .or_insert_with(ViewEntry::new)
            .running = running;
    }

    /// Returns the running flag.
    #[must_use]
    pub fn is_running(&self, key: &ViewKey) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.running)
    }

    /// Returns the visibility flag.
    #[must_use]
    pub fn is_visible(&self, key: &ViewKey) -> bool {
        self.inner
            .lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.visible)
    }

    /// Sets the run lifecycle state.
    pub fn set_state(&self, key: &ViewKey, state: RunState) {
        let mut inner = self.inner.lock();
        inner
            .entries
            .entry(key.clone())
            .or_insert_with(ViewEntry::new)
            .record
            .state = state;
    }

    /// Returns the run lifecycle state.
    #[must_use]
    pub fn state(&self, key: &ViewKey) -> RunState {
        self.inner
            .lock()
            .entries
            .get(key)
            .map_or(RunState::Idle, |entry| entry.record.state)
    }

    /// Stores the last run's result value.
    pub fn set_result(&self, key: &ViewKey, result: serde_json::Value) {
        let mut inner = self.inner.lock();
        inner
            .entries
            .entry(key.clone())
            .or_insert_with(ViewEntry::new)
            .record
            .result = Some(result);
    }

    /// Returns the last run's result value.
    #[must_use]
    pub fn result(&self, key: &ViewKey) -> Option<serde_json::Value> {
        self.inner
            .lock()
            .entries
            .get(key)
            .and_then(|entry| entry.record.result.clone())
    }

    /// Returns the captured text of the last run, newline-joined.
    #[must_use]
    pub fn captured_text(&self, key: &ViewKey) -> String {
        self.inner
            .lock()
            .entries
            .get(key)
            .map(|entry| entry.record.captured.join("\n"))
            .unwrap_or_default()
    }

    /// Returns the number of output cells.
    #[must_use]
    pub fn cell_count(&self, key: &ViewKey) -> usize {
        self.inner
            .lock()
            .entries
            .get(key)
            .map_or(0, |entry| entry.cells.len())
    }
}

impl<A: Clone> ViewRegistry<A> {
    /// Returns a snapshot of the output cells, in append order.
    #[must_use]
    pub fn cells(&self, key: &ViewKey) -> Vec<OutputCell<A>> {
        self.inner
            .lock()
            .entries
            .get(key)
            .map(|entry| entry.cells.clone())
            .unwrap_or_default()
    }

    /// Returns a dynamic region's latest render.
    #[must_use]
    pub fn region_artifact(&self, key: &ViewKey, region: RegionId) -> Option<A> {
        self.inner
            .lock()
            .entries
            .get(key)
            .and_then(|entry| entry.regions.get(&region).cloned())
    }

    /// Returns a streaming container's live children.
    #[must_use]
    pub fn stream_children(&self, key: &ViewKey, stream: StreamId) -> Vec<A> {
        self.inner
            .lock()
            .entries
            .get(key)
            .and_then(|entry| entry.streams.get(&stream).cloned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ViewKey {
        ViewKey::root("demo")
    }

    #[test]
    fn consecutive_plain_text_coalesces_into_one_cell() {
        let registry = ViewRegistry::<String>::new();
        let k = key();

        let first =
            registry.append_artifact(&k, "line 1".into(), Some("line 1".into()), "line 1".into());
        assert!(matches!(first, RouteEffect::Appended { .. }));

        let second =
            registry.append_artifact(&k, "line 2".into(), Some("line 2".into()), "line 2".into());
        match second {
            RouteEffect::TextUpdated { text, .. } => assert_eq!(text, "line 1\nline 2"),
            other => panic!("expected coalescing, got {other:?}"),
        }
        assert_eq!(registry.cell_count(&k), 1);
    }

    #[test]
    fn a_non_text_artifact_seals_the_open_run() {
        let registry = ViewRegistry::<String>::new();
        let k = key();

        registry.append_artifact(&k, "a".into(), Some("a".into()), "a".into());
        registry.append_artifact(&k, "<table>".into(), None, "table".into());
        registry.append_artifact(&k, "b".into(), Some("b".into()), "b".into());

        assert_eq!(registry.cell_count(&k), 3);
        assert_eq!(registry.captured_text(&k), "a\ntable\nb");
    }

    #[test]
    fn an_explicit_flush_is_a_coalescing_boundary() {
        let registry = ViewRegistry::<String>::new();
        let k = key();

        registry.append_artifact(&k, "a".into(), Some("a".into()), "a".into());
        registry.flush_text(&k);
        registry.append_artifact(&k, "b".into(), Some("b".into()), "b".into());
        assert_eq!(registry.cell_count(&k), 2);
    }

    #[test]
    fn selection_hides_previous_entries_without_destroying_them() {
        let registry = ViewRegistry::<String>::new();
        let first = ViewKey::root("first");
        let second = ViewKey::root("second");

        registry.append_artifact(&first, "x".into(), Some("x".into()), "x".into());
        let hidden = registry.select(&first);
        assert!(hidden.is_empty());
        assert!(registry.is_visible(&first));

        let hidden = registry.select(&second);
        assert_eq!(hidden, vec![first.clone()]);
        assert!(!registry.is_visible(&first));
        assert!(registry.is_visible(&second));

        // The hidden entry kept its output.
        assert_eq!(registry.cell_count(&first), 1);
        assert_eq!(registry.selected(), Some(second));
    }

    #[test]
    fn clear_drops_output_but_not_selection_state() {
        let registry = ViewRegistry::<String>::new();
        let k = key();
        registry.select(&k);
        registry.append_artifact(&k, "x".into(), Some("x".into()), "x".into());
        registry.set_result(&k, serde_json::json!(1));

        registry.clear(&k);
        assert_eq!(registry.cell_count(&k), 0);
        assert!(registry.captured_text(&k).is_empty());
        assert_eq!(registry.result(&k), None);
        assert!(registry.is_visible(&k));
    }

    #[test]
    fn run_records_track_state_and_result() {
        let registry = ViewRegistry::<String>::new();
        let k = key();
        assert_eq!(registry.state(&k), RunState::Idle);
        registry.set_state(&k, RunState::Running);
        assert_eq!(registry.state(&k), RunState::Running);
        registry.set_result(&k, serde_json::json!("out"));
        assert_eq!(registry.result(&k), Some(serde_json::json!("out")));
    }
}
