/// Navigation history for back/forward between visited directories
///
/// Entries are node-keyed: each one points at a tree node and remembers the
/// node's path so the entry can be validated (and re-bound after the tree
/// reloaded) without the node. Entries beyond the current index are the
/// "forward" history and are discarded when a new location is recorded.
use crate::view::file_tree::NodeId;
use std::path::{Path, PathBuf};

/// A single entry in the navigation history
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    /// The directory or drive node
    pub node: NodeId,

    /// Path of the node when it was recorded
    pub path: PathBuf,

    /// Child to highlight when this directory is shown again
    pub selected: Option<NodeId>,
}

impl HistoryEntry {
    pub fn new(node: NodeId, path: impl Into<PathBuf>) -> Self {
        Self {
            node,
            path: path.into(),
            selected: None,
        }
    }

    pub fn with_selected(mut self, selected: Option<NodeId>) -> Self {
        self.selected = selected;
        self
    }
}

/// Navigation history manager
#[derive(Debug)]
pub struct NavigationHistory {
    /// Visited locations, oldest first
    entries: Vec<HistoryEntry>,

    /// Index of the current location (`None` = empty history)
    current_index: Option<usize>,

    /// Maximum number of entries to keep
    max_entries: usize,
}

impl NavigationHistory {
    /// Create a new history with default max entries (100)
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            current_index: None,
            max_entries: max_entries.max(1),
        }
    }

    /// Record a new location
    ///
    /// Forward entries are truncated first. When the history is full the
    /// oldest entry is dropped.
    pub fn push(&mut self, entry: HistoryEntry) {
        if let Some(current_idx) = self.current_index {
            self.entries.truncate(current_idx + 1);
        }

        self.entries.push(entry);

        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }

        self.current_index = Some(self.entries.len() - 1);
    }

    /// Move to the previous entry
    ///
    /// Returns `None` (and stays put) at the beginning of history.
    pub fn back(&mut self) -> Option<&HistoryEntry> {
        match self.current_index {
            Some(idx) if idx > 0 && idx < self.entries.len() => {
                self.current_index = Some(idx - 1);
                self.entries.get(idx - 1)
            }
            _ => None,
        }
    }

    /// Move to the next entry
    pub fn forward(&mut self) -> Option<&HistoryEntry> {
        match self.current_index {
            Some(idx) if idx + 1 < self.entries.len() => {
                self.current_index = Some(idx + 1);
                self.entries.get(idx + 1)
            }
            _ => None,
        }
    }

    pub fn can_go_back(&self) -> bool {
        matches!(self.current_index, Some(idx) if idx > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        matches!(self.current_index, Some(idx) if idx + 1 < self.entries.len())
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.current_index.and_then(|idx| self.entries.get(idx))
    }

    pub fn current_mut(&mut self) -> Option<&mut HistoryEntry> {
        self.current_index.and_then(|idx| self.entries.get_mut(idx))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// The current entry is for `path` (case-insensitive)
    pub fn is_current_path(&self, path: &Path) -> bool {
        self.current().is_some_and(|entry| {
            crate::primitives::path_utils::paths_equal_ignore_case(&entry.path, path)
        })
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [HistoryEntry] {
        &mut self.entries
    }

    /// Remove every entry for which `is_invalid` returns true
    ///
    /// Index 0 is the anchor and is never removed. Each removal at or before
    /// the current index moves the current index back by one. Returns the
    /// number of removed entries.
    pub fn prune(&mut self, mut is_invalid: impl FnMut(usize, &HistoryEntry) -> bool) -> usize {
        let mut removed = 0;
        for i in (1..self.entries.len()).rev() {
            if !is_invalid(i, &self.entries[i]) {
                continue;
            }
            let entry = self.entries.remove(i);
            removed += 1;
            match self.current_index {
                Some(idx) if i <= idx => {
                    self.current_index = idx.checked_sub(1);
                    tracing::debug!(
                        "Removed invalid history entry {:?}, new index {:?}",
                        entry.path,
                        self.current_index
                    );
                }
                _ => tracing::debug!("Removed invalid forward history entry {:?}", entry.path),
            }
        }
        removed
    }

    /// Drop the current entry and step back one
    ///
    /// Used when the current directory turned out to be unreadable.
    pub fn remove_current(&mut self) -> Option<HistoryEntry> {
        let idx = self.current_index?;
        if idx >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(idx);
        self.current_index = idx.checked_sub(1);
        if self.current_index.is_none() && !self.entries.is_empty() {
            // Forward entries remain reachable from the start
            self.current_index = Some(0);
        }
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_index = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new()
    }
}
