//! Current directory and back/forward/up navigation
//!
//! [`Navigator`] owns the tree and the history and keeps the two in step:
//! every change of the current directory is validated against the disk,
//! recorded in the history (or recognised as a revisit) and announced
//! through the [`EventBroadcaster`]. A location that has become invalid is
//! never left current: the history is pruned and the navigator falls back
//! to the last valid entry or, failing that, the first readable drive.

use super::history::{HistoryEntry, NavigationHistory};
use crate::error::{ExplorerError, Result};
use crate::model::event::{EventBroadcaster, ExplorerEvent, NavigationState};
use crate::view::file_list::FileListing;
use crate::view::file_tree::{FileTree, NodeId};
use std::path::Path;

#[derive(Debug)]
pub struct Navigator {
    tree: FileTree,
    history: NavigationHistory,
    current: Option<NodeId>,
    state: NavigationState,
    events: EventBroadcaster,
}

impl Navigator {
    pub fn new(tree: FileTree, events: EventBroadcaster) -> Self {
        Self {
            tree,
            history: NavigationHistory::new(),
            current: None,
            state: NavigationState::default(),
            events,
        }
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = NavigationHistory::with_capacity(capacity);
        self
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FileTree {
        &mut self.tree
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn events(&self) -> &EventBroadcaster {
        &self.events
    }

    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current
            .and_then(|id| self.tree.get_node(id))
            .map(|n| n.path.as_path())
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    /// Child to highlight in the current directory, if the history has one
    pub fn selection_hint(&self) -> Option<NodeId> {
        let entry = self.history.current()?;
        if Some(entry.node) != self.current {
            return None;
        }
        entry.selected.filter(|id| self.tree.contains(*id))
    }

    /// Remember `child` as the entry to highlight in the current directory
    pub fn set_selection_hint(&mut self, child: NodeId) {
        if self.tree.parent_of(child) != self.current {
            return;
        }
        if let Some(entry) = self.history.current_mut() {
            entry.selected = Some(child);
        }
    }

    /// A node is a valid location while it is in the tree and its
    /// directory can be enumerated
    pub async fn is_valid_location(&self, id: NodeId) -> bool {
        match self.tree.get_node(id) {
            Some(node) if node.is_container() => {
                self.tree.fs_manager().is_enumerable_dir(&node.path).await
            }
            _ => false,
        }
    }

    /// Node an entry refers to, re-bound by path if its node was replaced
    fn resolve_entry(&self, entry: &HistoryEntry) -> Option<NodeId> {
        if self.tree.contains(entry.node) {
            return Some(entry.node);
        }
        self.tree
            .get_node_by_path(&entry.path)
            .filter(|n| n.is_container())
            .map(|n| n.id)
    }

    /// Remove history entries whose location is no longer valid
    ///
    /// The first entry is kept even when invalid. Returns the number of
    /// removed entries.
    pub async fn prune_invalid(&mut self) -> usize {
        let mut invalid = Vec::with_capacity(self.history.len());
        let mut rebound = Vec::new();
        for (i, entry) in self.history.entries().iter().enumerate() {
            let valid = match self.resolve_entry(entry) {
                Some(id) => {
                    if id != entry.node {
                        rebound.push((i, id));
                    }
                    self.is_valid_location(id).await
                }
                None => false,
            };
            invalid.push(!valid);
        }

        for (i, id) in rebound {
            self.history.entries_mut()[i].node = id;
        }
        let removed = self.history.prune(|i, _| invalid[i]);
        if removed > 0 {
            tracing::debug!(
                "Pruned {} history entries, index now {:?}",
                removed,
                self.history.current_index()
            );
        }
        removed
    }

    /// Make `to` the current directory and record it in the history
    ///
    /// Returns the node that ended up current, which differs from `to` when
    /// `to` was no longer valid and a fallback was used.
    ///
    /// # Errors
    ///
    /// `UnknownNode` / `NotADirectory` for contract violations, and
    /// `NoAccessibleLocation` when neither `to` nor any fallback is valid.
    pub async fn navigate(&mut self, to: NodeId) -> Result<NodeId> {
        let node = self.tree.node(to).inspect_err(|e| tracing::error!("{}", e))?;
        if !node.is_container() {
            let err = ExplorerError::NotADirectory {
                path: node.path.clone(),
            };
            tracing::error!("{}", err);
            return Err(err);
        }
        self.dispatch(Some(to)).await
    }

    async fn dispatch(&mut self, to: Option<NodeId>) -> Result<NodeId> {
        let target = match to {
            Some(id) if self.is_valid_location(id).await => id,
            _ => {
                if let Some(node) = to.and_then(|id| self.tree.get_node(id)) {
                    tracing::debug!("{:?} is not accessible, falling back", node.path);
                }
                match self.fallback_target().await {
                    Some(id) => id,
                    None => {
                        self.update_state();
                        return Err(ExplorerError::NoAccessibleLocation);
                    }
                }
            }
        };

        self.record(target);
        let result = self.set_current(target).await;
        self.update_state();
        result.map(|_| target)
    }

    async fn fallback_target(&mut self) -> Option<NodeId> {
        self.prune_invalid().await;

        let candidate = self
            .history
            .current()
            .and_then(|entry| self.resolve_entry(entry));
        if let Some(id) = candidate {
            if self.is_valid_location(id).await {
                return Some(id);
            }
        }

        for root in self.tree.roots().to_vec() {
            if self.is_valid_location(root).await {
                tracing::debug!("Falling back to drive {}", root);
                return Some(root);
            }
        }
        None
    }

    /// Record `target` unless it is the current entry's location
    fn record(&mut self, target: NodeId) {
        let Some(node) = self.tree.get_node(target) else {
            return;
        };
        let path = node.path.clone();

        if self.history.is_current_path(&path) {
            if let Some(entry) = self.history.current_mut() {
                entry.node = target;
            }
            return;
        }

        let mut entry = HistoryEntry::new(target, path);
        if let Some(previous) = self.history.current().map(|e| e.node) {
            if self.tree.parent_of(target) == Some(previous) {
                // Going down: highlight this child when coming back up
                if let Some(prev_entry) = self.history.current_mut() {
                    prev_entry.selected = Some(target);
                }
            } else if self.tree.parent_of(previous) == Some(target) {
                entry.selected = Some(previous);
            }
        }

        tracing::debug!("Recording history entry {:?}", entry.path);
        self.history.push(entry);
    }

    /// Change the current directory without touching the history
    ///
    /// Loads the children of the new directory and emits one change event.
    /// Assigning the current directory again is a no-op that returns
    /// `Ok(false)`.
    pub async fn set_current(&mut self, id: NodeId) -> Result<bool> {
        let node = self.tree.node(id).inspect_err(|e| tracing::error!("{}", e))?;
        if !node.is_container() {
            let err = ExplorerError::NotADirectory {
                path: node.path.clone(),
            };
            tracing::error!("{}", err);
            return Err(err);
        }
        if self.current == Some(id) {
            return Ok(false);
        }
        let was_loaded = node.is_loaded();

        self.current = Some(id);
        self.tree.expand_node(id).await?;
        self.tree.set_selected(Some(id));
        if !was_loaded {
            self.emit_tree_changed(id);
        }
        self.emit_current_changed();
        Ok(true)
    }

    /// Step back in the history
    ///
    /// Returns `Ok(None)` at the beginning of the history.
    pub async fn back(&mut self) -> Result<Option<NodeId>> {
        let Some(entry) = self.history.back().cloned() else {
            return Ok(None);
        };
        tracing::debug!("Navigating back to {:?}", entry.path);
        let target = self.resolve_entry(&entry);
        self.dispatch(target).await.map(Some)
    }

    /// Step forward in the history
    pub async fn forward(&mut self) -> Result<Option<NodeId>> {
        let Some(entry) = self.history.forward().cloned() else {
            return Ok(None);
        };
        tracing::debug!("Navigating forward to {:?}", entry.path);
        let target = self.resolve_entry(&entry);
        self.dispatch(target).await.map(Some)
    }

    /// Navigate to the parent of the current directory
    ///
    /// Returns `Ok(None)` at a drive root.
    pub async fn up(&mut self) -> Result<Option<NodeId>> {
        let Some(parent) = self.current.and_then(|id| self.tree.parent_of(id)) else {
            return Ok(None);
        };
        self.navigate(parent).await.map(Some)
    }

    /// Re-validate and reload the current directory
    ///
    /// Emits a change event even though the current directory may be the
    /// same. If the current directory went away (deleted, drive removed)
    /// the usual fallback applies.
    pub async fn force_update(&mut self) -> Result<NodeId> {
        let current = match self.current {
            Some(id) if self.is_valid_location(id).await => id,
            _ => {
                tracing::debug!("Current directory is gone, re-validating");
                return self.dispatch(None).await;
            }
        };

        self.tree.refresh_node(current).await?;
        self.record(current);
        self.tree.set_selected(Some(current));
        self.emit_tree_changed(current);
        self.emit_current_changed();
        self.update_state();
        Ok(current)
    }

    /// List the current directory for the list pane
    ///
    /// The remembered child is pre-selected. If the directory cannot be
    /// read its history entry is dropped before the error is returned.
    pub async fn list_current(&mut self) -> Result<FileListing> {
        let dir = self.current.ok_or(ExplorerError::NoAccessibleLocation)?;
        let hint = self
            .selection_hint()
            .and_then(|id| self.tree.get_node(id))
            .map(|n| n.name.clone());

        match FileListing::load(&mut self.tree, dir, hint.as_deref()).await {
            Ok(listing) => Ok(listing),
            Err(ExplorerError::Io(e)) => {
                tracing::warn!("Cannot list current directory: {}", e);
                let is_current_entry = self
                    .current_path()
                    .is_some_and(|path| self.history.is_current_path(path));
                if is_current_entry {
                    self.drop_current_entry();
                }
                Err(ExplorerError::Io(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Drop the current history entry after its directory failed to list
    pub fn drop_current_entry(&mut self) {
        if let Some(entry) = self.history.remove_current() {
            tracing::debug!("Removed unreadable history entry {:?}", entry.path);
        }
        self.update_state();
    }

    fn update_state(&mut self) {
        let can_go_up = self
            .current
            .is_some_and(|id| !self.tree.is_drive_root(id) && self.tree.parent_of(id).is_some());
        self.state = NavigationState {
            can_go_back: self.history.can_go_back(),
            can_go_forward: self.history.can_go_forward(),
            can_go_up,
        };
        self.events
            .emit(ExplorerEvent::NavigationStateChanged(self.state));
    }

    fn emit_current_changed(&self) {
        let Some(node) = self.current.and_then(|id| self.tree.get_node(id)) else {
            return;
        };
        let selected = self
            .selection_hint()
            .and_then(|id| self.tree.get_node(id))
            .map(|n| n.name.clone());
        self.events.emit(ExplorerEvent::CurrentDirectoryChanged {
            path: node.path.clone(),
            selected,
        });
    }

    pub(crate) fn emit_tree_changed(&self, id: NodeId) {
        let parent = self.tree.get_node(id).map(|n| n.path.clone());
        self.events.emit(ExplorerEvent::TreeChanged { parent });
    }
}
