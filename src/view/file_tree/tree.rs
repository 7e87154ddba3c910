use super::node::{NodeId, NodeKind, NodeState, TreeNode};
use super::sort::{compare_drive_roots, natural_order};
use crate::error::{ExplorerError, Result};
use crate::primitives::path_utils::{
    names_equal_ignore_case, path_key, paths_equal_ignore_case, relative_segments_ignore_case,
    trim_trailing_separators,
};
use crate::services::drives::DriveInfo;
use crate::services::fs::FsManager;
use crate::services::icons::{IconCache, IconImage};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One subdirectory found while loading a node's children
#[derive(Debug, Clone)]
pub struct ChildEntry {
    pub path: PathBuf,
    /// The subdirectory itself has visible subdirectories
    pub expandable: bool,
}

/// Drive/directory tree with lazy loading support
///
/// The tree starts with just the drive roots. A directory's subdirectories
/// are only read when the node is expanded via `expand_node()`. Files are
/// not part of the hierarchy; they are attached to their directory by
/// `load_files()` whenever a listing is requested.
#[derive(Debug)]
pub struct FileTree {
    /// Drive roots in drive order
    roots: Vec<NodeId>,
    /// All nodes indexed by ID
    nodes: HashMap<NodeId, TreeNode>,
    /// Case-insensitive path key to node ID
    path_to_node: HashMap<String, NodeId>,
    selected: Option<NodeId>,
    /// Next node ID to assign
    next_id: usize,
    /// Filesystem manager for async operations
    fs_manager: Arc<FsManager>,
}

impl FileTree {
    /// Create an empty tree; drives are added with [`add_root`](Self::add_root)
    pub fn new(fs_manager: Arc<FsManager>) -> Self {
        Self {
            roots: Vec::new(),
            nodes: HashMap::new(),
            path_to_node: HashMap::new(),
            selected: None,
            next_id: 0,
            fs_manager,
        }
    }

    pub fn fs_manager(&self) -> &Arc<FsManager> {
        &self.fs_manager
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(&id)
    }

    /// Get a node by ID, failing for ids that are not in the tree
    pub fn node(&self, id: NodeId) -> Result<&TreeNode> {
        self.nodes.get(&id).ok_or(ExplorerError::UnknownNode(id))
    }

    fn get_node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get a node by path (case-insensitive, only nodes already loaded)
    pub fn get_node_by_path(&self, path: &Path) -> Option<&TreeNode> {
        self.path_to_node
            .get(&path_key(path))
            .and_then(|id| self.get_node(*id))
    }

    /// Get all nodes
    pub fn all_nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    /// Get number of nodes currently in memory
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.parent)
    }

    pub fn is_drive_root(&self, id: NodeId) -> bool {
        self.roots.contains(&id)
    }

    /// Drive root above (or equal to) `id`
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_ancestors(id).first().copied()
    }

    /// Root node whose path equals `root`
    pub fn find_root(&self, root: &Path) -> Option<NodeId> {
        self.roots.iter().copied().find(|id| {
            self.get_node(*id)
                .is_some_and(|n| paths_equal_ignore_case(&n.path, root))
        })
    }

    /// Add a drive root, or refresh the label of one already present
    pub async fn add_root(&mut self, drive: &DriveInfo) -> NodeId {
        if let Some(existing) = self.find_root(&drive.root) {
            if let Some(node) = self.get_node_mut(existing) {
                node.display_override = Some(drive.display_name());
            }
            return existing;
        }

        let expandable =
            drive.is_ready && self.fs_manager.has_visible_subdirectory(&drive.root).await;
        let id = self.add_node(drive.root.clone(), NodeKind::Drive, None, expandable);
        if let Some(node) = self.get_node_mut(id) {
            node.display_override = Some(drive.display_name());
        }

        self.roots.push(id);
        let nodes = &self.nodes;
        self.roots.sort_by(|a, b| match (nodes.get(a), nodes.get(b)) {
            (Some(a), Some(b)) => compare_drive_roots(&a.path, &b.path),
            _ => Ordering::Equal,
        });
        tracing::debug!("Added drive root {:?} as {}", drive.root, id);
        id
    }

    /// Remove a drive root and everything below it
    pub fn remove_root(&mut self, root: &Path) -> Option<NodeId> {
        let id = self.find_root(root)?;
        self.roots.retain(|r| *r != id);
        self.remove_node_recursive(id);
        tracing::debug!("Removed drive root {:?} ({})", root, id);
        Some(id)
    }

    /// Read the visible, enumerable subdirectories of `path`
    ///
    /// Does not touch any tree state, so it can run in a background task
    /// whose result is handed to [`complete_expand`](Self::complete_expand).
    pub async fn load_children(fs_manager: &FsManager, path: &Path) -> io::Result<Vec<ChildEntry>> {
        let dirs = fs_manager.list_visible_subdirectories(path).await?;
        let mut children = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let expandable = fs_manager.has_visible_subdirectory(&dir.path).await;
            children.push(ChildEntry {
                path: dir.path,
                expandable,
            });
        }
        Ok(children)
    }

    /// Expand a directory node (load its children)
    ///
    /// Does nothing once the children are loaded. Read failures never
    /// surface as errors: the node simply ends up with no children.
    ///
    /// # Errors
    ///
    /// `UnknownNode` for ids not in the tree, `NotADirectory` for files.
    pub async fn expand_node(&mut self, id: NodeId) -> Result<()> {
        let Some(path) = self.begin_expand(id)? else {
            return Ok(());
        };
        let result = Self::load_children(&self.fs_manager, &path).await;
        self.complete_expand(id, result);
        Ok(())
    }

    /// Mark a node as loading and return the path to read
    ///
    /// Returns `None` when the children are already loaded.
    pub fn begin_expand(&mut self, id: NodeId) -> Result<Option<PathBuf>> {
        let node = self.get_node_mut(id).ok_or(ExplorerError::UnknownNode(id))?;
        match node.state {
            NodeState::Leaf => Err(ExplorerError::NotADirectory {
                path: node.path.clone(),
            }),
            NodeState::Loaded => Ok(None),
            NodeState::NotLoaded | NodeState::Loading => {
                node.state = NodeState::Loading;
                Ok(Some(node.path.clone()))
            }
        }
    }

    /// Apply the result of [`load_children`](Self::load_children)
    ///
    /// Results for nodes that were removed or already loaded in the meantime
    /// are dropped. Returns whether the result was applied.
    pub fn complete_expand(&mut self, id: NodeId, result: io::Result<Vec<ChildEntry>>) -> bool {
        match self.get_node(id) {
            Some(node) if node.is_loading() => {}
            Some(_) => {
                tracing::trace!("Dropping stale child listing for {}", id);
                return false;
            }
            None => {
                tracing::debug!("Child listing for removed node {}", id);
                return false;
            }
        }

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                let path = self.get_node(id).map(|n| n.path.clone()).unwrap_or_default();
                match e.kind() {
                    io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                        tracing::debug!("Cannot list {:?}: {}", path, e);
                    }
                    _ => tracing::warn!("Failed to list {:?}: {}", path, e),
                }
                Vec::new()
            }
        };
        self.apply_children(id, entries);
        true
    }

    /// Reconcile the children of `id` with a fresh listing
    ///
    /// Children whose path is still present keep their id and subtree, so
    /// history entries pointing at them stay valid.
    fn apply_children(&mut self, id: NodeId, entries: Vec<ChildEntry>) {
        let existing = self
            .get_node(id)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        let mut by_key: HashMap<String, NodeId> = existing
            .into_iter()
            .filter_map(|child| self.get_node(child).map(|n| (path_key(&n.path), child)))
            .collect();

        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            match by_key.remove(&path_key(&entry.path)) {
                Some(child) => {
                    if let Some(node) = self.get_node_mut(child) {
                        match node.state {
                            NodeState::NotLoaded if !entry.expandable => {
                                node.state = NodeState::Loaded
                            }
                            NodeState::Loaded if entry.expandable && node.children.is_empty() => {
                                node.state = NodeState::NotLoaded
                            }
                            _ => {}
                        }
                    }
                    children.push(child);
                }
                None => {
                    children.push(self.add_node(
                        entry.path,
                        NodeKind::Directory,
                        Some(id),
                        entry.expandable,
                    ));
                }
            }
        }

        for (_, stale) in by_key {
            self.remove_node_recursive(stale);
        }

        self.sort_ids(&mut children);
        if let Some(node) = self.get_node_mut(id) {
            node.children = children;
            node.state = NodeState::Loaded;
        }
    }

    fn sort_ids(&self, ids: &mut [NodeId]) {
        ids.sort_by(|a, b| match (self.get_node(*a), self.get_node(*b)) {
            (Some(a), Some(b)) => natural_order(a, b),
            _ => Ordering::Equal,
        });
    }

    /// Refresh a node (re-read directory contents)
    ///
    /// Unlike `expand_node` this always hits the disk.
    pub async fn refresh_node(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if node.is_file() {
            return Err(ExplorerError::NotADirectory {
                path: node.path.clone(),
            });
        }
        let path = node.path.clone();
        if let Some(node) = self.get_node_mut(id) {
            node.state = NodeState::Loading;
        }
        let result = Self::load_children(&self.fs_manager, &path).await;
        self.complete_expand(id, result);
        Ok(())
    }

    /// Clear the expansion flag; loaded children stay in memory
    pub fn collapse_node(&mut self, id: NodeId) {
        if let Some(node) = self.get_node_mut(id) {
            node.is_expanded = false;
        }
    }

    /// Toggle node expansion (expand if collapsed, collapse if expanded)
    pub async fn toggle_node(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if node.is_file() {
            return Ok(());
        }

        if node.is_expanded {
            self.collapse_node(id);
        } else {
            self.expand_node(id).await?;
            if let Some(node) = self.get_node_mut(id) {
                node.is_expanded = true;
            }
        }
        Ok(())
    }

    /// Re-read the visible files of a directory
    ///
    /// Returns the file node ids in display order. Files that are still
    /// present keep their ids.
    ///
    /// # Errors
    ///
    /// Unlike child loading, a failed listing is reported: the caller has
    /// to react to a directory that became unreadable.
    pub async fn load_files(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.node(id)?;
        if node.is_file() {
            return Err(ExplorerError::NotADirectory {
                path: node.path.clone(),
            });
        }
        let path = node.path.clone();
        let old_files = node.files.clone();

        let entries = self.fs_manager.list_visible_files(&path).await?;

        let mut by_key: HashMap<String, NodeId> = old_files
            .into_iter()
            .filter_map(|f| self.get_node(f).map(|n| (path_key(&n.path), f)))
            .collect();
        let mut files = Vec::with_capacity(entries.len());
        for entry in entries {
            let file = match by_key.remove(&path_key(&entry.path)) {
                Some(existing) => existing,
                None => self.add_node(entry.path, NodeKind::File, Some(id), false),
            };
            files.push(file);
        }
        for (_, stale) in by_key {
            self.remove_node_recursive(stale);
        }

        self.sort_ids(&mut files);
        if let Some(node) = self.get_node_mut(id) {
            node.files = files.clone();
        }
        Ok(files)
    }

    /// Locate a directory by absolute path, loading levels as needed
    ///
    /// The drive root and every segment are matched case-insensitively.
    /// Returns `None` if the path is not under a known drive or any segment
    /// is missing (hidden and unreadable directories count as missing).
    pub async fn find_by_path(&mut self, path: &Path) -> Option<NodeId> {
        let target = trim_trailing_separators(path);
        let (mut current, segments) = self.root_containing(&target)?;

        for segment in segments {
            if let Err(e) = self.expand_node(current).await {
                tracing::warn!("Failed to expand node during path traversal: {}", e);
                return None;
            }

            let node = self.get_node(current)?;
            let child = node.children.iter().copied().find(|child| {
                self.get_node(*child)
                    .is_some_and(|c| names_equal_ignore_case(&c.name, &segment))
            });

            match child {
                Some(id) => current = id,
                None => {
                    tracing::debug!("Segment {:?} of {:?} not found in tree", segment, path);
                    return None;
                }
            }
        }

        Some(current)
    }

    /// Innermost root containing `path`, with the segments below it
    fn root_containing(&self, path: &Path) -> Option<(NodeId, Vec<String>)> {
        self.roots
            .iter()
            .filter_map(|id| {
                let root = self.get_node(*id)?;
                relative_segments_ignore_case(path, &root.path).map(|rest| (*id, rest))
            })
            .min_by_key(|(_, rest)| rest.len())
    }

    /// Mark one node as selected, clearing the previous selection
    pub fn set_selected(&mut self, id: Option<NodeId>) {
        if let Some(previous) = self.selected.take() {
            if let Some(node) = self.get_node_mut(previous) {
                node.is_selected = false;
            }
        }
        if let Some(id) = id {
            if let Some(node) = self.get_node_mut(id) {
                node.is_selected = true;
                self.selected = Some(id);
            }
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Icon of a node, resolved on first use and kept on the node
    pub fn icon(&mut self, id: NodeId, cache: &IconCache) -> Result<Arc<IconImage>> {
        let node = self.get_node_mut(id).ok_or(ExplorerError::UnknownNode(id))?;
        if let Some(icon) = &node.icon {
            return Ok(Arc::clone(icon));
        }
        let icon = cache.icon_for(node.kind, &node.path);
        node.icon = Some(Arc::clone(&icon));
        Ok(icon)
    }

    /// Get all visible nodes in tree order
    ///
    /// Returns a flat list of nodes that should be visible, respecting
    /// the expansion flags of parent directories.
    pub fn get_visible_nodes(&self) -> Vec<NodeId> {
        let mut visible = Vec::new();
        for root in &self.roots {
            self.collect_visible_recursive(*root, &mut visible);
        }
        visible
    }

    /// Recursively collect visible nodes
    fn collect_visible_recursive(&self, id: NodeId, visible: &mut Vec<NodeId>) {
        visible.push(id);

        if let Some(node) = self.get_node(id) {
            if node.is_expanded {
                for &child_id in &node.children {
                    self.collect_visible_recursive(child_id, visible);
                }
            }
        }
    }

    /// Get the parent chain for a node (from root to node)
    pub fn get_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.get_node(id).map(|n| n.id);

        while let Some(node_id) = current {
            ancestors.push(node_id);
            current = self.get_node(node_id).and_then(|n| n.parent);
        }

        ancestors.reverse();
        ancestors
    }

    /// Get the depth of a node (root is 0)
    pub fn get_depth(&self, id: NodeId) -> usize {
        self.get_ancestors(id).len().saturating_sub(1)
    }

    /// Add a new node to the tree
    fn add_node(
        &mut self,
        path: PathBuf,
        kind: NodeKind,
        parent: Option<NodeId>,
        expandable: bool,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        self.path_to_node.insert(path_key(&path), id);
        let node = TreeNode::new(id, path, kind, parent, expandable);
        self.nodes.insert(id, node);

        id
    }

    /// Remove a node and all its descendants
    fn remove_node_recursive(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            for child_id in node.children.into_iter().chain(node.files) {
                self.remove_node_recursive(child_id);
            }

            let key = path_key(&node.path);
            if self.path_to_node.get(&key) == Some(&id) {
                self.path_to_node.remove(&key);
            }
            if self.selected == Some(id) {
                self.selected = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fs::{InstrumentedFsBackend, LocalFsBackend};
    use crate::services::icons::{GenericIconProvider, IconSize};
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn local_manager() -> Arc<FsManager> {
        Arc::new(FsManager::new(Arc::new(LocalFsBackend::new())))
    }

    async fn create_test_tree() -> (TempDir, FileTree, NodeId) {
        let temp_dir = TempDir::new().unwrap();
        let temp_path = temp_dir.path();

        // Create test structure:
        // /
        // ├── dir1/
        // │   ├── file1.txt
        // │   └── file2.txt
        // ├── dir2/
        // │   └── subdir/
        // │       └── file3.txt
        // ├── .hidden/
        // └── file4.txt

        std_fs::create_dir(temp_path.join("dir1")).unwrap();
        std_fs::write(temp_path.join("dir1/file1.txt"), "content1").unwrap();
        std_fs::write(temp_path.join("dir1/file2.txt"), "content2").unwrap();

        std_fs::create_dir(temp_path.join("dir2")).unwrap();
        std_fs::create_dir(temp_path.join("dir2/subdir")).unwrap();
        std_fs::write(temp_path.join("dir2/subdir/file3.txt"), "content3").unwrap();

        std_fs::create_dir(temp_path.join(".hidden")).unwrap();
        std_fs::write(temp_path.join("file4.txt"), "content4").unwrap();

        let mut tree = FileTree::new(local_manager());
        let root = tree
            .add_root(&DriveInfo::new(temp_path).with_label("Test"))
            .await;

        (temp_dir, tree, root)
    }

    fn child_names(tree: &FileTree, id: NodeId) -> Vec<String> {
        tree.get_node(id)
            .unwrap()
            .children
            .iter()
            .map(|c| tree.get_node(*c).unwrap().name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_tree_creation() {
        let (_temp_dir, tree, root_id) = create_test_tree().await;

        assert_eq!(tree.node_count(), 1);
        let root = tree.get_node(root_id).unwrap();
        assert!(root.is_drive());
        assert!(root.has_placeholder());
        assert!(root.children.is_empty());
        assert!(root.display_name().starts_with("Test ("));
    }

    #[tokio::test]
    async fn test_expand_root_lists_visible_directories_only() {
        let (_temp_dir, mut tree, root_id) = create_test_tree().await;

        tree.expand_node(root_id).await.unwrap();

        let root = tree.get_node(root_id).unwrap();
        assert!(root.is_loaded());
        assert!(!root.has_placeholder());
        #[cfg(unix)]
        assert_eq!(child_names(&tree, root_id), vec!["dir1", "dir2"]);
        assert_eq!(tree.node_count(), 1 + root.children.len());
    }

    #[tokio::test]
    async fn test_placeholder_only_with_subdirectories() {
        let (_temp_dir, mut tree, root_id) = create_test_tree().await;
        tree.expand_node(root_id).await.unwrap();

        let children = tree.get_node(root_id).unwrap().children.clone();
        let dir1 = tree.get_node(children[0]).unwrap();
        let dir2 = tree.get_node(children[1]).unwrap();

        // dir1 holds only files, dir2 holds subdir
        assert!(!dir1.has_placeholder());
        assert!(dir1.is_loaded());
        assert!(dir2.has_placeholder());
    }

    #[tokio::test]
    async fn test_expand_is_idempotent() {
        let (_temp_dir, mut tree, root_id) = create_test_tree().await;

        tree.expand_node(root_id).await.unwrap();
        let first = tree.get_node(root_id).unwrap().children.clone();
        let count = tree.node_count();

        tree.expand_node(root_id).await.unwrap();
        assert_eq!(tree.get_node(root_id).unwrap().children, first);
        assert_eq!(tree.node_count(), count);
    }

    #[tokio::test]
    async fn test_expand_file_is_contract_violation() {
        let (_temp_dir, mut tree, root_id) = create_test_tree().await;
        let files = tree.load_files(root_id).await.unwrap();
        assert_eq!(files.len(), 1);

        let err = tree.expand_node(files[0]).await.unwrap_err();
        assert!(err.is_contract_violation());

        let err = tree.expand_node(NodeId(999)).await.unwrap_err();
        assert!(matches!(err, ExplorerError::UnknownNode(NodeId(999))));
    }

    #[tokio::test]
    async fn test_denied_directory_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let temp_path = temp_dir.path();
        std_fs::create_dir(temp_path.join("Public")).unwrap();
        std_fs::create_dir(temp_path.join("System Volume Information")).unwrap();

        let backend = InstrumentedFsBackend::new(Arc::new(LocalFsBackend::new()));
        backend.deny(temp_path.join("System Volume Information"));
        let manager = Arc::new(FsManager::new(Arc::new(backend)));

        let mut tree = FileTree::new(manager);
        let root = tree.add_root(&DriveInfo::new(temp_path)).await;
        tree.expand_node(root).await.unwrap();

        assert_eq!(child_names(&tree, root), vec!["Public"]);
    }

    #[tokio::test]
    async fn test_no_placeholder_when_only_subdirectory_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let temp_path = temp_dir.path();
        std_fs::create_dir_all(temp_path.join("Outer/Locked")).unwrap();

        let backend = InstrumentedFsBackend::new(Arc::new(LocalFsBackend::new()));
        backend.deny(temp_path.join("Outer/Locked"));
        let manager = Arc::new(FsManager::new(Arc::new(backend)));

        let mut tree = FileTree::new(manager);
        let root = tree.add_root(&DriveInfo::new(temp_path)).await;
        tree.expand_node(root).await.unwrap();

        let outer = tree.get_node(root).unwrap().children[0];
        let node = tree.get_node(outer).unwrap();
        assert_eq!(node.name, "Outer");
        assert!(!node.has_placeholder());
        assert!(node.is_loaded());

        tree.expand_node(outer).await.unwrap();
        assert!(tree.get_node(outer).unwrap().children.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_node_gets_empty_children() {
        let temp_dir = TempDir::new().unwrap();
        let temp_path = temp_dir.path();
        std_fs::create_dir_all(temp_path.join("locked/inner")).unwrap();

        let backend = InstrumentedFsBackend::new(Arc::new(LocalFsBackend::new()));
        let manager = Arc::new(FsManager::new(Arc::new(backend.clone())));
        let mut tree = FileTree::new(manager);
        let root = tree.add_root(&DriveInfo::new(temp_path)).await;

        backend.deny(temp_path);
        tree.expand_node(root).await.unwrap();

        let node = tree.get_node(root).unwrap();
        assert!(node.is_loaded());
        assert!(node.children.is_empty());
    }

    #[tokio::test]
    async fn test_background_expand_roundtrip() {
        let (_temp_dir, mut tree, root_id) = create_test_tree().await;

        let path = tree.begin_expand(root_id).unwrap().unwrap();
        assert!(tree.get_node(root_id).unwrap().is_loading());

        let manager = Arc::clone(tree.fs_manager());
        let result = tokio::spawn(async move { FileTree::load_children(&manager, &path).await })
            .await
            .unwrap();

        assert!(tree.complete_expand(root_id, result));
        assert!(tree.get_node(root_id).unwrap().is_loaded());

        // A second completion for the same node is stale
        assert!(!tree.complete_expand(root_id, Ok(Vec::new())));
        assert_eq!(tree.get_node(root_id).unwrap().children.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_keeps_ids_of_surviving_children() {
        let (temp_dir, mut tree, root_id) = create_test_tree().await;
        tree.expand_node(root_id).await.unwrap();
        let before = tree.get_node(root_id).unwrap().children.clone();

        std_fs::create_dir(temp_dir.path().join("dir10")).unwrap();
        std_fs::remove_dir_all(temp_dir.path().join("dir1")).unwrap();
        tree.refresh_node(root_id).await.unwrap();

        assert_eq!(child_names(&tree, root_id), vec!["dir2", "dir10"]);
        let after = tree.get_node(root_id).unwrap().children.clone();
        assert_eq!(after[0], before[1]);
        assert!(!tree.contains(before[0]));
    }

    #[tokio::test]
    async fn test_load_files_reuses_ids() {
        let (temp_dir, mut tree, root_id) = create_test_tree().await;
        tree.expand_node(root_id).await.unwrap();
        let dir1 = tree.get_node(root_id).unwrap().children[0];

        let first = tree.load_files(dir1).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(tree.get_node(first[0]).unwrap().name, "file1.txt");

        std_fs::write(temp_dir.path().join("dir1/file10.txt"), "x").unwrap();
        let second = tree.load_files(dir1).await.unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(second[0], first[0]);
        assert_eq!(tree.get_node(second[2]).unwrap().name, "file10.txt");
    }

    #[tokio::test]
    async fn test_find_by_path_is_case_insensitive() {
        let (temp_dir, mut tree, _root_id) = create_test_tree().await;

        let found = tree
            .find_by_path(&temp_dir.path().join("DIR2").join("SubDir"))
            .await
            .unwrap();
        let node = tree.get_node(found).unwrap();
        assert_eq!(node.name, "subdir");
        assert_eq!(tree.get_depth(found), 2);

        assert!(tree
            .find_by_path(&temp_dir.path().join("dir1/nonexistent"))
            .await
            .is_none());
        assert!(tree
            .find_by_path(Path::new("/definitely/elsewhere"))
            .await
            .is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_find_by_path_skips_hidden() {
        let (temp_dir, mut tree, _root_id) = create_test_tree().await;
        assert!(tree
            .find_by_path(&temp_dir.path().join(".hidden"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_roots_sorted_and_removed_with_subtree() {
        let temp_dir = TempDir::new().unwrap();
        let c = temp_dir.path().join("C");
        let e = temp_dir.path().join("E");
        std_fs::create_dir_all(c.join("Users")).unwrap();
        std_fs::create_dir_all(e.join("Photos")).unwrap();

        let mut tree = FileTree::new(local_manager());
        let e_id = tree.add_root(&DriveInfo::new(&e)).await;
        let c_id = tree.add_root(&DriveInfo::new(&c)).await;
        assert_eq!(tree.roots(), &[c_id, e_id]);

        // Adding again returns the existing root
        assert_eq!(tree.add_root(&DriveInfo::new(&e)).await, e_id);

        let photos = tree.find_by_path(&e.join("Photos")).await.unwrap();
        assert_eq!(tree.root_of(photos), Some(e_id));

        assert_eq!(tree.remove_root(&e), Some(e_id));
        assert_eq!(tree.roots(), &[c_id]);
        assert!(!tree.contains(photos));
        assert!(tree.get_node_by_path(&e.join("Photos")).is_none());
    }

    #[tokio::test]
    async fn test_visible_nodes_follow_expansion_flag() {
        let (_temp_dir, mut tree, root_id) = create_test_tree().await;

        assert_eq!(tree.get_visible_nodes(), vec![root_id]);
        tree.toggle_node(root_id).await.unwrap();
        assert_eq!(tree.get_visible_nodes().len(), 3);

        tree.toggle_node(root_id).await.unwrap();
        assert_eq!(tree.get_visible_nodes(), vec![root_id]);
        // Children survive a collapse
        assert_eq!(tree.get_node(root_id).unwrap().children.len(), 2);
    }

    #[tokio::test]
    async fn test_selection_and_icons() {
        let (_temp_dir, mut tree, root_id) = create_test_tree().await;
        tree.expand_node(root_id).await.unwrap();
        let children = tree.get_node(root_id).unwrap().children.clone();

        tree.set_selected(Some(children[0]));
        tree.set_selected(Some(children[1]));
        assert!(!tree.get_node(children[0]).unwrap().is_selected);
        assert!(tree.get_node(children[1]).unwrap().is_selected);
        assert_eq!(tree.selected(), Some(children[1]));

        let cache = IconCache::new(Arc::new(GenericIconProvider::new()), IconSize::Small);
        let a = tree.icon(children[0], &cache).unwrap();
        let b = tree.icon(children[1], &cache).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(tree.get_node(children[0]).unwrap().icon.is_some());
    }
}
