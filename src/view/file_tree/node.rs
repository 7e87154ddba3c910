use crate::primitives::path_utils::file_name_lossy;
use crate::services::icons::IconImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Unique identifier for a tree node
///
/// Ids are handed out by the owning [`FileTree`](super::FileTree) and are
/// never reused, so a stale id can be detected instead of aliasing a new
/// node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// What a node stands for on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Drive,
    Directory,
    File,
}

/// Load status of a node's children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Has visible subdirectories that have not been read yet
    NotLoaded,
    /// Children are being read in the background
    Loading,
    /// Children are known (possibly none)
    Loaded,
    /// File (leaf node, cannot be expanded)
    Leaf,
}

/// Represents a node in the file tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Unique identifier
    pub id: NodeId,
    /// Absolute path on disk
    pub path: PathBuf,
    pub kind: NodeKind,
    /// Terminal path segment (the raw path for drive roots)
    pub name: String,
    /// Replaces `name` when displayed (drive labels)
    pub display_override: Option<String>,
    /// Parent node ID (None for drive roots)
    pub parent: Option<NodeId>,
    /// Child directory IDs, kept in display order
    pub children: Vec<NodeId>,
    /// File IDs from the last listing of this directory
    pub files: Vec<NodeId>,
    /// Current state of the node
    pub state: NodeState,
    pub is_expanded: bool,
    pub is_selected: bool,
    /// Resolved on first use
    pub icon: Option<Arc<IconImage>>,
}

impl TreeNode {
    /// Create a new tree node
    ///
    /// `expandable` only matters for drives and directories: it decides
    /// whether the node starts out waiting for its first expansion or
    /// already known to be empty.
    pub fn new(
        id: NodeId,
        path: PathBuf,
        kind: NodeKind,
        parent: Option<NodeId>,
        expandable: bool,
    ) -> Self {
        let state = match kind {
            NodeKind::File => NodeState::Leaf,
            _ if expandable => NodeState::NotLoaded,
            _ => NodeState::Loaded,
        };
        let name = file_name_lossy(&path);

        Self {
            id,
            path,
            kind,
            name,
            display_override: None,
            parent,
            children: Vec::new(),
            files: Vec::new(),
            state,
            is_expanded: false,
            is_selected: false,
            icon: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name shown to the user
    pub fn display_name(&self) -> &str {
        self.display_override.as_deref().unwrap_or(&self.name)
    }

    pub fn is_drive(&self) -> bool {
        self.kind == NodeKind::Drive
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Drives and directories, the only valid current locations
    pub fn is_container(&self) -> bool {
        !self.is_file()
    }

    /// Children have not been read yet, the node still shows an expander
    pub fn has_placeholder(&self) -> bool {
        self.state == NodeState::NotLoaded
    }

    pub fn is_loading(&self) -> bool {
        self.state == NodeState::Loading
    }

    pub fn is_loaded(&self) -> bool {
        self.state == NodeState::Loaded
    }

    /// Check if this node is a leaf (file, not a directory)
    pub fn is_leaf(&self) -> bool {
        self.state == NodeState::Leaf
    }

    /// Get the depth of this node in the tree
    pub fn depth(&self, get_parent: impl Fn(NodeId) -> Option<NodeId>) -> usize {
        let mut depth = 0;
        let mut current = self.parent;

        while let Some(parent_id) = current {
            depth += 1;
            current = get_parent(parent_id);
        }

        depth
    }
}
