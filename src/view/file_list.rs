//! Contents of one directory as shown in the list pane
//!
//! Subdirectories come from the tree (so their nodes are shared with it),
//! files are re-read from disk on every load. Everything is in natural
//! order with directories first.

use super::file_tree::{natural_order, FileTree, NodeId, NodeKind};
use crate::error::Result;
use crate::primitives::path_utils::names_equal_ignore_case;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub node: NodeId,
    pub name: String,
    pub path: PathBuf,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub struct FileListing {
    pub directory: NodeId,
    pub path: PathBuf,
    pub entries: Vec<ListEntry>,
    /// Index of the entry to highlight
    pub selected: Option<usize>,
}

impl FileListing {
    /// List `dir`, highlighting the entry named `selected_name` if present
    ///
    /// # Errors
    ///
    /// A directory that cannot be read is an error here, unlike when
    /// expanding it in the tree.
    pub async fn load(
        tree: &mut FileTree,
        dir: NodeId,
        selected_name: Option<&str>,
    ) -> Result<Self> {
        tree.expand_node(dir).await?;
        let files = tree.load_files(dir).await?;

        let node = tree.node(dir)?;
        let path = node.path.clone();
        let mut ids = node.children.clone();
        ids.extend(files);

        let mut nodes: Vec<_> = ids.iter().filter_map(|id| tree.get_node(*id)).collect();
        nodes.sort_by(|a, b| natural_order(*a, *b));

        let entries: Vec<ListEntry> = nodes
            .into_iter()
            .map(|n| ListEntry {
                node: n.id,
                name: n.display_name().to_string(),
                path: n.path.clone(),
                kind: n.kind,
            })
            .collect();

        let selected = selected_name.and_then(|name| {
            entries
                .iter()
                .position(|e| names_equal_ignore_case(&e.name, name))
        });

        Ok(Self {
            directory: dir,
            path,
            entries,
            selected,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected_entry(&self) -> Option<&ListEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    pub fn find(&self, name: &str) -> Option<&ListEntry> {
        self.entries
            .iter()
            .find(|e| names_equal_ignore_case(&e.name, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::drives::DriveInfo;
    use crate::services::fs::{FsManager, InstrumentedFsBackend, LocalFsBackend};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, InstrumentedFsBackend, FileTree, NodeId) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("track10")).unwrap();
        fs::create_dir(root.join("track2")).unwrap();
        fs::write(root.join("song10.mp3"), "").unwrap();
        fs::write(root.join("song2.mp3"), "").unwrap();
        fs::write(root.join("Cover.JPG"), "").unwrap();

        let backend = InstrumentedFsBackend::new(Arc::new(LocalFsBackend::new()));
        let mut tree = FileTree::new(Arc::new(FsManager::new(Arc::new(backend.clone()))));
        let id = tree.add_root(&DriveInfo::new(root)).await;
        (temp_dir, backend, tree, id)
    }

    #[tokio::test]
    async fn test_directories_first_in_natural_order() {
        let (_temp_dir, _backend, mut tree, root) = setup().await;

        let listing = FileListing::load(&mut tree, root, None).await.unwrap();

        let names: Vec<_> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["track2", "track10", "Cover.JPG", "song2.mp3", "song10.mp3"]
        );
        assert_eq!(listing.entries[0].kind, NodeKind::Directory);
        assert_eq!(listing.entries[4].kind, NodeKind::File);
        assert_eq!(listing.selected, None);
    }

    #[tokio::test]
    async fn test_selection_restored_by_name() {
        let (_temp_dir, _backend, mut tree, root) = setup().await;

        let listing = FileListing::load(&mut tree, root, Some("TRACK10"))
            .await
            .unwrap();
        assert_eq!(listing.selected_entry().unwrap().name, "track10");

        let listing = FileListing::load(&mut tree, root, Some("missing"))
            .await
            .unwrap();
        assert_eq!(listing.selected, None);
    }

    #[tokio::test]
    async fn test_files_reread_on_each_load() {
        let (temp_dir, _backend, mut tree, root) = setup().await;
        let first = FileListing::load(&mut tree, root, None).await.unwrap();

        fs::write(temp_dir.path().join("new.txt"), "").unwrap();
        fs::remove_file(temp_dir.path().join("song2.mp3")).unwrap();
        let second = FileListing::load(&mut tree, root, None).await.unwrap();

        assert!(second.find("new.txt").is_some());
        assert!(second.find("song2.mp3").is_none());
        // Surviving files keep their nodes
        assert_eq!(
            first.find("song10.mp3").unwrap().node,
            second.find("song10.mp3").unwrap().node
        );
    }

    #[tokio::test]
    async fn test_unreadable_directory_is_an_error() {
        let (temp_dir, backend, mut tree, root) = setup().await;
        backend.deny(temp_dir.path());

        assert!(FileListing::load(&mut tree, root, None).await.is_err());
    }
}
