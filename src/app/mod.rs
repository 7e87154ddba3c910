//! The explorer: tree, history, drives, icons and file actions wired together
//!
//! [`Explorer`] is the single owner of all navigation state. Work that can
//! take a while (child listings, shell operations, drive polling) is pushed
//! onto the tokio runtime and comes back as an
//! [`AsyncMessage`](crate::services::async_bridge::AsyncMessage), which
//! [`Explorer::process_async_messages`] applies.

pub mod drives;
pub mod file_actions;
pub mod history;
pub mod launcher;
pub mod navigator;

pub use drives::DriveSetController;
pub use history::{HistoryEntry, NavigationHistory};
pub use launcher::{LaunchOutcome, Opener, SystemOpener};
pub use navigator::Navigator;

use crate::config::Config;
use crate::error::{ExplorerError, Result};
use crate::model::event::{EventBroadcaster, UserNotice};
use crate::services::async_bridge::{AsyncBridge, AsyncMessage};
use crate::services::clipboard::FileClipboard;
use crate::services::drives::{DriveEvent, DrivePoller, DriveProvider, SystemDriveProvider};
use crate::services::file_ops::{DeleteMode, FileOperationQueue, LocalFileOps, ShellFileOps};
use crate::services::fs::{FsBackend, FsManager, LocalFsBackend};
use crate::services::icons::{GenericIconProvider, IconCache, IconImage, ShellIconProvider};
use crate::services::shortcut::{LnkFileResolver, ShortcutResolver};
use crate::view::file_tree::{FileTree, NodeId};
use std::sync::Arc;
use std::time::Duration;

/// External collaborators the explorer talks to
pub struct Collaborators {
    pub fs: Arc<dyn FsBackend>,
    pub drives: Arc<dyn DriveProvider>,
    pub icons: Arc<dyn ShellIconProvider>,
    pub file_ops: Arc<dyn ShellFileOps>,
    pub shortcuts: Arc<dyn ShortcutResolver>,
    pub opener: Arc<dyn Opener>,
}

impl Collaborators {
    /// Local disk, the system's drives and the portable icon set
    pub fn local(config: &Config) -> Self {
        let delete_mode = if config.explorer.delete_to_trash {
            DeleteMode::Trash
        } else {
            DeleteMode::Permanent
        };
        Self {
            fs: Arc::new(LocalFsBackend::new()),
            drives: Arc::new(
                SystemDriveProvider::new()
                    .with_extra_roots(config.explorer.extra_drive_roots.clone()),
            ),
            icons: Arc::new(GenericIconProvider::new()),
            file_ops: Arc::new(LocalFileOps::new(delete_mode)),
            shortcuts: Arc::new(LnkFileResolver::new()),
            opener: Arc::new(SystemOpener),
        }
    }
}

pub struct Explorer {
    config: Config,
    navigator: Navigator,
    drives: DriveSetController,
    icons: IconCache,
    clipboard: FileClipboard,
    file_ops: FileOperationQueue,
    shortcuts: Arc<dyn ShortcutResolver>,
    opener: Arc<dyn Opener>,
    bridge: AsyncBridge,
    runtime: Option<tokio::runtime::Handle>,
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("navigator", &self.navigator)
            .field("clipboard", &self.clipboard)
            .finish_non_exhaustive()
    }
}

impl Explorer {
    /// Background work is spawned on the runtime current at construction,
    /// if there is one
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        let fs_manager = Arc::new(
            FsManager::new(collaborators.fs).with_show_hidden(config.explorer.show_hidden),
        );
        let navigator = Navigator::new(FileTree::new(fs_manager), EventBroadcaster::default())
            .with_history_capacity(config.explorer.history_capacity);
        let icons = IconCache::new(collaborators.icons, config.icons.size)
            .with_extension_cache(config.icons.cache_by_extension);

        Self {
            navigator,
            drives: DriveSetController::new(collaborators.drives),
            icons,
            clipboard: FileClipboard::new(),
            file_ops: FileOperationQueue::new(collaborators.file_ops),
            shortcuts: collaborators.shortcuts,
            opener: collaborators.opener,
            bridge: AsyncBridge::new(),
            runtime: tokio::runtime::Handle::try_current().ok(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn tree(&self) -> &FileTree {
        self.navigator.tree()
    }

    pub fn events(&self) -> &EventBroadcaster {
        self.navigator.events()
    }

    pub fn clipboard(&self) -> &FileClipboard {
        &self.clipboard
    }

    pub fn icons(&self) -> &IconCache {
        &self.icons
    }

    /// Icon of a tree node
    pub fn icon(&mut self, id: NodeId) -> Result<Arc<IconImage>> {
        self.navigator.tree_mut().icon(id, &self.icons)
    }

    /// Load the drive roots and open the start location
    ///
    /// The configured start path is used when it resolves to a directory in
    /// the tree; otherwise the first readable drive.
    pub async fn start(&mut self) -> Result<NodeId> {
        let roots = self.drives.load_roots(&mut self.navigator).await;
        tracing::info!("Explorer starting with {} drive(s)", roots.len());

        if let Some(start) = self.config.explorer.start_path.clone() {
            match self.navigator.tree_mut().find_by_path(&start).await {
                Some(id) => return self.navigator.navigate(id).await,
                None => tracing::warn!("Start path {:?} not found, using first drive", start),
            }
        }

        let first = roots.first().copied().ok_or(ExplorerError::NoAccessibleLocation)?;
        self.navigator.navigate(first).await
    }

    /// Load a node's children in the background
    ///
    /// The result arrives as `AsyncMessage::ChildrenLoaded`. Without a
    /// runtime the children are not loaded and `false` is returned.
    pub fn request_expand(&mut self, id: NodeId) -> Result<bool> {
        let Some(runtime) = &self.runtime else {
            tracing::debug!("No runtime, cannot expand {} in the background", id);
            return Ok(false);
        };
        let Some(path) = self.navigator.tree_mut().begin_expand(id)? else {
            return Ok(true);
        };

        let fs_manager = Arc::clone(self.navigator.tree().fs_manager());
        let sender = self.bridge.sender();
        runtime.spawn(async move {
            let result = FileTree::load_children(&fs_manager, &path).await;
            let _ = sender.send(AsyncMessage::ChildrenLoaded { node: id, result });
        });
        Ok(true)
    }

    /// Watch the drive set, reporting changes through the bridge
    pub fn spawn_drive_watcher(&self) -> Option<tokio::task::JoinHandle<()>> {
        let runtime = self.runtime.as_ref()?;
        let poller = DrivePoller::new(Arc::clone(self.drives.provider()));
        let every = Duration::from_millis(self.config.explorer.drive_poll_interval_ms);
        Some(poller.spawn(runtime, every, self.bridge.sender()))
    }

    /// Apply a drive notification from an external watcher
    pub async fn handle_drive_event(&mut self, event: &DriveEvent) -> Result<()> {
        self.drives.handle_event(&mut self.navigator, event).await
    }

    /// Wait up to `timeout` for one background result and apply it
    pub async fn wait_for_async_message(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(message) = self.bridge.try_recv() {
                self.apply_async_message(message).await;
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Apply every background result that has arrived
    ///
    /// Returns the number of messages processed.
    pub async fn process_async_messages(&mut self) -> usize {
        let messages = self.bridge.try_recv_all();
        let count = messages.len();
        for message in messages {
            self.apply_async_message(message).await;
        }
        count
    }

    async fn apply_async_message(&mut self, message: AsyncMessage) {
        match message {
            AsyncMessage::ChildrenLoaded { node, result } => {
                if self.navigator.tree_mut().complete_expand(node, result) {
                    self.navigator.emit_tree_changed(node);
                }
            }
            AsyncMessage::FileOperationFinished { operation, outcome } => {
                tracing::debug!("Background file operation finished: {}", operation);
                self.finish_file_operation(&operation, outcome).await;
            }
            AsyncMessage::DriveChanged(event) => {
                if let Err(e) = self.handle_drive_event(&event).await {
                    tracing::warn!("Failed to apply drive change {:?}: {}", event, e);
                    self.events().notice(UserNotice::Error(e.to_string()));
                }
            }
        }
    }
}
