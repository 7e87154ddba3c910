use super::backend::{FsBackend, FsEntry, FsMetadata};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};

/// Type alias for pending directory requests map
type PendingDirRequests =
    Arc<Mutex<HashMap<PathBuf, Vec<oneshot::Sender<io::Result<Vec<FsEntry>>>>>>>;

/// Manages filesystem operations with request deduplication
///
/// The FsManager sits between the explorer model and the backend. Besides
/// deduplicating concurrent listings of the same directory it owns the
/// filtering rules the tree relies on: hidden entries are dropped and
/// directories that cannot be enumerated are treated as absent.
pub struct FsManager {
    backend: Arc<dyn FsBackend>,
    /// Map of path -> list of channels waiting for the result
    pending_dir_requests: PendingDirRequests,
    show_hidden: bool,
}

impl fmt::Debug for FsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsManager")
            .field("backend", &"<dyn FsBackend>")
            .field("show_hidden", &self.show_hidden)
            .finish()
    }
}

impl FsManager {
    /// Create a new filesystem manager with the given backend
    pub fn new(backend: Arc<dyn FsBackend>) -> Self {
        Self {
            backend,
            pending_dir_requests: Arc::new(Mutex::new(HashMap::new())),
            show_hidden: false,
        }
    }

    /// Keep hidden entries in listings instead of dropping them
    pub fn with_show_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    /// List directory contents with request deduplication
    ///
    /// If multiple requests for the same directory are made concurrently,
    /// only one filesystem operation will be performed and all requesters
    /// will receive the same result.
    pub async fn list_dir(&self, path: PathBuf) -> io::Result<Vec<FsEntry>> {
        let (rx, should_execute) = {
            let mut pending = self.pending_dir_requests.lock().await;
            let (tx, rx) = oneshot::channel();
            if let Some(senders) = pending.get_mut(&path) {
                senders.push(tx);
                (rx, false)
            } else {
                pending.insert(path.clone(), vec![tx]);
                (rx, true)
            }
        };

        if !should_execute {
            return rx
                .await
                .unwrap_or_else(|_| Err(io::Error::other("Request cancelled")));
        }

        let result = self.backend.read_dir(&path).await;

        let mut pending = self.pending_dir_requests.lock().await;
        if let Some(senders) = pending.remove(&path) {
            // The first sender is our own; the rest belong to waiters
            for sender in senders.into_iter().skip(1) {
                let _ = sender.send(
                    result
                        .as_ref()
                        .map(|v| v.clone())
                        .map_err(|e| io::Error::new(e.kind(), e.to_string())),
                );
            }
        }

        result
    }

    /// Get metadata for multiple paths
    pub async fn get_metadata(&self, paths: Vec<PathBuf>) -> Vec<io::Result<FsMetadata>> {
        self.backend.get_metadata_batch(&paths).await
    }

    /// A directory that exists and whose listing succeeds
    ///
    /// This is the validity test for navigation targets and history entries.
    pub async fn is_enumerable_dir(&self, path: &Path) -> bool {
        if path.as_os_str().is_empty() || !self.backend.exists(path).await {
            return false;
        }
        matches!(self.backend.is_dir(path).await, Ok(true)) && self.backend.can_enumerate(path).await
    }

    /// List directory and attach metadata to every entry
    pub async fn list_dir_with_metadata(&self, path: PathBuf) -> io::Result<Vec<FsEntry>> {
        let mut entries = self.list_dir(path).await?;

        let paths: Vec<_> = entries.iter().map(|e| e.path.clone()).collect();
        let metadata_results = self.get_metadata(paths).await;

        for (entry, metadata_result) in entries.iter_mut().zip(metadata_results) {
            if let Ok(metadata) = metadata_result {
                entry.metadata = Some(metadata);
            }
        }

        Ok(entries)
    }

    /// Immediate subdirectories that belong in the tree
    ///
    /// Hidden directories are skipped, and so is every directory whose own
    /// listing fails, so that "empty" and "denied" never look alike.
    pub async fn list_visible_subdirectories(&self, path: &Path) -> io::Result<Vec<FsEntry>> {
        let entries = self.list_dir_with_metadata(path.to_path_buf()).await?;
        let mut visible = Vec::new();
        for entry in entries {
            if !entry.is_dir() || (!self.show_hidden && entry.is_hidden()) {
                continue;
            }
            if self.backend.can_enumerate(&entry.path).await {
                visible.push(entry);
            } else {
                tracing::trace!("Skipping unreadable directory {:?}", entry.path);
            }
        }
        Ok(visible)
    }

    /// Whether at least one non-hidden subdirectory exists
    ///
    /// Used when a node is created to decide if it starts out expandable.
    /// A subdirectory only counts if it can be enumerated, matching
    /// [`list_visible_subdirectories`](Self::list_visible_subdirectories).
    /// Errors count as "no subdirectories".
    pub async fn has_visible_subdirectory(&self, path: &Path) -> bool {
        let Ok(entries) = self.list_dir_with_metadata(path.to_path_buf()).await else {
            return false;
        };
        for entry in entries {
            if !entry.is_dir() || (!self.show_hidden && entry.is_hidden()) {
                continue;
            }
            if self.backend.can_enumerate(&entry.path).await {
                return true;
            }
        }
        false
    }

    /// Non-directory entries of a directory, hidden ones removed
    pub async fn list_visible_files(&self, path: &Path) -> io::Result<Vec<FsEntry>> {
        let entries = self.list_dir_with_metadata(path.to_path_buf()).await?;
        Ok(entries
            .into_iter()
            .filter(|e| !e.is_dir() && (self.show_hidden || !e.is_hidden()))
            .collect())
    }
}

impl Clone for FsManager {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            pending_dir_requests: Arc::clone(&self.pending_dir_requests),
            show_hidden: self.show_hidden,
        }
    }
}
