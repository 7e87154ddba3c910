//! Instrumented filesystem backend for testing
//!
//! Wraps any [`FsBackend`], counts every call, optionally delays
//! `read_dir`, and can refuse access to chosen directories. Running the
//! test-suite as root makes real permission bits useless, so denial is
//! simulated here instead.

use super::backend::{FsBackend, FsEntry, FsMetadata};
use async_trait::async_trait;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Metrics tracking for filesystem operations
#[derive(Debug, Clone, Default)]
pub struct BackendMetrics {
    pub read_dir_calls: usize,
    pub metadata_batch_calls: usize,
    /// Number of individual metadata items fetched
    pub metadata_items: usize,
    pub exists_calls: usize,
    pub is_dir_calls: usize,
    pub enumerate_probes: usize,
    /// Listings refused because the path was denied
    pub denied: usize,
}

impl BackendMetrics {
    /// Get total number of filesystem calls
    pub fn total_calls(&self) -> usize {
        self.read_dir_calls
            + self.metadata_batch_calls
            + self.exists_calls
            + self.is_dir_calls
            + self.enumerate_probes
    }
}

#[derive(Debug, Default)]
struct Shared {
    metrics: BackendMetrics,
    denied: HashSet<PathBuf>,
}

/// Counting, fault-injecting wrapper around another backend
#[derive(Clone)]
pub struct InstrumentedFsBackend {
    inner: Arc<dyn FsBackend>,
    read_dir_delay: Duration,
    shared: Arc<Mutex<Shared>>,
}

impl InstrumentedFsBackend {
    pub fn new(inner: Arc<dyn FsBackend>) -> Self {
        Self {
            inner,
            read_dir_delay: Duration::ZERO,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Sleep this long before every directory listing
    pub fn with_read_dir_delay(mut self, delay: Duration) -> Self {
        self.read_dir_delay = delay;
        self
    }

    /// Refuse listings of `path` and of everything below it
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.with_shared(|s| {
            s.denied.insert(path.into());
        });
    }

    /// Lift a denial added with [`deny`](Self::deny)
    pub fn allow(&self, path: &Path) {
        self.with_shared(|s| {
            s.denied.remove(path);
        });
    }

    /// Get a snapshot of current metrics
    pub fn metrics(&self) -> BackendMetrics {
        self.with_shared(|s| s.metrics.clone())
    }

    /// Reset metrics to zero
    pub fn reset_metrics(&self) {
        self.with_shared(|s| s.metrics = BackendMetrics::default());
    }

    fn with_shared<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> R {
        // A poisoned lock only means a test panicked mid-update; the
        // counters are still usable.
        let mut guard = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    fn is_denied(&self, path: &Path) -> bool {
        self.with_shared(|s| s.denied.iter().any(|d| path.starts_with(d)))
    }

    fn refuse(&self, path: &Path) -> io::Error {
        self.with_shared(|s| s.metrics.denied += 1);
        tracing::trace!("Denying access to {:?}", path);
        io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("access denied: {}", path.display()),
        )
    }
}

#[async_trait]
impl FsBackend for InstrumentedFsBackend {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<FsEntry>> {
        if !self.read_dir_delay.is_zero() {
            tokio::time::sleep(self.read_dir_delay).await;
        }
        self.with_shared(|s| s.metrics.read_dir_calls += 1);
        if self.is_denied(path) {
            return Err(self.refuse(path));
        }
        self.inner.read_dir(path).await
    }

    async fn get_metadata_batch(&self, paths: &[PathBuf]) -> Vec<io::Result<FsMetadata>> {
        self.with_shared(|s| {
            s.metrics.metadata_batch_calls += 1;
            s.metrics.metadata_items += paths.len();
        });
        self.inner.get_metadata_batch(paths).await
    }

    async fn exists(&self, path: &Path) -> bool {
        self.with_shared(|s| s.metrics.exists_calls += 1);
        self.inner.exists(path).await
    }

    async fn is_dir(&self, path: &Path) -> io::Result<bool> {
        self.with_shared(|s| s.metrics.is_dir_calls += 1);
        self.inner.is_dir(path).await
    }

    async fn can_enumerate(&self, path: &Path) -> bool {
        self.with_shared(|s| s.metrics.enumerate_probes += 1);
        if self.is_denied(path) {
            self.refuse(path);
            return false;
        }
        self.inner.can_enumerate(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fs::LocalFsBackend;
    use std::time::Instant;
    use tempfile::TempDir;

    fn wrap_local() -> InstrumentedFsBackend {
        InstrumentedFsBackend::new(Arc::new(LocalFsBackend::new()))
    }

    #[tokio::test]
    async fn test_metrics_tracking() {
        let temp_dir = TempDir::new().unwrap();
        let temp_path = temp_dir.path();

        let backend = wrap_local();
        let _ = backend.read_dir(temp_path).await;
        let _ = backend.exists(temp_path).await;
        let _ = backend.is_dir(temp_path).await;

        let metrics = backend.metrics();
        assert_eq!(metrics.read_dir_calls, 1);
        assert_eq!(metrics.exists_calls, 1);
        assert_eq!(metrics.is_dir_calls, 1);
        assert_eq!(metrics.total_calls(), 3);

        backend.reset_metrics();
        assert_eq!(backend.metrics().total_calls(), 0);
    }

    #[tokio::test]
    async fn test_denied_subtree() {
        let temp_dir = TempDir::new().unwrap();
        let locked = temp_dir.path().join("locked");
        std::fs::create_dir_all(locked.join("inner")).unwrap();

        let backend = wrap_local();
        backend.deny(&locked);

        let err = backend.read_dir(&locked).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(!backend.can_enumerate(&locked.join("inner")).await);
        assert!(backend.can_enumerate(temp_dir.path()).await);
        assert_eq!(backend.metrics().denied, 2);

        backend.allow(&locked);
        assert!(backend.read_dir(&locked).await.is_ok());
    }

    #[tokio::test]
    async fn test_read_dir_delay() {
        let temp_dir = TempDir::new().unwrap();
        let backend = wrap_local().with_read_dir_delay(Duration::from_millis(50));

        let start = Instant::now();
        let _ = backend.read_dir(temp_dir.path()).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
