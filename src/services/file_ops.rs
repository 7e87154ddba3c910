//! Shell copy/move/delete operations
//!
//! The facility behind [`ShellFileOps`] is not reentrant, so every call
//! goes through a [`FileOperationQueue`] that keeps at most one operation
//! in flight. A cancelled operation is reported as
//! [`FileOpOutcome::Cancelled`], which callers must not treat as an error.

use crate::error::ExplorerError;
use async_trait::async_trait;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// How a shell operation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOpOutcome {
    Completed,
    /// The user aborted the operation from the shell's own dialog
    Cancelled,
    Failed { code: i32, message: String },
}

impl FileOpOutcome {
    pub fn from_io_error(e: &io::Error) -> Self {
        FileOpOutcome::Failed {
            code: e.raw_os_error().unwrap_or(-1),
            message: e.to_string(),
        }
    }

    /// `Ok(true)` when completed, `Ok(false)` when cancelled
    pub fn into_result(self) -> Result<bool, ExplorerError> {
        match self {
            FileOpOutcome::Completed => Ok(true),
            FileOpOutcome::Cancelled => Ok(false),
            FileOpOutcome::Failed { code, message } => {
                Err(ExplorerError::ShellOperation { code, message })
            }
        }
    }
}

/// A batched operation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    Copy {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    Move {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    Delete {
        sources: Vec<PathBuf>,
    },
}

impl FileOperation {
    pub fn sources(&self) -> &[PathBuf] {
        match self {
            FileOperation::Copy { sources, .. }
            | FileOperation::Move { sources, .. }
            | FileOperation::Delete { sources } => sources,
        }
    }
}

impl fmt::Display for FileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (verb, count) = match self {
            FileOperation::Copy { sources, .. } => ("copy", sources.len()),
            FileOperation::Move { sources, .. } => ("move", sources.len()),
            FileOperation::Delete { sources } => ("delete", sources.len()),
        };
        write!(f, "{} {} item(s)", verb, count)
    }
}

/// Shell file-operation collaborator
#[async_trait]
pub trait ShellFileOps: Send + Sync {
    async fn copy(&self, sources: &[PathBuf], destination: &Path) -> FileOpOutcome;
    async fn move_items(&self, sources: &[PathBuf], destination: &Path) -> FileOpOutcome;
    async fn delete(&self, sources: &[PathBuf]) -> FileOpOutcome;
}

/// Trailing separators confuse the shell's double-NUL path lists
pub fn normalize_operation_path(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    let trimmed = text.trim_end_matches(['\\', '/']);
    if trimmed.is_empty() {
        path.to_path_buf()
    } else {
        PathBuf::from(trimmed)
    }
}

/// Serializes shell operations: one in flight, later callers wait their turn
#[derive(Clone)]
pub struct FileOperationQueue {
    ops: Arc<dyn ShellFileOps>,
    gate: Arc<Mutex<()>>,
}

impl fmt::Debug for FileOperationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileOperationQueue").finish_non_exhaustive()
    }
}

impl FileOperationQueue {
    pub fn new(ops: Arc<dyn ShellFileOps>) -> Self {
        Self {
            ops,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Run one operation once every earlier one has finished
    pub async fn run(&self, operation: &FileOperation) -> FileOpOutcome {
        let _turn = self.gate.lock().await;
        tracing::debug!("Starting file operation: {}", operation);

        let outcome = match operation {
            FileOperation::Copy {
                sources,
                destination,
            } => {
                let sources: Vec<_> = sources.iter().map(|p| normalize_operation_path(p)).collect();
                self.ops
                    .copy(&sources, &normalize_operation_path(destination))
                    .await
            }
            FileOperation::Move {
                sources,
                destination,
            } => {
                let sources: Vec<_> = sources.iter().map(|p| normalize_operation_path(p)).collect();
                self.ops
                    .move_items(&sources, &normalize_operation_path(destination))
                    .await
            }
            FileOperation::Delete { sources } => {
                let sources: Vec<_> = sources.iter().map(|p| normalize_operation_path(p)).collect();
                self.ops.delete(&sources).await
            }
        };

        match &outcome {
            FileOpOutcome::Completed => tracing::debug!("Finished file operation: {}", operation),
            FileOpOutcome::Cancelled => tracing::info!("File operation cancelled: {}", operation),
            FileOpOutcome::Failed { code, message } => {
                tracing::warn!("File operation failed ({}): {} {}", operation, code, message)
            }
        }
        outcome
    }
}

/// What delete does with the removed items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteMode {
    /// Move to the system trash / recycle bin
    #[cfg_attr(feature = "runtime", default)]
    Trash,
    #[cfg_attr(not(feature = "runtime"), default)]
    Permanent,
}

/// [`ShellFileOps`] on top of `std::fs`
///
/// Never reports `Cancelled`: there is no confirmation dialog.
#[derive(Debug, Clone, Default)]
pub struct LocalFileOps {
    delete_mode: DeleteMode,
}

impl LocalFileOps {
    pub fn new(delete_mode: DeleteMode) -> Self {
        Self { delete_mode }
    }
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{:?} already exists", path),
    )
}

fn copy_recursive(source: &Path, destination: &Path) -> io::Result<()> {
    if fs::symlink_metadata(destination).is_ok() {
        return Err(already_exists(destination));
    }
    if fs::metadata(source)?.is_dir() {
        fs::create_dir(destination)?;
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &destination.join(entry.file_name()))?;
        }
        Ok(())
    } else {
        fs::copy(source, destination).map(|_| ())
    }
}

fn target_for(source: &Path, destination: &Path) -> io::Result<PathBuf> {
    let name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot operate on {:?}", source),
        )
    })?;
    let target = destination.join(name);
    if destination.starts_with(source) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{:?} is inside {:?}", destination, source),
        ));
    }
    Ok(target)
}

/// First free "<stem> - Copy" / "<stem> - Copy (n)" sibling of `target`
///
/// Returns `target` unchanged when nothing occupies it yet.
fn free_copy_target(target: &Path) -> io::Result<PathBuf> {
    if fs::symlink_metadata(target).is_err() {
        return Ok(target.to_path_buf());
    }
    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    let is_dir = fs::metadata(target).is_ok_and(|m| m.is_dir());
    let (stem, extension) = match (target.file_stem(), target.extension()) {
        (Some(stem), Some(ext)) if !is_dir => (
            stem.to_string_lossy().into_owned(),
            format!(".{}", ext.to_string_lossy()),
        ),
        _ => (
            target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            String::new(),
        ),
    };

    for n in 1..=u16::MAX {
        let name = if n == 1 {
            format!("{} - Copy{}", stem, extension)
        } else {
            format!("{} - Copy ({}){}", stem, n, extension)
        };
        let candidate = parent.join(name);
        if fs::symlink_metadata(&candidate).is_err() {
            return Ok(candidate);
        }
    }
    Err(already_exists(target))
}

fn move_one(source: &Path, target: &Path) -> io::Result<()> {
    if source == target {
        return Ok(());
    }
    // rename silently replaces files on most platforms
    if fs::symlink_metadata(target).is_ok() {
        return Err(already_exists(target));
    }
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        // Different volume: fall back to copy + delete
        Err(_) if fs::symlink_metadata(source).is_ok() => {
            copy_recursive(source, target)?;
            if fs::metadata(source)?.is_dir() {
                fs::remove_dir_all(source)
            } else {
                fs::remove_file(source)
            }
        }
        Err(e) => Err(e),
    }
}

fn delete_one(path: &Path, mode: DeleteMode) -> io::Result<()> {
    match mode {
        #[cfg(feature = "runtime")]
        DeleteMode::Trash => trash::delete(path).map_err(|e| io::Error::other(e.to_string())),
        #[cfg(not(feature = "runtime"))]
        DeleteMode::Trash => delete_one(path, DeleteMode::Permanent),
        DeleteMode::Permanent => {
            if fs::symlink_metadata(path)?.is_dir() {
                fs::remove_dir_all(path)
            } else {
                fs::remove_file(path)
            }
        }
    }
}

async fn run_blocking<F>(f: F) -> FileOpOutcome
where
    F: FnOnce() -> io::Result<()> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(())) => FileOpOutcome::Completed,
        Ok(Err(e)) => FileOpOutcome::from_io_error(&e),
        Err(e) => FileOpOutcome::Failed {
            code: -1,
            message: e.to_string(),
        },
    }
}

#[async_trait]
impl ShellFileOps for LocalFileOps {
    async fn copy(&self, sources: &[PathBuf], destination: &Path) -> FileOpOutcome {
        let sources = sources.to_vec();
        let destination = destination.to_path_buf();
        run_blocking(move || {
            for source in &sources {
                let target = free_copy_target(&target_for(source, &destination)?)?;
                copy_recursive(source, &target)?;
            }
            Ok(())
        })
        .await
    }

    async fn move_items(&self, sources: &[PathBuf], destination: &Path) -> FileOpOutcome {
        let sources = sources.to_vec();
        let destination = destination.to_path_buf();
        run_blocking(move || {
            for source in &sources {
                let target = target_for(source, &destination)?;
                move_one(source, &target)?;
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, sources: &[PathBuf]) -> FileOpOutcome {
        let sources = sources.to_vec();
        let mode = self.delete_mode;
        run_blocking(move || {
            for source in &sources {
                delete_one(source, mode)?;
            }
            Ok(())
        })
        .await
    }
}
