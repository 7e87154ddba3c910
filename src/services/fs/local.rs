//! Local disk implementation of [`FsBackend`]
//!
//! Every blocking call runs on tokio's blocking pool so that directory
//! enumeration never stalls the task that owns the tree.

use super::backend::{EntryKind, FileAttributes, FsBackend, FsEntry, FsMetadata};
use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem backend for the local machine
#[derive(Debug, Clone, Default)]
pub struct LocalFsBackend;

impl LocalFsBackend {
    pub fn new() -> Self {
        Self
    }
}

async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .unwrap_or_else(|e| Err(io::Error::other(e)))
}

fn classify(path: &Path, file_type: fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_symlink() {
        match fs::metadata(path) {
            Ok(target) if target.is_dir() => EntryKind::Directory,
            Ok(_) => EntryKind::File,
            Err(_) => EntryKind::BrokenLink,
        }
    } else {
        EntryKind::File
    }
}

#[cfg(windows)]
fn attributes(_path: &Path, metadata: &fs::Metadata) -> FileAttributes {
    use std::os::windows::fs::MetadataExt;
    FileAttributes::from_bits(metadata.file_attributes())
}

/// Dot-files are the hidden entries outside Windows
#[cfg(not(windows))]
fn attributes(path: &Path, metadata: &fs::Metadata) -> FileAttributes {
    let mut attributes = FileAttributes::NONE;
    let dot_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    attributes.set(FileAttributes::HIDDEN, dot_file);
    attributes.set(FileAttributes::READONLY, metadata.permissions().readonly());
    attributes.set(FileAttributes::DIRECTORY, metadata.is_dir());
    attributes
}

fn read_metadata(path: &Path) -> io::Result<FsMetadata> {
    let metadata = fs::metadata(path)?;
    Ok(FsMetadata {
        len: metadata.is_file().then(|| metadata.len()),
        modified: metadata.modified().ok(),
        attributes: attributes(path, &metadata),
    })
}

fn read_dir_sync(path: &Path) -> io::Result<Vec<FsEntry>> {
    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(path)? {
        let dir_entry = dir_entry?;
        let entry_path = dir_entry.path();
        let kind = match dir_entry.file_type() {
            Ok(file_type) => classify(&entry_path, file_type),
            Err(_) => EntryKind::File,
        };
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        entries.push(FsEntry::new(entry_path, name, kind));
    }
    Ok(entries)
}

#[async_trait]
impl FsBackend for LocalFsBackend {
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<FsEntry>> {
        let path = path.to_path_buf();
        blocking(move || read_dir_sync(&path)).await
    }

    async fn get_metadata_batch(&self, paths: &[PathBuf]) -> Vec<io::Result<FsMetadata>> {
        let paths = paths.to_vec();
        let count = paths.len();
        match tokio::task::spawn_blocking(move || {
            paths.iter().map(|p| read_metadata(p)).collect::<Vec<_>>()
        })
        .await
        {
            Ok(results) => results,
            Err(e) => (0..count)
                .map(|_| Err(io::Error::other(e.to_string())))
                .collect(),
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        let path = path.to_path_buf();
        blocking(move || Ok(path.exists())).await.unwrap_or(false)
    }

    async fn is_dir(&self, path: &Path) -> io::Result<bool> {
        let path = path.to_path_buf();
        blocking(move || Ok(path.is_dir())).await
    }

    async fn can_enumerate(&self, path: &Path) -> bool {
        let path = path.to_path_buf();
        blocking(move || {
            // Pulling a single entry is what surfaces ACL denials on some
            // platforms; opening the handle alone is not enough.
            let mut iter = fs::read_dir(&path)?;
            iter.next().transpose()?;
            Ok(())
        })
        .await
        .is_ok()
    }
}
