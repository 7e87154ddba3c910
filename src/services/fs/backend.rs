use async_trait::async_trait;
use std::io;
use std::ops::BitOr;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What a directory entry resolves to
///
/// Links are followed: a link to a directory is a `Directory`. Only a link
/// whose target is gone stays a `BrokenLink`, which the explorer treats as
/// a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    BrokenLink,
}

/// Attribute bits of an entry, numbered like the Win32 `FILE_ATTRIBUTE_*`
/// constants so Windows values can be taken over unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileAttributes(u32);

impl FileAttributes {
    pub const NONE: Self = Self(0);
    pub const READONLY: Self = Self(0x1);
    pub const HIDDEN: Self = Self(0x2);
    pub const SYSTEM: Self = Self(0x4);
    pub const DIRECTORY: Self = Self(0x10);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set or clear `flag`
    pub fn set(&mut self, flag: Self, on: bool) {
        if on {
            self.0 |= flag.0;
        } else {
            self.0 &= !flag.0;
        }
    }
}

impl BitOr for FileAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Size, time and attributes of one entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsMetadata {
    /// Byte length; `None` for directories
    pub len: Option<u64>,
    pub modified: Option<SystemTime>,
    pub attributes: FileAttributes,
}

impl FsMetadata {
    pub fn is_hidden(&self) -> bool {
        self.attributes.contains(FileAttributes::HIDDEN)
    }

    pub fn is_readonly(&self) -> bool {
        self.attributes.contains(FileAttributes::READONLY)
    }
}

/// One name inside a directory
///
/// `read_dir` leaves `metadata` empty; the hidden flag (and with it the
/// explorer's visibility rule) needs a `get_metadata_batch` round trip.
#[derive(Debug, Clone)]
pub struct FsEntry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
    pub metadata: Option<FsMetadata>,
}

impl FsEntry {
    pub fn new(path: PathBuf, name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            path,
            name: name.into(),
            kind,
            metadata: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    /// Entries whose metadata was never fetched count as visible
    pub fn is_hidden(&self) -> bool {
        self.metadata.as_ref().is_some_and(FsMetadata::is_hidden)
    }
}

/// Disk access used by the tree, the listing and the navigator
///
/// Tests wrap or replace the local implementation to count calls, slow
/// things down or refuse access to part of the disk.
#[async_trait]
pub trait FsBackend: Send + Sync {
    /// Entries of a directory, without metadata
    ///
    /// # Errors
    ///
    /// The directory is missing, not a directory, or cannot be read.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<FsEntry>>;

    /// Metadata for each path, in input order
    async fn get_metadata_batch(&self, paths: &[PathBuf]) -> Vec<io::Result<FsMetadata>>;

    async fn exists(&self, path: &Path) -> bool;

    /// `Ok(false)` for files; an error if the path cannot be inspected
    async fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Whether a listing of `path` would succeed right now
    ///
    /// Directories can exist and still refuse a listing (ACLs, a drive
    /// that went away), so implementations should pull at least one entry
    /// rather than trust metadata.
    async fn can_enumerate(&self, path: &Path) -> bool {
        self.read_dir(path).await.is_ok()
    }
}
