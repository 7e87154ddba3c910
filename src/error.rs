//! Error types for the explorer core
//!
//! Filesystem plumbing keeps returning `io::Result`; this type is what the
//! navigation, drive and file-action layers hand back to their callers.

use crate::view::file_tree::NodeId;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ExplorerError>;

#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    /// The current directory may only be a directory or a drive.
    #[error("{path:?} is not a directory or drive")]
    NotADirectory { path: PathBuf },

    /// A node id that is not (or no longer) part of the tree.
    #[error("unknown tree node {0}")]
    UnknownNode(NodeId),

    /// No location is reachable: every history entry and every root failed validation.
    #[error("no accessible location to navigate to")]
    NoAccessibleLocation,

    /// A shell copy/move/delete reported a failure code.
    #[error("file operation failed with code {code}: {message}")]
    ShellOperation { code: i32, message: String },

    /// A `.lnk` file could not be resolved.
    #[error("failed to resolve shortcut {path:?}: {reason}")]
    Shortcut { path: PathBuf, reason: String },

    /// Paste was requested with nothing on the clipboard.
    #[error("nothing to paste")]
    EmptyClipboard,

    /// A file action was requested without any items.
    #[error("no items selected")]
    NothingSelected,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ExplorerError {
    /// Contract violations indicate a bug in the caller rather than an
    /// environmental failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            ExplorerError::NotADirectory { .. } | ExplorerError::UnknownNode(_)
        )
    }
}
