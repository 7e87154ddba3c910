//! Hand-off of background results to the owning task
//!
//! Directory reads and shell operations run on the tokio runtime, but the
//! tree, history and icon state belong to a single owner. Background tasks
//! therefore never touch that state; they send an [`AsyncMessage`] through
//! the bridge and the owner applies it when it drains the channel.

use super::drives::DriveEvent;
use super::file_ops::{FileOpOutcome, FileOperation};
use crate::view::file_tree::{ChildEntry, NodeId};
use std::io;
use std::sync::mpsc;

#[derive(Debug)]
pub enum AsyncMessage {
    /// Result of reading the subdirectories of `node`
    ChildrenLoaded {
        node: NodeId,
        result: io::Result<Vec<ChildEntry>>,
    },
    /// A queued shell operation has finished
    FileOperationFinished {
        operation: FileOperation,
        outcome: FileOpOutcome,
    },
    DriveChanged(DriveEvent),
}

/// Channel between background tasks and the state owner
#[derive(Debug)]
pub struct AsyncBridge {
    sender: mpsc::Sender<AsyncMessage>,
    receiver: mpsc::Receiver<AsyncMessage>,
}

impl AsyncBridge {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Sender to move into a background task
    pub fn sender(&self) -> mpsc::Sender<AsyncMessage> {
        self.sender.clone()
    }

    /// All messages that have arrived so far, without blocking
    pub fn try_recv_all(&self) -> Vec<AsyncMessage> {
        self.receiver.try_iter().collect()
    }

    /// Next message, if one has arrived
    pub fn try_recv(&self) -> Option<AsyncMessage> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the next message
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<AsyncMessage> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

impl Default for AsyncBridge {
    fn default() -> Self {
        Self::new()
    }
}
