//! Path clipboard for cut/copy/paste of files
//!
//! This is an in-process clipboard of paths, not the system clipboard.
//! Pasting consumes the contents with [`FileClipboard::take`].

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipboardAction {
    #[default]
    None,
    Cut,
    Copy,
}

#[derive(Debug, Clone, Default)]
pub struct FileClipboard {
    sources: Vec<PathBuf>,
    action: ClipboardAction,
}

impl FileClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark paths to be moved on the next paste
    pub fn cut(&mut self, sources: Vec<PathBuf>) {
        self.set(sources, ClipboardAction::Cut);
    }

    /// Mark paths to be copied on the next paste
    pub fn copy(&mut self, sources: Vec<PathBuf>) {
        self.set(sources, ClipboardAction::Copy);
    }

    fn set(&mut self, sources: Vec<PathBuf>, action: ClipboardAction) {
        if sources.is_empty() {
            self.clear();
            return;
        }
        tracing::debug!("Clipboard {:?}: {} path(s)", action, sources.len());
        self.sources = sources;
        self.action = action;
    }

    pub fn action(&self) -> ClipboardAction {
        self.action
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() || self.action == ClipboardAction::None
    }

    /// Remove and return the contents, leaving the clipboard empty
    pub fn take(&mut self) -> Option<(ClipboardAction, Vec<PathBuf>)> {
        if self.is_empty() {
            return None;
        }
        let action = std::mem::take(&mut self.action);
        Some((action, std::mem::take(&mut self.sources)))
    }

    pub fn clear(&mut self) {
        self.sources.clear();
        self.action = ClipboardAction::None;
    }
}
