//! Opening items from the list pane
//!
//! Directories and drives become the current directory. A `.lnk` whose
//! target is a directory is followed into the tree instead of being handed
//! to the shell. Everything else is opened by the [`Opener`].

use super::Explorer;
use crate::error::{ExplorerError, Result};
use crate::model::event::UserNotice;
use crate::services::shortcut::is_shortcut;
use crate::view::file_tree::NodeId;
use std::io;
use std::path::{Path, PathBuf};

/// Hands a file to whatever the desktop associates with it
pub trait Opener: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<()>;
}

/// Opens through the desktop's default application
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    #[cfg(feature = "runtime")]
    fn open(&self, path: &Path) -> io::Result<()> {
        open::that_detached(path)
    }

    #[cfg(not(feature = "runtime"))]
    fn open(&self, path: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("cannot open {:?}: built without the runtime feature", path),
        ))
    }
}

/// What launching an item did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The item (or the shortcut's target) is now the current directory
    Navigated(NodeId),
    /// The file was handed to the opener
    Opened(PathBuf),
    /// The shortcut could not be resolved; nothing was opened
    Unresolved,
}

impl Explorer {
    /// Open a node the way a double click in the list pane does
    pub async fn launch(&mut self, id: NodeId) -> Result<LaunchOutcome> {
        let node = self.tree().node(id)?;
        let path = node.path.clone();

        if node.is_container() {
            let current = self.navigator.navigate(id).await?;
            return Ok(LaunchOutcome::Navigated(current));
        }

        if is_shortcut(&path) {
            let info = self.shortcuts.resolve(&path);
            match info.into_result(&path) {
                Ok((target, true)) => return self.follow_shortcut(&path, &target).await,
                Ok((target, false)) => {
                    tracing::debug!("Shortcut {:?} points at file {:?}", path, target);
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.events().notice(UserNotice::Error(e.to_string()));
                    return Ok(LaunchOutcome::Unresolved);
                }
            }
        }

        self.navigator.set_selection_hint(id);
        tracing::debug!("Opening {:?}", path);
        if let Err(e) = self.opener.open(&path) {
            tracing::warn!("Failed to open {:?}: {}", path, e);
            self.events()
                .notice(UserNotice::Error(format!("cannot open {}: {}", path.display(), e)));
            return Err(e.into());
        }
        Ok(LaunchOutcome::Opened(path))
    }

    async fn follow_shortcut(&mut self, link: &Path, target: &Path) -> Result<LaunchOutcome> {
        let Some(id) = self.navigator.tree_mut().find_by_path(target).await else {
            let e = ExplorerError::Shortcut {
                path: link.to_path_buf(),
                reason: format!("{} is not under any drive", target.display()),
            };
            tracing::warn!("{}", e);
            self.events().notice(UserNotice::Error(e.to_string()));
            return Ok(LaunchOutcome::Unresolved);
        };
        tracing::debug!("Following shortcut {:?} to {:?}", link, target);
        let current = self.navigator.navigate(id).await?;
        Ok(LaunchOutcome::Navigated(current))
    }
}
