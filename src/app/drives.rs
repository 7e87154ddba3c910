//! Drive roots of the tree and their hot-plug handling

use super::navigator::Navigator;
use crate::error::Result;
use crate::model::event::ExplorerEvent;
use crate::services::drives::{DriveEvent, DriveProvider};
use crate::view::file_tree::NodeId;
use std::sync::Arc;

/// Keeps the tree's roots in line with the mounted drives
pub struct DriveSetController {
    provider: Arc<dyn DriveProvider>,
}

impl std::fmt::Debug for DriveSetController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveSetController").finish_non_exhaustive()
    }
}

impl DriveSetController {
    pub fn new(provider: Arc<dyn DriveProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn DriveProvider> {
        &self.provider
    }

    /// Add a root for every ready drive; returns the roots in drive order
    pub async fn load_roots(&self, nav: &mut Navigator) -> Vec<NodeId> {
        for drive in self.provider.list_drives() {
            if !drive.is_ready {
                tracing::debug!("Skipping drive {:?}: not ready", drive.root);
                continue;
            }
            nav.tree_mut().add_root(&drive).await;
        }
        nav.events().emit(ExplorerEvent::TreeChanged { parent: None });
        nav.tree().roots().to_vec()
    }

    /// Apply one hot-plug notification
    ///
    /// An arriving drive is added and becomes the current directory. A
    /// removed drive takes its subtree with it; if the current directory
    /// was on it, the navigator re-validates and falls back.
    pub async fn handle_event(&self, nav: &mut Navigator, event: &DriveEvent) -> Result<()> {
        match event {
            DriveEvent::Arrived(root) => {
                let Some(drive) = self.provider.drive_info(root).filter(|d| d.is_ready) else {
                    tracing::debug!("Ignoring arrival of {:?}: drive not ready", root);
                    return Ok(());
                };
                let known = nav.tree().find_root(&drive.root).is_some();
                let id = nav.tree_mut().add_root(&drive).await;
                if !known {
                    tracing::info!("Drive arrived: {}", drive.display_name());
                    nav.events().emit(ExplorerEvent::TreeChanged { parent: None });
                }
                nav.navigate(id).await?;
            }
            DriveEvent::Removed(root) => {
                if nav.tree_mut().remove_root(root).is_none() {
                    tracing::debug!("Removal of unknown drive {:?}", root);
                    return Ok(());
                }
                tracing::info!("Drive removed: {:?}", root);
                nav.events().emit(ExplorerEvent::TreeChanged { parent: None });

                let current_gone = !nav.current().is_some_and(|id| nav.tree().contains(id));
                if current_gone {
                    nav.force_update().await?;
                }
            }
        }
        Ok(())
    }
}
