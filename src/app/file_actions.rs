//! Cut, copy, paste and delete
//!
//! Operations run through the [`FileOperationQueue`] so that at most one is
//! in flight. Their outcome is reported as a [`UserNotice`]: a cancel is
//! informational, a failure carries the shell's code. On completion the
//! current directory is re-read.
//!
//! [`FileOperationQueue`]: crate::services::file_ops::FileOperationQueue

use super::Explorer;
use crate::error::{ExplorerError, Result};
use crate::model::event::UserNotice;
use crate::services::async_bridge::AsyncMessage;
use crate::services::clipboard::ClipboardAction;
use crate::services::file_ops::{normalize_operation_path, FileOpOutcome, FileOperation};
use std::path::PathBuf;

fn normalized(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().map(|p| normalize_operation_path(p)).collect()
}

impl Explorer {
    /// Mark paths to be moved by the next paste
    ///
    /// An empty selection leaves the clipboard as it was.
    pub fn cut(&mut self, paths: &[PathBuf]) {
        if !paths.is_empty() {
            self.clipboard.cut(paths.to_vec());
        }
    }

    /// Mark paths to be copied by the next paste
    pub fn copy(&mut self, paths: &[PathBuf]) {
        if !paths.is_empty() {
            self.clipboard.copy(paths.to_vec());
        }
    }

    /// The operation a paste into the current directory would run
    fn paste_operation(&self) -> Result<FileOperation> {
        let destination = self
            .navigator
            .current_path()
            .ok_or(ExplorerError::NoAccessibleLocation)?
            .to_path_buf();
        let sources = normalized(self.clipboard.sources());
        match self.clipboard.action() {
            _ if sources.is_empty() => Err(ExplorerError::EmptyClipboard),
            ClipboardAction::Cut => Ok(FileOperation::Move {
                sources,
                destination,
            }),
            ClipboardAction::Copy => Ok(FileOperation::Copy {
                sources,
                destination,
            }),
            ClipboardAction::None => Err(ExplorerError::EmptyClipboard),
        }
    }

    /// Move or copy the clipboard contents into the current directory
    ///
    /// The clipboard is emptied only when the operation completes.
    pub async fn paste(&mut self) -> Result<FileOpOutcome> {
        let operation = self.paste_operation().inspect_err(|e| {
            tracing::warn!("Cannot paste: {}", e);
            self.events().notice(UserNotice::Error(e.to_string()));
        })?;
        let outcome = self.file_ops.run(&operation).await;
        self.finish_file_operation(&operation, outcome.clone()).await;
        Ok(outcome)
    }

    /// Delete paths (to the trash unless configured otherwise)
    pub async fn delete(&mut self, paths: &[PathBuf]) -> Result<FileOpOutcome> {
        if paths.is_empty() {
            let e = ExplorerError::NothingSelected;
            self.events().notice(UserNotice::Error(e.to_string()));
            return Err(e);
        }
        let operation = FileOperation::Delete {
            sources: normalized(paths),
        };
        let outcome = self.file_ops.run(&operation).await;
        self.finish_file_operation(&operation, outcome.clone()).await;
        Ok(outcome)
    }

    /// Run an operation on the runtime; the outcome comes back through
    /// `process_async_messages`
    pub fn spawn_file_operation(&self, operation: FileOperation) -> bool {
        let Some(runtime) = &self.runtime else {
            tracing::debug!("No runtime, cannot run {} in the background", operation);
            return false;
        };
        let queue = self.file_ops.clone();
        let sender = self.bridge.sender();
        runtime.spawn(async move {
            let outcome = queue.run(&operation).await;
            let _ = sender.send(AsyncMessage::FileOperationFinished { operation, outcome });
        });
        true
    }

    /// Paste without waiting for the operation to finish
    pub fn paste_in_background(&mut self) -> Result<bool> {
        let operation = self.paste_operation()?;
        Ok(self.spawn_file_operation(operation))
    }

    pub(crate) async fn finish_file_operation(
        &mut self,
        operation: &FileOperation,
        outcome: FileOpOutcome,
    ) {
        match outcome {
            FileOpOutcome::Completed => {
                let pasted = matches!(
                    operation,
                    FileOperation::Copy { .. } | FileOperation::Move { .. }
                );
                if pasted && normalized(self.clipboard.sources()) == operation.sources() {
                    self.clipboard.clear();
                }
            }
            FileOpOutcome::Cancelled => {
                self.events()
                    .notice(UserNotice::Info(format!("Cancelled: {}", operation)));
            }
            FileOpOutcome::Failed { code, message } => {
                let e = ExplorerError::ShellOperation { code, message };
                self.events()
                    .notice(UserNotice::Error(format!("Failed to {}: {}", operation, e)));
            }
        }

        if let Err(e) = self.navigator.force_update().await {
            tracing::warn!("Refresh after {} failed: {}", operation, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::ExplorerFixture;
    use crate::model::event::ExplorerEvent;
    use std::fs;
    use std::time::Duration;

    fn take_notice(fx: &ExplorerFixture) -> UserNotice {
        match fx.explorer.events().take_match("explorer:notice") {
            Some(ExplorerEvent::Notice(notice)) => notice,
            other => panic!("expected a notice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_copy_paste_into_current_directory() {
        let mut fx = ExplorerFixture::started().await;
        let windows = fx.find("C/Windows").await;
        let notes = fx.path("C/Users/Alice/notes.txt");

        fx.explorer.copy(&[notes.clone()]);
        fx.explorer.navigator_mut().navigate(windows).await.unwrap();
        let outcome = fx.explorer.paste().await.unwrap();

        assert_eq!(outcome, FileOpOutcome::Completed);
        assert!(fx.path("C/Windows/notes.txt").exists());
        assert!(notes.exists());
        assert!(fx.explorer.clipboard().is_empty());

        let listing = fx.explorer.navigator_mut().list_current().await.unwrap();
        assert!(listing.find("notes.txt").is_some());
    }

    #[tokio::test]
    async fn test_cut_paste_moves_and_refreshes_tree() {
        let mut fx = ExplorerFixture::started().await;
        let windows = fx.find("C/Windows").await;

        fx.explorer.cut(&[fx.path("C/Users/Alice/Music/")]);
        fx.explorer.navigator_mut().navigate(windows).await.unwrap();
        fx.explorer.paste().await.unwrap();

        assert!(fx.path("C/Windows/Music").is_dir());
        assert!(!fx.path("C/Users/Alice/Music").exists());
        let moved = fx.path("C/Windows/Music");
        assert!(fx.explorer.tree().get_node_by_path(&moved).is_some());
    }

    #[tokio::test]
    async fn test_paste_with_empty_clipboard_is_an_error_notice() {
        let mut fx = ExplorerFixture::started().await;
        fx.explorer.events().clear();

        let err = fx.explorer.paste().await.unwrap_err();

        assert!(matches!(err, ExplorerError::EmptyClipboard));
        assert!(take_notice(&fx).is_error());
    }

    #[tokio::test]
    async fn test_empty_selection_keeps_clipboard() {
        let mut fx = ExplorerFixture::started().await;
        let notes = fx.path("C/Users/Alice/notes.txt");

        fx.explorer.copy(&[notes.clone()]);
        fx.explorer.cut(&[]);

        assert_eq!(fx.explorer.clipboard().action(), ClipboardAction::Copy);
        assert_eq!(fx.explorer.clipboard().sources(), &[notes]);
    }

    #[tokio::test]
    async fn test_failed_paste_keeps_clipboard_and_reports_code() {
        let mut fx = ExplorerFixture::started().await;
        let missing = fx.path("C/missing.txt");

        fx.explorer.copy(&[missing.clone()]);
        fx.explorer.events().clear();
        let outcome = fx.explorer.paste().await.unwrap();

        assert!(matches!(outcome, FileOpOutcome::Failed { .. }));
        assert!(!fx.explorer.clipboard().is_empty());
        let notice = take_notice(&fx);
        assert!(notice.is_error());
        assert!(notice.message().contains("copy 1 item(s)"));
        assert!(notice.message().contains("code"));
    }

    #[tokio::test]
    async fn test_delete_removes_and_refreshes() {
        let mut fx = ExplorerFixture::started().await;
        let users = fx.find("C/Users").await;
        let alice = fx.path("C/Users/Alice");
        fx.explorer.navigator_mut().navigate(users).await.unwrap();

        let outcome = fx.explorer.delete(&[alice.clone()]).await.unwrap();

        assert_eq!(outcome, FileOpOutcome::Completed);
        assert!(!alice.exists());
        let listing = fx.explorer.navigator_mut().list_current().await.unwrap();
        assert!(listing.is_empty());
    }

    #[tokio::test]
    async fn test_delete_nothing_is_an_error() {
        let mut fx = ExplorerFixture::started().await;
        fx.explorer.events().clear();

        assert!(matches!(
            fx.explorer.delete(&[]).await,
            Err(ExplorerError::NothingSelected)
        ));
        assert!(take_notice(&fx).is_error());
    }

    #[tokio::test]
    async fn test_cancelled_operation_is_informational() {
        let mut fx = ExplorerFixture::with_cancelling_ops().await;
        fx.explorer.copy(&[fx.path("C/Users/Alice/notes.txt")]);
        fx.explorer.events().clear();

        let outcome = fx.explorer.paste().await.unwrap();

        assert_eq!(outcome, FileOpOutcome::Cancelled);
        let notice = take_notice(&fx);
        assert!(!notice.is_error());
        assert!(!fx.explorer.clipboard().is_empty());
    }

    #[tokio::test]
    async fn test_background_paste_reports_through_bridge() {
        let mut fx = ExplorerFixture::started().await;
        let windows = fx.find("C/Windows").await;
        fx.explorer.copy(&[fx.path("C/Users/Alice/notes.txt")]);
        fx.explorer.navigator_mut().navigate(windows).await.unwrap();

        assert!(fx.explorer.paste_in_background().unwrap());
        assert!(
            fx.explorer
                .wait_for_async_message(Duration::from_secs(5))
                .await
        );

        assert!(fx.path("C/Windows/notes.txt").exists());
        assert!(fx.explorer.clipboard().is_empty());
    }
}
